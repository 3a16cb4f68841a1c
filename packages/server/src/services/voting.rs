use chrono::Utc;
use common::Action;
use tracing::{info, instrument};

use super::HackdayService;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::project::{ScoreRequest, validate_score_request};
use crate::store::{JudgeScore, Vote};

impl HackdayService<'_> {
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn cast_vote(&self, caller: &AuthUser, project_id: i32) -> Result<Vote, AppError> {
        self.gate(caller, Action::Vote).await?;
        let project = self.require_project(project_id).await?;
        if !project.status.is_submitted() {
            return Err(AppError::Conflict(
                "Only submitted projects can receive votes".into(),
            ));
        }
        let own_team = self
            .store
            .find_team_of_user(caller.user_id)
            .await?
            .is_some_and(|t| t.id == project.team_id);
        if own_team {
            return Err(AppError::PermissionDenied(
                "You cannot vote for your own team's project".into(),
            ));
        }

        let vote = self
            .store
            .cast_vote(caller.user_id, project_id, self.rules.max_votes_per_user)
            .await?;
        info!(project_id, "Vote cast");
        Ok(vote)
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn retract_vote(&self, caller: &AuthUser, project_id: i32) -> Result<(), AppError> {
        self.gate(caller, Action::Vote).await?;
        if self.store.retract_vote(caller.user_id, project_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Vote not found".into()))
        }
    }

    /// The caller's votes and how many remain.
    pub async fn my_votes(&self, caller: &AuthUser) -> Result<(Vec<Vote>, u32, u32), AppError> {
        let votes = self.store.list_votes_by_user(caller.user_id).await?;
        let max = self.rules.max_votes_per_user;
        let remaining = max.saturating_sub(votes.len() as u32);
        Ok((votes, max, remaining))
    }

    /// Record or replace the caller's score for a submitted project.
    #[instrument(skip(self, caller, payload), fields(user_id = caller.user_id))]
    pub async fn score_project(
        &self,
        caller: &AuthUser,
        project_id: i32,
        payload: ScoreRequest,
    ) -> Result<JudgeScore, AppError> {
        self.gate(caller, Action::Score).await?;
        validate_score_request(&payload, self.rules)?;
        let project = self.require_project(project_id).await?;
        if !project.status.is_submitted() {
            return Err(AppError::Conflict(
                "Only submitted projects can be scored".into(),
            ));
        }

        let comments = payload
            .comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let score = self
            .store
            .upsert_score(JudgeScore {
                judge_id: caller.user_id,
                project_id,
                scores: payload.scores,
                comments,
                updated_at: Utc::now(),
            })
            .await?;
        info!(project_id, total = score.total(), "Project scored");
        Ok(score)
    }

    /// Judges see their own score; managers see every judge's.
    pub async fn list_scores(
        &self,
        caller: &AuthUser,
        project_id: i32,
    ) -> Result<Vec<JudgeScore>, AppError> {
        let caps = caller.capabilities();
        if !caps.can_manage && !caps.can_judge {
            return Err(AppError::forbidden());
        }
        self.require_project(project_id).await?;
        let scores = self.store.list_scores_for_project(project_id).await?;
        if caps.can_manage {
            Ok(scores)
        } else {
            Ok(scores
                .into_iter()
                .filter(|s| s.judge_id == caller.user_id)
                .collect())
        }
    }
}
