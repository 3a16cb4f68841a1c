use std::collections::{BTreeMap, HashMap};

use common::{Action, Phase, ProjectStatus, Role, TeamKind};
use tracing::instrument;

use super::HackdayService;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::results::{AnalyticsResponse, ResultEntry, ResultsResponse};
use crate::store::{JudgeScore, Project, Team, User, Vote};

impl HackdayService<'_> {
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn results(&self, caller: &AuthUser) -> Result<ResultsResponse, AppError> {
        let event = self.gate(caller, Action::ViewResults).await?;
        let projects = self.store.list_projects().await?;
        let teams = self.store.list_teams().await?;
        let votes = self.store.list_votes().await?;
        let scores = self.store.list_scores().await?;

        let entries = rank_projects(&projects, &teams, &votes, &scores);
        let peoples_choice = entries
            .iter()
            .filter(|e| e.vote_count > 0)
            .max_by(|a, b| {
                a.vote_count
                    .cmp(&b.vote_count)
                    .then_with(|| b.project_id.cmp(&a.project_id))
            })
            .cloned();

        Ok(ResultsResponse {
            phase: event.phase,
            entries,
            peoples_choice,
        })
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn analytics(&self, caller: &AuthUser) -> Result<AnalyticsResponse, AppError> {
        let event = self.gate(caller, Action::ViewAnalytics).await?;
        let users = self.store.list_users().await?;
        let teams = self.store.list_teams().await?;
        let projects = self.store.list_projects().await?;
        let votes = self.store.list_votes().await?;
        let scores = self.store.list_scores().await?;
        Ok(compute_analytics(
            event.phase,
            &users,
            &teams,
            &projects,
            votes.len(),
            scores.len(),
        ))
    }
}

/// Rank submitted projects by average judge total (unscored last), then
/// vote count, then project id.
pub fn rank_projects(
    projects: &[Project],
    teams: &[Team],
    votes: &[Vote],
    scores: &[JudgeScore],
) -> Vec<ResultEntry> {
    let team_names: HashMap<i32, &str> = teams.iter().map(|t| (t.id, t.name.as_str())).collect();

    let mut vote_counts: HashMap<i32, u64> = HashMap::new();
    for vote in votes {
        *vote_counts.entry(vote.project_id).or_default() += 1;
    }

    let mut totals: HashMap<i32, (i64, u64)> = HashMap::new();
    for score in scores {
        let entry = totals.entry(score.project_id).or_default();
        entry.0 += i64::from(score.total());
        entry.1 += 1;
    }

    let mut entries: Vec<ResultEntry> = projects
        .iter()
        .filter(|p| p.status.is_submitted())
        .map(|p| {
            let (sum, judges) = totals.get(&p.id).copied().unwrap_or_default();
            ResultEntry {
                rank: 0,
                project_id: p.id,
                team_id: p.team_id,
                team_name: team_names.get(&p.team_id).unwrap_or(&"").to_string(),
                title: p.title.clone(),
                vote_count: vote_counts.get(&p.id).copied().unwrap_or(0),
                judge_count: judges,
                average_score: (judges > 0).then(|| sum as f64 / judges as f64),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        let avg_a = a.average_score.unwrap_or(f64::NEG_INFINITY);
        let avg_b = b.average_score.unwrap_or(f64::NEG_INFINITY);
        avg_b
            .total_cmp(&avg_a)
            .then_with(|| b.vote_count.cmp(&a.vote_count))
            .then_with(|| a.project_id.cmp(&b.project_id))
    });
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    entries
}

pub fn compute_analytics(
    phase: Phase,
    users: &[User],
    teams: &[Team],
    projects: &[Project],
    total_votes: usize,
    total_scores: usize,
) -> AnalyticsResponse {
    let mut users_by_role: BTreeMap<String, u64> =
        Role::ALL.iter().map(|r| (r.as_str().to_string(), 0)).collect();
    for user in users {
        *users_by_role.entry(user.role.as_str().to_string()).or_default() += 1;
    }

    let free_agents = users
        .iter()
        .filter(|u| u.is_free_agent && !teams.iter().any(|t| t.is_member(u.id)))
        .count() as u64;

    let regular: Vec<&Team> = teams.iter().filter(|t| t.kind == TeamKind::Regular).collect();
    let observer_teams = teams.iter().filter(|t| t.kind == TeamKind::Observers).count() as u64;
    let average_team_size = if regular.is_empty() {
        0.0
    } else {
        regular.iter().map(|t| t.members.len()).sum::<usize>() as f64 / regular.len() as f64
    };

    let mut projects_by_status: BTreeMap<String, u64> = ProjectStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    for project in projects {
        *projects_by_status
            .entry(project.status.as_str().to_string())
            .or_default() += 1;
    }

    AnalyticsResponse {
        phase,
        total_users: users.len() as u64,
        users_by_role,
        free_agents,
        regular_teams: regular.len() as u64,
        observer_teams,
        average_team_size,
        projects_by_status,
        total_votes: total_votes as u64,
        total_scores: total_scores as u64,
    }
}
