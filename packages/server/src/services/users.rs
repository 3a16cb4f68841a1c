use std::collections::HashSet;

use common::{Action, Role};
use tracing::{info, instrument};

use super::HackdayService;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::store::{ProfileUpdate, Team, User};

impl HackdayService<'_> {
    /// The caller's account and team.
    pub async fn me(&self, caller: &AuthUser) -> Result<(User, Option<Team>), AppError> {
        let user = self.require_user(caller.user_id).await?;
        let team = self.store.find_team_of_user(caller.user_id).await?;
        Ok((user, team))
    }

    #[instrument(skip(self, caller, update), fields(user_id = caller.user_id))]
    pub async fn update_profile(
        &self,
        caller: &AuthUser,
        update: ProfileUpdate,
    ) -> Result<User, AppError> {
        self.gate(caller, Action::UpdateProfile).await?;
        Ok(self.store.update_profile(caller.user_id, update).await?)
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn set_free_agent(&self, caller: &AuthUser, free_agent: bool) -> Result<User, AppError> {
        self.gate(caller, Action::ToggleFreeAgent).await?;
        Ok(self.store.set_free_agent(caller.user_id, free_agent).await?)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.store.list_users().await?)
    }

    /// Opted-in users on no team, optionally filtered by a skill (case-insensitive).
    pub async fn list_free_agents(&self, skill: Option<&str>) -> Result<Vec<User>, AppError> {
        let on_team: HashSet<i32> = self
            .store
            .list_teams()
            .await?
            .iter()
            .flat_map(|t| t.members.iter().map(|m| m.user_id))
            .collect();
        let skill = skill.map(str::trim).filter(|s| !s.is_empty());

        let users = self.store.list_users().await?;
        Ok(users
            .into_iter()
            .filter(|u| u.is_free_agent && !on_team.contains(&u.id))
            .filter(|u| {
                skill.is_none_or(|wanted| u.skills.iter().any(|s| s.eq_ignore_ascii_case(wanted)))
            })
            .collect())
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn set_role(
        &self,
        caller: &AuthUser,
        user_id: i32,
        role: Role,
    ) -> Result<User, AppError> {
        self.gate(caller, Action::ManageEvent).await?;
        if user_id == caller.user_id {
            return Err(AppError::PermissionDenied(
                "Admins cannot change their own role".into(),
            ));
        }
        self.require_user(user_id).await?;
        let user = self.store.set_role(user_id, role).await?;
        info!(target_user = user_id, role = %role, "Role changed");
        Ok(user)
    }
}
