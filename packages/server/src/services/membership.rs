use chrono::{Duration, Utc};
use common::{Action, InviteKind, InviteStatus, TeamKind};
use tracing::{info, instrument};

use super::HackdayService;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::team::TeamDraft;
use crate::store::{Invite, NewInvite, NewTeam, Team, TeamUpdate};

impl HackdayService<'_> {
    /// Create a team with the caller as captain and sole member.
    #[instrument(skip(self, caller, draft), fields(user_id = caller.user_id, name = %draft.name))]
    pub async fn create_team(&self, caller: &AuthUser, draft: TeamDraft) -> Result<Team, AppError> {
        self.gate(caller, Action::CreateTeam).await?;
        self.ensure_unreserved(&draft.name)?;

        let team = self
            .store
            .create_team(NewTeam {
                name: draft.name,
                description: draft.description,
                looking_for: draft.looking_for,
                max_members: draft.max_members,
                captain_id: caller.user_id,
            })
            .await?;
        info!(team_id = team.id, "Team created");
        Ok(team)
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>, AppError> {
        Ok(self.store.list_teams().await?)
    }

    pub async fn get_team(&self, id: i32) -> Result<Team, AppError> {
        self.require_team(id).await
    }

    pub async fn my_team(&self, caller: &AuthUser) -> Result<Option<Team>, AppError> {
        Ok(self.store.find_team_of_user(caller.user_id).await?)
    }

    /// The Observers name belongs to the auto-assigned team.
    fn ensure_unreserved(&self, name: &str) -> Result<(), AppError> {
        if name.eq_ignore_ascii_case(&self.rules.observers_team_name) {
            return Err(AppError::Conflict(format!("Team name '{name}' is reserved")));
        }
        Ok(())
    }

    /// Captain edits team details.
    #[instrument(skip(self, caller, update), fields(user_id = caller.user_id))]
    pub async fn update_team(
        &self,
        caller: &AuthUser,
        team_id: i32,
        update: TeamUpdate,
    ) -> Result<Team, AppError> {
        self.gate(caller, Action::UpdateTeam).await?;
        let team = self.require_team(team_id).await?;
        if !team.is_captain(caller.user_id) {
            return Err(AppError::PermissionDenied(
                "Only the captain can edit the team".into(),
            ));
        }
        if let Some(name) = &update.name {
            self.ensure_unreserved(name)?;
        }
        Ok(self.store.update_team(team_id, update).await?)
    }

    /// Captain invites a user who is not on a team.
    #[instrument(skip(self, caller, message), fields(user_id = caller.user_id))]
    pub async fn send_invite(
        &self,
        caller: &AuthUser,
        team_id: i32,
        invitee_id: i32,
        message: Option<String>,
    ) -> Result<Invite, AppError> {
        self.gate(caller, Action::ManageMembership).await?;
        let team = self.require_team(team_id).await?;
        if !team.is_captain(caller.user_id) {
            return Err(AppError::PermissionDenied(
                "Only the captain can send invites".into(),
            ));
        }
        if invitee_id == caller.user_id {
            return Err(AppError::Validation("You cannot invite yourself".into()));
        }
        self.require_user(invitee_id).await?;
        if self.store.find_team_of_user(invitee_id).await?.is_some() {
            return Err(AppError::Conflict("User is already on a team".into()));
        }
        if team.is_full() {
            return Err(AppError::TeamFull {
                capacity: team.max_members,
            });
        }

        let invite = self
            .store
            .create_invite(NewInvite {
                team_id,
                user_id: invitee_id,
                kind: InviteKind::Invite,
                message,
                created_by: caller.user_id,
                expires_at: self.invite_expiry(),
            })
            .await?;
        info!(invite_id = invite.id, invitee_id, "Invite sent");
        Ok(invite)
    }

    /// Caller asks to join a team.
    #[instrument(skip(self, caller, message), fields(user_id = caller.user_id))]
    pub async fn request_to_join(
        &self,
        caller: &AuthUser,
        team_id: i32,
        message: Option<String>,
    ) -> Result<Invite, AppError> {
        self.gate(caller, Action::ManageMembership).await?;
        let team = self.require_team(team_id).await?;
        if team.kind == TeamKind::Observers {
            return Err(AppError::Conflict(
                "The Observers team is filled automatically".into(),
            ));
        }
        if self.store.find_team_of_user(caller.user_id).await?.is_some() {
            return Err(AppError::Conflict("You are already on a team".into()));
        }
        if team.is_full() {
            return Err(AppError::TeamFull {
                capacity: team.max_members,
            });
        }

        let request = self
            .store
            .create_invite(NewInvite {
                team_id,
                user_id: caller.user_id,
                kind: InviteKind::JoinRequest,
                message,
                created_by: caller.user_id,
                expires_at: self.invite_expiry(),
            })
            .await?;
        info!(invite_id = request.id, "Join request sent");
        Ok(request)
    }

    fn invite_expiry(&self) -> Option<chrono::DateTime<Utc>> {
        (self.rules.invite_ttl_hours > 0)
            .then(|| Utc::now() + Duration::hours(self.rules.invite_ttl_hours))
    }

    /// Load an invite the caller may answer, still pending and unexpired.
    async fn answerable_invite(&self, caller: &AuthUser, invite_id: i32) -> Result<Invite, AppError> {
        let invite = self
            .store
            .find_invite(invite_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite not found".into()))?;

        let may_answer = match invite.kind {
            InviteKind::Invite => invite.user_id == caller.user_id,
            InviteKind::JoinRequest => self
                .store
                .find_team(invite.team_id)
                .await?
                .is_some_and(|t| t.is_captain(caller.user_id)),
        };
        if !may_answer {
            return Err(AppError::PermissionDenied(
                "You cannot respond to this invite".into(),
            ));
        }

        let now = Utc::now();
        match invite.effective_status(now) {
            InviteStatus::Pending => Ok(invite),
            InviteStatus::Expired => {
                if invite.status.is_pending() {
                    self.store
                        .resolve_invite(invite.id, InviteStatus::Expired, now)
                        .await?;
                }
                Err(AppError::Conflict("Invite has expired".into()))
            }
            other => Err(AppError::Conflict(format!(
                "Invite is already {}",
                other.as_str()
            ))),
        }
    }

    /// Accept an invite (as the invitee) or a join request (as the captain).
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn accept_invite(
        &self,
        caller: &AuthUser,
        invite_id: i32,
    ) -> Result<(Invite, Team), AppError> {
        self.gate(caller, Action::ManageMembership).await?;
        let invite = self.answerable_invite(caller, invite_id).await?;
        let (invite, team) = self.store.accept_invite(invite.id, Utc::now()).await?;
        info!(
            invite_id,
            team_id = team.id,
            member_id = invite.user_id,
            "Invite accepted"
        );
        Ok((invite, team))
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn decline_invite(&self, caller: &AuthUser, invite_id: i32) -> Result<Invite, AppError> {
        self.gate(caller, Action::ManageMembership).await?;
        let invite = self.answerable_invite(caller, invite_id).await?;
        Ok(self
            .store
            .resolve_invite(invite.id, InviteStatus::Declined, Utc::now())
            .await?)
    }

    /// Creator withdraws a pending invite or join request.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn cancel_invite(&self, caller: &AuthUser, invite_id: i32) -> Result<Invite, AppError> {
        self.gate(caller, Action::ManageMembership).await?;
        let invite = self
            .store
            .find_invite(invite_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite not found".into()))?;
        if invite.created_by != caller.user_id {
            return Err(AppError::PermissionDenied(
                "Only the sender can cancel this invite".into(),
            ));
        }
        Ok(self
            .store
            .resolve_invite(invite.id, InviteStatus::Cancelled, Utc::now())
            .await?)
    }

    /// The caller's own invites and requests, plus their team's when captain.
    pub async fn list_invites(&self, caller: &AuthUser) -> Result<(Vec<Invite>, Vec<Invite>), AppError> {
        let mine = self.store.list_invites_for_user(caller.user_id).await?;
        let team = match self.store.find_team_of_user(caller.user_id).await? {
            Some(team) if team.is_captain(caller.user_id) => {
                self.store.list_invites_for_team(team.id).await?
            }
            _ => Vec::new(),
        };
        Ok((mine, team))
    }

    /// Leave a team. A captain may only leave as the last member, which deletes the team.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn leave_team(&self, caller: &AuthUser, team_id: i32) -> Result<Option<Team>, AppError> {
        self.gate(caller, Action::ManageMembership).await?;
        let team = self.require_team(team_id).await?;
        if !team.is_member(caller.user_id) {
            return Err(AppError::Conflict("You are not on this team".into()));
        }
        if team.is_captain(caller.user_id) && team.members.len() > 1 {
            return Err(AppError::Conflict(
                "Transfer the captaincy before leaving the team".into(),
            ));
        }
        let remaining = self.store.remove_member(team_id, caller.user_id).await?;
        if remaining.is_none() {
            info!(team_id, "Team deleted after its last member left");
        }
        Ok(remaining)
    }

    /// Captain removes another member.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn remove_member(
        &self,
        caller: &AuthUser,
        team_id: i32,
        member_id: i32,
    ) -> Result<Option<Team>, AppError> {
        self.gate(caller, Action::ManageMembership).await?;
        let team = self.require_team(team_id).await?;
        if !team.is_captain(caller.user_id) {
            return Err(AppError::PermissionDenied(
                "Only the captain can remove members".into(),
            ));
        }
        if member_id == caller.user_id {
            return Err(AppError::Validation(
                "Use leave to remove yourself".into(),
            ));
        }
        if !team.is_member(member_id) {
            return Err(AppError::NotFound("Team member not found".into()));
        }
        if team.is_captain(member_id) && team.members.len() > 1 {
            return Err(AppError::Conflict(
                "Transfer the captaincy before removing the captain".into(),
            ));
        }
        Ok(self.store.remove_member(team_id, member_id).await?)
    }

    /// Hand the captaincy to another current member.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn transfer_captain(
        &self,
        caller: &AuthUser,
        team_id: i32,
        new_captain: i32,
    ) -> Result<Team, AppError> {
        self.gate(caller, Action::ManageMembership).await?;
        let team = self.require_team(team_id).await?;
        if team.kind == TeamKind::Observers {
            return Err(AppError::Conflict("The Observers team has no captain".into()));
        }
        if !team.is_captain(caller.user_id) {
            return Err(AppError::PermissionDenied(
                "Only the captain can transfer the captaincy".into(),
            ));
        }
        if !team.is_member(new_captain) {
            return Err(AppError::NotFound("Team member not found".into()));
        }
        let team = self.store.set_captain(team_id, new_captain).await?;
        info!(team_id, new_captain, "Captaincy transferred");
        Ok(team)
    }
}
