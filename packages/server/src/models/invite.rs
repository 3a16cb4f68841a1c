use chrono::{DateTime, Utc};
use common::{InviteKind, InviteStatus};
use serde::{Deserialize, Serialize};

use super::shared::validate_text;
use super::team::TeamResponse;
use crate::error::AppError;
use crate::store::Invite;

#[derive(Serialize, utoipa::ToSchema)]
pub struct InviteResponse {
    pub id: i32,
    pub team_id: i32,
    /// Invited user, or the user asking to join.
    pub user_id: i32,
    pub kind: InviteKind,
    /// Pending invites past their expiry are reported as `expired`.
    pub status: InviteStatus,
    pub message: Option<String>,
    pub created_by: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl InviteResponse {
    pub fn at(invite: Invite, now: DateTime<Utc>) -> Self {
        Self {
            status: invite.effective_status(now),
            id: invite.id,
            team_id: invite.team_id,
            user_id: invite.user_id,
            kind: invite.kind,
            message: invite.message,
            created_by: invite.created_by,
            expires_at: invite.expires_at,
            created_at: invite.created_at,
            resolved_at: invite.resolved_at,
        }
    }
}

impl From<Invite> for InviteResponse {
    fn from(invite: Invite) -> Self {
        Self::at(invite, Utc::now())
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SendInviteRequest {
    #[schema(example = 17)]
    pub user_id: i32,
    #[schema(example = "We need a backend dev!")]
    pub message: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct JoinRequestRequest {
    #[schema(example = "I can help with the ML pipeline")]
    pub message: Option<String>,
}

/// Trim a message, treating blank as absent.
pub fn validate_message(message: Option<String>) -> Result<Option<String>, AppError> {
    match message.map(|m| m.trim().to_string()) {
        Some(m) if m.is_empty() => Ok(None),
        Some(m) => {
            validate_text("Message", &m)?;
            Ok(Some(m))
        }
        None => Ok(None),
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct InviteListResponse {
    /// Invites addressed to the caller and join requests the caller made.
    pub mine: Vec<InviteResponse>,
    /// For captains: every invite and join request of their team.
    pub team: Vec<InviteResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AcceptInviteResponse {
    pub invite: InviteResponse,
    pub team: TeamResponse,
}
