use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::invite::{AcceptInviteResponse, InviteListResponse, InviteResponse};
use crate::models::team::TeamResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/invites",
    tag = "Invites",
    operation_id = "listInvites",
    summary = "List invites and join requests",
    description = "Returns the caller's own invites and requests, and for captains every invite of their team.",
    responses(
        (status = 200, description = "Invites", body = InviteListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_invites(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<InviteListResponse>, AppError> {
    let (mine, team) = state.service().list_invites(&auth_user).await?;
    let now = Utc::now();
    Ok(Json(InviteListResponse {
        mine: mine.into_iter().map(|i| InviteResponse::at(i, now)).collect(),
        team: team.into_iter().map(|i| InviteResponse::at(i, now)).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/invites/{id}/accept",
    tag = "Invites",
    operation_id = "acceptInvite",
    summary = "Accept an invite or join request",
    description = "The invitee accepts an invite; the captain accepts a join request. The joining user's other pending invites are cancelled.",
    params(("id" = i32, Path, description = "Invite ID")),
    responses(
        (status = 200, description = "Accepted", body = AcceptInviteResponse),
        (status = 403, description = "Not the recipient (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Invite not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "No longer pending, expired, or team full (CONFLICT, TEAM_FULL)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, invite_id = id))]
pub async fn accept_invite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AcceptInviteResponse>, AppError> {
    let (invite, team) = state.service().accept_invite(&auth_user, id).await?;
    Ok(Json(AcceptInviteResponse {
        invite: invite.into(),
        team: TeamResponse::from(team),
    }))
}

#[utoipa::path(
    post,
    path = "/invites/{id}/decline",
    tag = "Invites",
    operation_id = "declineInvite",
    summary = "Decline an invite or join request",
    params(("id" = i32, Path, description = "Invite ID")),
    responses(
        (status = 200, description = "Declined", body = InviteResponse),
        (status = 403, description = "Not the recipient (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "No longer pending (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, invite_id = id))]
pub async fn decline_invite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<InviteResponse>, AppError> {
    let invite = state.service().decline_invite(&auth_user, id).await?;
    Ok(Json(invite.into()))
}

#[utoipa::path(
    delete,
    path = "/invites/{id}",
    tag = "Invites",
    operation_id = "cancelInvite",
    summary = "Withdraw an invite or join request",
    params(("id" = i32, Path, description = "Invite ID")),
    responses(
        (status = 200, description = "Cancelled", body = InviteResponse),
        (status = 403, description = "Not the sender (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "No longer pending (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, invite_id = id))]
pub async fn cancel_invite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<InviteResponse>, AppError> {
    let invite = state.service().cancel_invite(&auth_user, id).await?;
    Ok(Json(invite.into()))
}
