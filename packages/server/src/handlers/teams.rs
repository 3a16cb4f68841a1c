use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::invite::{
    InviteResponse, JoinRequestRequest, SendInviteRequest, validate_message,
};
use crate::models::team::{
    CreateTeamRequest, MembershipChangeResponse, TeamResponse, TransferCaptainRequest,
    UpdateTeamRequest, validate_create_team, validate_update_team,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/teams",
    tag = "Teams",
    operation_id = "listTeams",
    summary = "List teams",
    responses(
        (status = 200, description = "Teams ordered by id", body = Vec<TeamResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_teams(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    let teams = state.service().list_teams().await?;
    Ok(Json(teams.into_iter().map(TeamResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/teams",
    tag = "Teams",
    operation_id = "createTeam",
    summary = "Create a team",
    description = "The caller becomes captain and first member. Their pending invites and join requests are cancelled.",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Already on a team, name taken, or closed in this phase (CONFLICT, PHASE_CLOSED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let draft = validate_create_team(payload, &state.config.hackday)?;
    let team = state.service().create_team(&auth_user, draft).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse::from(team))))
}

#[utoipa::path(
    get,
    path = "/teams/mine",
    tag = "Teams",
    operation_id = "getMyTeam",
    summary = "The caller's team",
    responses(
        (status = 200, description = "Team, or null when the caller has none", body = Option<TeamResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn my_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Option<TeamResponse>>, AppError> {
    let team = state.service().my_team(&auth_user).await?;
    Ok(Json(team.map(TeamResponse::from)))
}

#[utoipa::path(
    get,
    path = "/teams/{id}",
    tag = "Teams",
    operation_id = "getTeam",
    summary = "Get a team",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team", body = TeamResponse),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_team(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TeamResponse>, AppError> {
    let team = state.service().get_team(id).await?;
    Ok(Json(team.into()))
}

#[utoipa::path(
    patch,
    path = "/teams/{id}",
    tag = "Teams",
    operation_id = "updateTeam",
    summary = "Update a team",
    description = "Captain only. `max_members` cannot drop below the current member count.",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Updated team", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not the captain (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name taken or closed in this phase (CONFLICT, PHASE_CLOSED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, team_id = id))]
pub async fn update_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    let update = validate_update_team(payload, &state.config.hackday)?;
    let team = state.service().update_team(&auth_user, id, update).await?;
    Ok(Json(team.into()))
}

#[utoipa::path(
    post,
    path = "/teams/{id}/leave",
    tag = "Teams",
    operation_id = "leaveTeam",
    summary = "Leave a team",
    description = "A captain can only leave as the last member; the team is then deleted.",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Left the team", body = MembershipChangeResponse),
        (status = 409, description = "Not a member, captain with members left, or closed in this phase (CONFLICT, PHASE_CLOSED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, team_id = id))]
pub async fn leave_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MembershipChangeResponse>, AppError> {
    let team = state.service().leave_team(&auth_user, id).await?;
    Ok(Json(MembershipChangeResponse {
        team: team.map(TeamResponse::from),
    }))
}

#[utoipa::path(
    delete,
    path = "/teams/{id}/members/{user_id}",
    tag = "Teams",
    operation_id = "removeTeamMember",
    summary = "Remove a member",
    params(
        ("id" = i32, Path, description = "Team ID"),
        ("user_id" = i32, Path, description = "Member to remove"),
    ),
    responses(
        (status = 200, description = "Member removed", body = MembershipChangeResponse),
        (status = 403, description = "Not the captain (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not a member (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, team_id = id, member_id))]
pub async fn remove_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, member_id)): Path<(i32, i32)>,
) -> Result<Json<MembershipChangeResponse>, AppError> {
    let team = state
        .service()
        .remove_member(&auth_user, id, member_id)
        .await?;
    Ok(Json(MembershipChangeResponse {
        team: team.map(TeamResponse::from),
    }))
}

#[utoipa::path(
    put,
    path = "/teams/{id}/captain",
    tag = "Teams",
    operation_id = "transferCaptain",
    summary = "Transfer the captaincy",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = TransferCaptainRequest,
    responses(
        (status = 200, description = "Captain changed", body = TeamResponse),
        (status = 403, description = "Not the captain (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not a member (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, team_id = id, new_captain = payload.user_id))]
pub async fn transfer_captain(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<TransferCaptainRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    let team = state
        .service()
        .transfer_captain(&auth_user, id, payload.user_id)
        .await?;
    Ok(Json(team.into()))
}

#[utoipa::path(
    post,
    path = "/teams/{id}/invites",
    tag = "Invites",
    operation_id = "sendInvite",
    summary = "Invite a user to the team",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = SendInviteRequest,
    responses(
        (status = 201, description = "Invite created", body = InviteResponse),
        (status = 403, description = "Not the captain (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "User already on a team, duplicate invite, or team full (CONFLICT, TEAM_FULL)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, team_id = id, invitee = payload.user_id))]
pub async fn send_invite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SendInviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = validate_message(payload.message)?;
    let invite = state
        .service()
        .send_invite(&auth_user, id, payload.user_id, message)
        .await?;
    Ok((StatusCode::CREATED, Json(InviteResponse::from(invite))))
}

#[utoipa::path(
    post,
    path = "/teams/{id}/join-requests",
    tag = "Invites",
    operation_id = "requestToJoin",
    summary = "Ask to join a team",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = JoinRequestRequest,
    responses(
        (status = 201, description = "Join request created", body = InviteResponse),
        (status = 409, description = "Already on a team, duplicate request, or team full (CONFLICT, TEAM_FULL)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, team_id = id))]
pub async fn request_to_join(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<JoinRequestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = validate_message(payload.message)?;
    let invite = state
        .service()
        .request_to_join(&auth_user, id, message)
        .await?;
    Ok((StatusCode::CREATED, Json(InviteResponse::from(invite))))
}
