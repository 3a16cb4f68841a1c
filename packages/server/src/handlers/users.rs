use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::user::{
    FreeAgentQuery, FreeAgentRequest, SetRoleRequest, UpdateProfileRequest, UserResponse,
    validate_update_profile,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List all users",
    responses(
        (status = 200, description = "Users ordered by id", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_users(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.service().list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    patch,
    path = "/users/me",
    tag = "Users",
    operation_id = "updateProfile",
    summary = "Update your profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Closed in the current phase (PHASE_CLOSED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let update = validate_update_profile(payload)?;
    let user = state.service().update_profile(&auth_user, update).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/users/me/free-agent",
    tag = "Users",
    operation_id = "setFreeAgent",
    summary = "Opt in or out of the free-agent pool",
    request_body = FreeAgentRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 409, description = "Closed in the current phase (PHASE_CLOSED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, is_free_agent = payload.is_free_agent))]
pub async fn set_free_agent(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<FreeAgentRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .service()
        .set_free_agent(&auth_user, payload.is_free_agent)
        .await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/users/free-agents",
    tag = "Users",
    operation_id = "listFreeAgents",
    summary = "List free agents without a team",
    params(FreeAgentQuery),
    responses(
        (status = 200, description = "Free agents", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_free_agents(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<FreeAgentQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state
        .service()
        .list_free_agents(query.skill.as_deref())
        .await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/users/{id}/role",
    tag = "Users",
    operation_id = "setUserRole",
    summary = "Change a user's role",
    description = "Admin only. Admins cannot change their own role.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, target = id, role = %payload.role))]
pub async fn set_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SetRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.service().set_role(&auth_user, id, payload.role).await?;
    Ok(Json(user.into()))
}
