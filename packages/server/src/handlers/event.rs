use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::event::{
    AutoAssignResponse, EventResponse, PhaseChangeResponse, SetPhaseRequest, UpdateEventRequest,
};
use crate::models::team::TeamResponse;
use crate::services::PhaseChange;
use crate::state::AppState;

impl From<PhaseChange> for PhaseChangeResponse {
    fn from(change: PhaseChange) -> Self {
        Self {
            event: EventResponse::from(change.event),
            auto_assigned: change.auto_assigned,
        }
    }
}

#[utoipa::path(
    get,
    path = "/event",
    tag = "Event",
    operation_id = "getEvent",
    summary = "Get the event",
    description = "Returns the event with its current phase. No authentication required.",
    responses(
        (status = 200, description = "Event", body = EventResponse),
        (status = 404, description = "Event not initialised (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_event(State(state): State<AppState>) -> Result<Json<EventResponse>, AppError> {
    let event = state.service().current_event().await?;
    Ok(Json(event.into()))
}

#[utoipa::path(
    patch,
    path = "/event",
    tag = "Event",
    operation_id = "updateEvent",
    summary = "Update event details",
    description = "Changes the name, MOTD or dates. Admin only.",
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let event = state.service().update_event(&auth_user, payload).await?;
    Ok(Json(event.into()))
}

#[utoipa::path(
    post,
    path = "/event/advance",
    tag = "Event",
    operation_id = "advancePhase",
    summary = "Advance to the next phase",
    description = "Moves the event one phase forward. Entering `hacking` auto-assigns free agents to the Observers team. Admin only.",
    responses(
        (status = 200, description = "Phase changed", body = PhaseChangeResponse),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Already in the final phase, or changed concurrently (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn advance_phase(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PhaseChangeResponse>, AppError> {
    let change = state.service().advance_phase(&auth_user).await?;
    Ok(Json(change.into()))
}

#[utoipa::path(
    put,
    path = "/event/phase",
    tag = "Event",
    operation_id = "setPhase",
    summary = "Set the phase",
    description = "Accepts the current phase (no-op) or its immediate successor. Admin only.",
    request_body = SetPhaseRequest,
    responses(
        (status = 200, description = "Phase set", body = PhaseChangeResponse),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Not the next phase (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, phase = %payload.phase))]
pub async fn set_phase(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SetPhaseRequest>,
) -> Result<Json<PhaseChangeResponse>, AppError> {
    let change = state.service().set_phase(&auth_user, payload.phase).await?;
    Ok(Json(change.into()))
}

#[utoipa::path(
    post,
    path = "/event/auto-assign",
    tag = "Event",
    operation_id = "autoAssignObservers",
    summary = "Assign free agents to the Observers team",
    description = "Moves every opted-in free agent without a team into the Observers team. Idempotent. Admin only.",
    responses(
        (status = 200, description = "Assignment done", body = AutoAssignResponse),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn auto_assign(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AutoAssignResponse>, AppError> {
    let assignment = state.service().auto_assign(&auth_user).await?;
    Ok(Json(AutoAssignResponse {
        team: TeamResponse::from(assignment.team),
        assigned: assignment.assigned,
    }))
}
