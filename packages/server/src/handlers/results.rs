use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::results::{AnalyticsResponse, ResultsResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/results",
    tag = "Results",
    operation_id = "getResults",
    summary = "Ranked results",
    description = "Open to everyone in the results phase; admins can view earlier.",
    responses(
        (status = 200, description = "Results", body = ResultsResponse),
        (status = 409, description = "Not yet published (PHASE_CLOSED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn results(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ResultsResponse>, AppError> {
    Ok(Json(state.service().results(&auth_user).await?))
}

#[utoipa::path(
    get,
    path = "/analytics",
    tag = "Results",
    operation_id = "getAnalytics",
    summary = "Event analytics",
    description = "Ambassadors, judges and admins.",
    responses(
        (status = 200, description = "Analytics", body = AnalyticsResponse),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn analytics(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    Ok(Json(state.service().analytics(&auth_user).await?))
}
