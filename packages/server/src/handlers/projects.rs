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
use crate::models::project::{
    MyVotesResponse, ProjectResponse, ScoreRequest, ScoreResponse, UpdateProjectRequest,
    VoteResponse, validate_update_project,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    operation_id = "listProjects",
    summary = "List projects",
    description = "Submitted projects plus the caller's own team project. Admins see all.",
    responses(
        (status = 200, description = "Projects ordered by id", body = Vec<ProjectResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_projects(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let projects = state.service().list_projects(&auth_user).await?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Projects",
    operation_id = "getProject",
    summary = "Get a project",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = ProjectResponse),
        (status = 404, description = "Not found or not visible (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, project_id = id))]
pub async fn get_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectResponse>, AppError> {
    let project = state.service().get_project(&auth_user, id).await?;
    Ok(Json(project.into()))
}

#[utoipa::path(
    patch,
    path = "/projects/{id}",
    tag = "Projects",
    operation_id = "updateProject",
    summary = "Save the project draft",
    description = "Team members only. A submitted project keeps its submitted status.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Saved", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not a team member (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Closed in this phase (PHASE_CLOSED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, project_id = id))]
pub async fn update_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, AppError> {
    let edit = validate_update_project(payload)?;
    let project = state.service().update_project(&auth_user, id, edit).await?;
    Ok(Json(project.into()))
}

#[utoipa::path(
    post,
    path = "/projects/{id}/submit",
    tag = "Projects",
    operation_id = "submitProject",
    summary = "Submit the project",
    description = "Requires a title and at least one link. Submitting twice is a no-op.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Submitted", body = ProjectResponse),
        (status = 400, description = "Incomplete project (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not a team member (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Closed in this phase (PHASE_CLOSED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, project_id = id))]
pub async fn submit_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectResponse>, AppError> {
    let project = state.service().submit_project(&auth_user, id).await?;
    Ok(Json(project.into()))
}

#[utoipa::path(
    post,
    path = "/projects/{id}/vote",
    tag = "Voting",
    operation_id = "castVote",
    summary = "Vote for a project",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 201, description = "Vote recorded", body = VoteResponse),
        (status = 403, description = "Own team's project or role cannot vote (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Already voted, limit reached, or closed in this phase (CONFLICT, VOTE_LIMIT_REACHED, PHASE_CLOSED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, project_id = id))]
pub async fn cast_vote(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let vote = state.service().cast_vote(&auth_user, id).await?;
    Ok((StatusCode::CREATED, Json(VoteResponse::from(vote))))
}

#[utoipa::path(
    delete,
    path = "/projects/{id}/vote",
    tag = "Voting",
    operation_id = "retractVote",
    summary = "Retract a vote",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Vote removed"),
        (status = 404, description = "No vote to retract (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Closed in this phase (PHASE_CLOSED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, project_id = id))]
pub async fn retract_vote(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.service().retract_vote(&auth_user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/votes/mine",
    tag = "Voting",
    operation_id = "listMyVotes",
    summary = "Your votes and how many remain",
    responses(
        (status = 200, description = "Votes", body = MyVotesResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn my_votes(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MyVotesResponse>, AppError> {
    let (votes, max_votes, remaining) = state.service().my_votes(&auth_user).await?;
    Ok(Json(MyVotesResponse {
        votes: votes.into_iter().map(VoteResponse::from).collect(),
        max_votes,
        remaining,
    }))
}

#[utoipa::path(
    put,
    path = "/projects/{id}/score",
    tag = "Judging",
    operation_id = "scoreProject",
    summary = "Score a project",
    description = "Judges only, during judging. Re-scoring replaces the previous score.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = ScoreRequest,
    responses(
        (status = 200, description = "Score saved", body = ScoreResponse),
        (status = 400, description = "Missing, unknown or out-of-range criterion (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not a judge (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Project not submitted or closed in this phase (CONFLICT, PHASE_CLOSED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, project_id = id))]
pub async fn score_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let score = state
        .service()
        .score_project(&auth_user, id, payload)
        .await?;
    Ok(Json(score.into()))
}

#[utoipa::path(
    get,
    path = "/projects/{id}/scores",
    tag = "Judging",
    operation_id = "listProjectScores",
    summary = "Scores for a project",
    description = "Judges see their own score; admins see all.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Scores", body = Vec<ScoreResponse>),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, project_id = id))]
pub async fn list_scores(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ScoreResponse>>, AppError> {
    let scores = state.service().list_scores(&auth_user, id).await?;
    Ok(Json(scores.into_iter().map(ScoreResponse::from).collect()))
}
