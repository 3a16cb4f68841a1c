use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::GateDenied;
use sea_orm::DbErr;
use serde::Serialize;

use crate::store::StoreError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `PHASE_CLOSED`,
    /// `NOT_FOUND`, `CONFLICT`, `USERNAME_TAKEN`, `TEAM_FULL`, `VOTE_LIMIT_REACHED`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "PHASE_CLOSED")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "vote is not open during the hacking phase")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    /// Role lacks the capability, or the caller does not own the resource.
    PermissionDenied(String),
    /// The action is not open in the current event phase.
    PhaseClosed(String),
    NotFound(String),
    Conflict(String),
    UsernameTaken,
    TeamFull {
        capacity: u32,
    },
    VoteLimitReached {
        limit: u32,
    },
    Internal(String),
}

impl AppError {
    /// Shorthand for the common "you may not do this" denial.
    pub fn forbidden() -> Self {
        AppError::PermissionDenied("Insufficient permissions".into())
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid username or password".into(),
                },
            ),
            AppError::PermissionDenied(msg) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: msg,
                },
            ),
            AppError::PhaseClosed(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "PHASE_CLOSED",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "USERNAME_TAKEN",
                    message: "Username is already taken".into(),
                },
            ),
            AppError::TeamFull { capacity } => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "TEAM_FULL",
                    message: format!("Team is full ({capacity} members)"),
                },
            ),
            AppError::VoteLimitReached { limit } => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "VOTE_LIMIT_REACHED",
                    message: format!("You have already cast all {limit} votes"),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::TeamFull { capacity } => AppError::TeamFull { capacity },
            StoreError::VoteLimit { limit } => AppError::VoteLimitReached { limit },
            StoreError::Database(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<GateDenied> for AppError {
    fn from(err: GateDenied) -> Self {
        tracing::debug!("Gate denied: {err}");
        match err {
            GateDenied::MissingCapability { .. } => AppError::PermissionDenied(err.to_string()),
            GateDenied::PhaseClosed { .. } => AppError::PhaseClosed(err.to_string()),
        }
    }
}
