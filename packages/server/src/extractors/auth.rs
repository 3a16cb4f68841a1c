use axum::{extract::FromRequestParts, http::request::Parts};
use common::{Action, Capabilities, Phase, Role};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Header that overrides the caller's role when `auth.dev_impersonation` is on.
pub const IMPERSONATE_HEADER: &str = "X-Impersonate-Role";

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. The role is
/// read from the store on every request, so role changes apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn capabilities(&self) -> Capabilities {
        self.role.capabilities()
    }

    /// Run the role/phase gate for `action`.
    pub fn require(&self, action: Action, phase: Phase) -> Result<(), AppError> {
        common::gate::check(action, self.role, phase).map_err(AppError::from)
    }

    pub fn is_manager(&self) -> bool {
        self.capabilities().can_manage
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims =
            jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

        // Deleted accounts lose access even with an unexpired token.
        let user = state
            .store
            .find_user(claims.uid)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        let mut role = user.role;
        if state.config.auth.dev_impersonation {
            if let Some(header) = parts.headers.get(IMPERSONATE_HEADER) {
                let requested = header
                    .to_str()
                    .ok()
                    .and_then(|v| v.trim().parse::<Role>().ok())
                    .ok_or_else(|| {
                        AppError::Validation(format!("{IMPERSONATE_HEADER} must name a role"))
                    })?;
                tracing::warn!(
                    user_id = user.id,
                    actual = %user.role,
                    impersonating = %requested,
                    "Role impersonation in effect"
                );
                role = requested;
            }
        }

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
            role,
        })
    }
}
