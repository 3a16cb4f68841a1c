use chrono::{DateTime, Utc};
use common::{Capabilities, Role};
use serde::{Deserialize, Serialize};

use super::shared::{normalize_tags, validate_name};
use crate::error::AppError;
use crate::store::{ProfileUpdate, User};

/// Public view of an account. Never includes the password hash.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "Alice Wonder")]
    pub display_name: String,
    pub role: Role,
    #[schema(example = json!(["Backend Development", "Rust"]))]
    pub skills: Vec<String>,
    /// Opted in to matching and auto-assignment into the Observers team.
    pub is_free_agent: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            role: user.role,
            skills: user.skills,
            is_free_agent: user.is_free_agent,
            created_at: user.created_at,
        }
    }
}

/// Current user's profile together with what their role allows.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Effective role for this request. Differs from `user.role` only under impersonation.
    pub effective_role: Role,
    pub capabilities: Capabilities,
    /// Team the user belongs to, if any.
    pub team_id: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    #[schema(example = "Alice W.")]
    pub display_name: Option<String>,
    #[schema(example = json!(["Frontend", "UX"]))]
    pub skills: Option<Vec<String>>,
}

pub fn validate_update_profile(payload: UpdateProfileRequest) -> Result<ProfileUpdate, AppError> {
    let display_name = payload
        .display_name
        .map(|name| validate_name("Display name", &name, 64))
        .transpose()?;
    let skills = payload
        .skills
        .map(|skills| normalize_tags("skills", skills))
        .transpose()?;
    Ok(ProfileUpdate {
        display_name,
        skills,
    })
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct FreeAgentRequest {
    pub is_free_agent: bool,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetRoleRequest {
    pub role: Role,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FreeAgentQuery {
    /// Only return free agents listing this skill (case-insensitive).
    pub skill: Option<String>,
}
