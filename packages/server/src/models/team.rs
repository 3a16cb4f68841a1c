use chrono::{DateTime, Utc};
use common::{HackdayConfig, TeamKind};
use serde::{Deserialize, Serialize};

use super::shared::{normalize_tags, validate_name, validate_text};
use crate::error::AppError;
use crate::store::{Team, TeamUpdate};

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamMemberResponse {
    pub user_id: i32,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Neural Nexus")]
    pub name: String,
    pub description: String,
    /// Skills the team is still looking for.
    #[schema(example = json!(["Backend Development"]))]
    pub looking_for: Vec<String>,
    #[schema(example = 5)]
    pub max_members: u32,
    /// `null` only for the Observers team.
    pub captain_id: Option<i32>,
    pub kind: TeamKind,
    /// Members in join order.
    pub members: Vec<TeamMemberResponse>,
    pub member_count: usize,
    pub is_full: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        let is_full = team.is_full();
        Self {
            id: team.id,
            name: team.name,
            description: team.description,
            looking_for: team.looking_for,
            max_members: team.max_members,
            captain_id: team.captain_id,
            kind: team.kind,
            member_count: team.members.len(),
            members: team
                .members
                .into_iter()
                .map(|m| TeamMemberResponse {
                    user_id: m.user_id,
                    joined_at: m.joined_at,
                })
                .collect(),
            is_full,
            created_at: team.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTeamRequest {
    #[schema(example = "Neural Nexus")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = json!(["Backend Development"]))]
    pub looking_for: Option<Vec<String>>,
    /// Capacity, 2 up to the configured maximum. Defaults to the configured team size.
    #[schema(example = 5)]
    pub max_members: Option<u32>,
}

/// Validated team-creation input.
#[derive(Debug)]
pub struct TeamDraft {
    pub name: String,
    pub description: String,
    pub looking_for: Vec<String>,
    pub max_members: u32,
}

fn validate_capacity(rules: &HackdayConfig, size: u32) -> Result<(), AppError> {
    if !rules.team_size_allowed(size) {
        return Err(AppError::Validation(format!(
            "max_members must be between {} and {}",
            common::config::MIN_TEAM_SIZE,
            rules.max_team_size
        )));
    }
    Ok(())
}

pub fn validate_create_team(
    payload: CreateTeamRequest,
    rules: &HackdayConfig,
) -> Result<TeamDraft, AppError> {
    let name = validate_name("Team name", &payload.name, 64)?;
    let description = payload.description.unwrap_or_default();
    validate_text("Description", &description)?;
    let looking_for = normalize_tags("looking_for", payload.looking_for.unwrap_or_default())?;
    let max_members = payload.max_members.unwrap_or(rules.default_team_size);
    validate_capacity(rules, max_members)?;
    Ok(TeamDraft {
        name,
        description,
        looking_for,
        max_members,
    })
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub looking_for: Option<Vec<String>>,
    pub max_members: Option<u32>,
}

pub fn validate_update_team(
    payload: UpdateTeamRequest,
    rules: &HackdayConfig,
) -> Result<TeamUpdate, AppError> {
    let name = payload
        .name
        .map(|name| validate_name("Team name", &name, 64))
        .transpose()?;
    if let Some(description) = &payload.description {
        validate_text("Description", description)?;
    }
    let looking_for = payload
        .looking_for
        .map(|tags| normalize_tags("looking_for", tags))
        .transpose()?;
    if let Some(size) = payload.max_members {
        validate_capacity(rules, size)?;
    }
    Ok(TeamUpdate {
        name,
        description: payload.description,
        looking_for,
        max_members: payload.max_members,
    })
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct TransferCaptainRequest {
    /// Current member who becomes captain.
    pub user_id: i32,
}

/// Result of leaving a team or removing a member.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MembershipChangeResponse {
    /// The team after the change, `null` if it was deleted because it emptied.
    pub team: Option<TeamResponse>,
}
