use chrono::{DateTime, Utc};
use common::Phase;
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_name, validate_text};
use super::team::TeamResponse;
use crate::error::AppError;
use crate::store::{Event, EventUpdate};

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    pub id: i32,
    #[schema(example = "HackDay 2026")]
    pub name: String,
    pub phase: Phase,
    /// Human-readable phase name.
    #[schema(example = "Team Formation")]
    pub phase_label: &'static str,
    /// Zero-based position of the phase in the fixed order.
    #[schema(example = 1)]
    pub phase_index: usize,
    /// Phase an admin may advance to, `null` once results are out.
    pub next_phase: Option<Phase>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Message of the day shown on the dashboard.
    pub motd: String,
    pub updated_at: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            phase: event.phase,
            phase_label: event.phase.label(),
            phase_index: event.phase.index(),
            next_phase: event.phase.next(),
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            motd: event.motd,
            updated_at: event.updated_at,
        }
    }
}

/// Partial event update. Send `null` for a date to clear it.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    #[schema(example = "Pitches start at 15:00 in the atrium")]
    pub motd: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub starts_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

/// Validate the request against the stored event and build the update.
pub fn validate_update_event(
    payload: UpdateEventRequest,
    current: &Event,
) -> Result<EventUpdate, AppError> {
    let name = payload
        .name
        .map(|name| validate_name("Event name", &name, 128))
        .transpose()?;
    if let Some(motd) = &payload.motd {
        validate_text("MOTD", motd)?;
    }

    let starts_at = payload.starts_at.unwrap_or(current.starts_at);
    let ends_at = payload.ends_at.unwrap_or(current.ends_at);
    if let (Some(start), Some(end)) = (starts_at, ends_at) {
        if end <= start {
            return Err(AppError::Validation(
                "ends_at must be after starts_at".into(),
            ));
        }
    }

    Ok(EventUpdate {
        name,
        motd: payload.motd,
        starts_at: payload.starts_at,
        ends_at: payload.ends_at,
    })
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetPhaseRequest {
    /// Must be the current phase or its immediate successor.
    pub phase: Phase,
}

/// Outcome of a phase change.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PhaseChangeResponse {
    pub event: EventResponse,
    /// Free agents moved into the Observers team by this change.
    pub auto_assigned: Vec<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AutoAssignResponse {
    pub team: TeamResponse,
    /// Users moved in by this call.
    pub assigned: Vec<i32>,
}
