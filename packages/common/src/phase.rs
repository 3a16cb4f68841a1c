#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stage of the HackDay lifecycle.
///
/// Phases are linearly ordered; the event only ever moves to the next one.
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Accounts are being created; free agents may opt in.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "registration"))]
    Registration,
    /// Teams are created, invites and join requests flow.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "team_formation"))]
    TeamFormation,
    /// Building. Opted-in free agents are moved into the Observers team on entry.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "hacking"))]
    Hacking,
    /// Projects are finalised and submitted.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "submission"))]
    Submission,
    /// Participants vote for submitted projects.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "voting"))]
    Voting,
    /// Judges score submitted projects.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "judging"))]
    Judging,
    /// Results are published.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "results"))]
    Results,
}

impl Phase {
    /// All phases in lifecycle order.
    pub const ALL: &'static [Phase] = &[
        Self::Registration,
        Self::TeamFormation,
        Self::Hacking,
        Self::Submission,
        Self::Voting,
        Self::Judging,
        Self::Results,
    ];

    /// Zero-based position in the lifecycle.
    pub fn index(&self) -> usize {
        match self {
            Self::Registration => 0,
            Self::TeamFormation => 1,
            Self::Hacking => 2,
            Self::Submission => 3,
            Self::Voting => 4,
            Self::Judging => 5,
            Self::Results => 6,
        }
    }

    /// The phase that follows this one, or `None` for `Results`.
    pub fn next(&self) -> Option<Phase> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Human-readable label for banners and admin consoles.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Registration => "Registration",
            Self::TeamFormation => "Team Formation",
            Self::Hacking => "Hacking",
            Self::Submission => "Submission",
            Self::Voting => "Voting",
            Self::Judging => "Judging",
            Self::Results => "Results",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::TeamFormation => "team_formation",
            Self::Hacking => "hacking",
            Self::Submission => "submission",
            Self::Voting => "voting",
            Self::Judging => "judging",
            Self::Results => "results",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::Registration
    }
}

/// Error when parsing an invalid phase string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid phase '{invalid}'. Valid values: {}", valid_phases())]
pub struct ParsePhaseError {
    invalid: String,
}

fn valid_phases() -> String {
    Phase::ALL
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl FromStr for Phase {
    type Err = ParsePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParsePhaseError {
                invalid: s.to_string(),
            })
    }
}
