#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a team's project during the submission lifecycle.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Created together with the team; nothing saved yet.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "not_started"))]
    NotStarted,
    /// At least one save has happened.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "draft"))]
    Draft,
    /// Final. Eligible for votes and scores.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "submitted"))]
    Submitted,
}

impl ProjectStatus {
    pub const ALL: &'static [ProjectStatus] = &[Self::NotStarted, Self::Draft, Self::Submitted];

    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// Status after a draft save. A submitted project stays submitted.
    pub fn after_save(&self) -> ProjectStatus {
        match self {
            Self::Submitted => Self::Submitted,
            Self::NotStarted | Self::Draft => Self::Draft,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Draft => "draft",
            Self::Submitted => "submitted",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}
