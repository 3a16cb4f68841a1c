#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a HackDay account. Only admins change roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "participant"))]
    Participant,
    /// Participant who promotes the event and follows its numbers.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ambassador"))]
    Ambassador,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "judge"))]
    Judge,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "admin"))]
    Admin,
}

/// What a role is allowed to do, independent of the current phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Capabilities {
    pub can_vote: bool,
    pub can_judge: bool,
    pub can_manage: bool,
    pub can_view_analytics: bool,
}

impl Role {
    /// The role assigned to newly registered users.
    pub const DEFAULT: Role = Role::Participant;

    pub const ALL: &'static [Role] = &[
        Self::Participant,
        Self::Ambassador,
        Self::Judge,
        Self::Admin,
    ];

    pub fn capabilities(&self) -> Capabilities {
        match self {
            Self::Participant => Capabilities {
                can_vote: true,
                can_judge: false,
                can_manage: false,
                can_view_analytics: false,
            },
            Self::Ambassador => Capabilities {
                can_vote: true,
                can_judge: false,
                can_manage: false,
                can_view_analytics: true,
            },
            Self::Judge => Capabilities {
                can_vote: false,
                can_judge: true,
                can_manage: false,
                can_view_analytics: true,
            },
            Self::Admin => Capabilities {
                can_vote: true,
                can_judge: true,
                can_manage: true,
                can_view_analytics: true,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Ambassador => "ambassador",
            Self::Judge => "judge",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid role '{0}'. Valid values: participant, ambassador, judge, admin")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}
