use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{InviteKind, InviteStatus, Phase, ProjectStatus, Role, TeamKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: Role,
    pub skills: Vec<String>,
    /// Opted in to matching and auto-assignment.
    pub is_free_agent: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: Role,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub skills: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: i32,
    pub name: String,
    pub phase: Phase,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub motd: String,
    pub updated_at: DateTime<Utc>,
}

/// Partial event update. `Some(None)` clears a date.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub motd: Option<String>,
    pub starts_at: Option<Option<DateTime<Utc>>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub user_id: i32,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub looking_for: Vec<String>,
    pub max_members: u32,
    /// `None` only for the Observers team.
    pub captain_id: Option<i32>,
    pub kind: TeamKind,
    /// Ordered by join time.
    pub members: Vec<TeamMember>,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn is_member(&self, user_id: i32) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn is_captain(&self, user_id: i32) -> bool {
        self.captain_id == Some(user_id)
    }

    /// The Observers team is uncapped.
    pub fn is_full(&self) -> bool {
        self.kind == TeamKind::Regular && self.members.len() as u32 >= self.max_members
    }
}

#[derive(Debug, Clone)]
pub struct NewTeam {
    pub name: String,
    pub description: String,
    pub looking_for: Vec<String>,
    pub max_members: u32,
    pub captain_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub looking_for: Option<Vec<String>>,
    pub max_members: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ObserverAssignment {
    pub team: Team,
    /// Users moved in by this call. Empty when nobody was waiting.
    pub assigned: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    pub id: i32,
    pub team_id: i32,
    /// The invited user, or the user asking to join.
    pub user_id: i32,
    pub kind: InviteKind,
    pub status: InviteStatus,
    pub message: Option<String>,
    pub created_by: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Invite {
    /// Stored status, reporting a lapsed pending invite as expired.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InviteStatus {
        match (self.status, self.expires_at) {
            (InviteStatus::Pending, Some(expires_at)) if expires_at <= now => InviteStatus::Expired,
            (status, _) => status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewInvite {
    pub team_id: i32,
    pub user_id: i32,
    pub kind: InviteKind,
    pub message: Option<String>,
    pub created_by: i32,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: i32,
    pub team_id: i32,
    pub title: String,
    pub description: String,
    pub repo_url: Option<String>,
    pub video_url: Option<String>,
    pub demo_url: Option<String>,
    pub status: ProjectStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn has_link(&self) -> bool {
        self.repo_url.is_some() || self.video_url.is_some() || self.demo_url.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub user_id: i32,
    pub project_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeScore {
    pub judge_id: i32,
    pub project_id: i32,
    /// Criterion name to score.
    pub scores: BTreeMap<String, i32>,
    pub comments: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JudgeScore {
    pub fn total(&self) -> i32 {
        self.scores.values().sum()
    }
}
