//! Storage interface for HackDay data.
//!
//! Two implementations exist: [`memory::MemoryStore`] for demo mode and
//! [`db::DbStore`] backed by PostgreSQL. Each compound mutation is atomic
//! within its store, so the team-capacity, one-team-per-user and vote-cap
//! invariants hold under concurrent requests.

pub mod db;
pub mod memory;
mod records;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{InviteStatus, Phase, Role};

pub use records::*;

/// Errors returned by a [`HackdayStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("team is full ({capacity} members)")]
    TeamFull { capacity: u32 },
    #[error("vote limit of {limit} reached")]
    VoteLimit { limit: u32 },
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

#[async_trait]
pub trait HackdayStore: Send + Sync {
    // Users

    /// Insert a user. Fails with `Conflict` if the username is taken.
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn find_user(&self, id: i32) -> Result<Option<User>, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// All users ordered by id.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<User, StoreError>;

    /// Set the free-agent flag. Opting in fails with `Conflict` while the user is on a team.
    async fn set_free_agent(&self, id: i32, free_agent: bool) -> Result<User, StoreError>;

    async fn set_role(&self, id: i32, role: Role) -> Result<User, StoreError>;

    // Event

    async fn get_event(&self) -> Result<Option<Event>, StoreError>;

    /// Create the singleton event in `Registration` unless it already exists.
    async fn init_event(&self, name: &str) -> Result<Event, StoreError>;

    /// Move the event from `from` to `to`.
    ///
    /// Fails with `Conflict` if the stored phase is no longer `from`.
    async fn transition_phase(&self, from: Phase, to: Phase) -> Result<Event, StoreError>;

    /// `transition_phase` and `assign_observers` as one atomic step.
    ///
    /// Nothing changes if either half fails.
    async fn transition_phase_with_observers(
        &self,
        from: Phase,
        to: Phase,
        team_name: &str,
    ) -> Result<(Event, ObserverAssignment), StoreError>;

    async fn update_event(&self, update: EventUpdate) -> Result<Event, StoreError>;

    // Teams

    /// Create a team with its captain as sole member and an empty project.
    ///
    /// Fails with `Conflict` if the captain already has a team or the name is taken.
    async fn create_team(&self, new: NewTeam) -> Result<Team, StoreError>;

    /// All teams ordered by id.
    async fn list_teams(&self) -> Result<Vec<Team>, StoreError>;

    async fn find_team(&self, id: i32) -> Result<Option<Team>, StoreError>;

    async fn find_team_of_user(&self, user_id: i32) -> Result<Option<Team>, StoreError>;

    /// Apply an update. Capacity may not drop below the current member count.
    async fn update_team(&self, id: i32, update: TeamUpdate) -> Result<Team, StoreError>;

    /// Remove a member. Returns `None` when the team became empty and was deleted
    /// together with its project, votes, scores and invites.
    ///
    /// Fails with `Conflict` if `user_id` is the captain and others remain.
    async fn remove_member(&self, team_id: i32, user_id: i32) -> Result<Option<Team>, StoreError>;

    /// Hand the captaincy to an existing member.
    async fn set_captain(&self, team_id: i32, user_id: i32) -> Result<Team, StoreError>;

    /// Move every opted-in free agent without a team into the Observers team,
    /// creating it under `team_name` if needed and growing its capacity to fit.
    async fn assign_observers(&self, team_name: &str) -> Result<ObserverAssignment, StoreError>;

    // Invites and join requests

    /// Fails with `Conflict` if an identical pending invite or request exists.
    async fn create_invite(&self, new: NewInvite) -> Result<Invite, StoreError>;

    async fn find_invite(&self, id: i32) -> Result<Option<Invite>, StoreError>;

    /// Invites addressed to, and join requests made by, `user_id`.
    async fn list_invites_for_user(&self, user_id: i32) -> Result<Vec<Invite>, StoreError>;

    async fn list_invites_for_team(&self, team_id: i32) -> Result<Vec<Invite>, StoreError>;

    /// Resolve a pending invite without membership changes.
    ///
    /// Fails with `Conflict` if it is no longer pending.
    async fn resolve_invite(
        &self,
        id: i32,
        status: InviteStatus,
        at: DateTime<Utc>,
    ) -> Result<Invite, StoreError>;

    /// Accept a pending invite: add the member, clear their free-agent flag and
    /// cancel their other pending invites and requests.
    async fn accept_invite(&self, id: i32, at: DateTime<Utc>) -> Result<(Invite, Team), StoreError>;

    // Projects

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;

    async fn find_project(&self, id: i32) -> Result<Option<Project>, StoreError>;

    async fn find_project_by_team(&self, team_id: i32) -> Result<Option<Project>, StoreError>;

    /// Overwrite the editable fields of a project. Last write wins.
    async fn save_project(&self, project: Project) -> Result<Project, StoreError>;

    // Votes

    /// Record a vote. Fails with `Conflict` on a repeat vote and
    /// `VoteLimit` once the user has cast `max_votes`.
    async fn cast_vote(
        &self,
        user_id: i32,
        project_id: i32,
        max_votes: u32,
    ) -> Result<Vote, StoreError>;

    /// Returns whether a vote existed.
    async fn retract_vote(&self, user_id: i32, project_id: i32) -> Result<bool, StoreError>;

    async fn list_votes(&self) -> Result<Vec<Vote>, StoreError>;

    async fn list_votes_by_user(&self, user_id: i32) -> Result<Vec<Vote>, StoreError>;

    // Judge scores

    /// Insert or replace the judge's score for the project.
    async fn upsert_score(&self, score: JudgeScore) -> Result<JudgeScore, StoreError>;

    async fn list_scores(&self) -> Result<Vec<JudgeScore>, StoreError>;

    async fn list_scores_for_project(&self, project_id: i32)
    -> Result<Vec<JudgeScore>, StoreError>;
}
