//! HackDay business rules.
//!
//! [`HackdayService`] wraps a store and the configured rules. Every operation
//! runs the role/phase gate for its action, applies ownership checks (captain,
//! member, invite recipient), then delegates to the store, which enforces the
//! data invariants atomically.

mod event;
mod membership;
mod projects;
mod results;
mod users;
mod voting;

pub use event::PhaseChange;
pub use results::{compute_analytics, rank_projects};

use common::{Action, HackdayConfig};

use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::store::{Event, HackdayStore, Project, Team, User};

pub struct HackdayService<'a> {
    store: &'a dyn HackdayStore,
    rules: &'a HackdayConfig,
}

impl<'a> HackdayService<'a> {
    pub fn new(store: &'a dyn HackdayStore, rules: &'a HackdayConfig) -> Self {
        Self { store, rules }
    }

    pub async fn current_event(&self) -> Result<Event, AppError> {
        self.store
            .get_event()
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".into()))
    }

    /// Load the event and check `action` against its phase for the caller.
    async fn gate(&self, caller: &AuthUser, action: Action) -> Result<Event, AppError> {
        let event = self.current_event().await?;
        caller.require(action, event.phase)?;
        Ok(event)
    }

    async fn require_user(&self, id: i32) -> Result<User, AppError> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn require_team(&self, id: i32) -> Result<Team, AppError> {
        self.store
            .find_team(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".into()))
    }

    async fn require_project(&self, id: i32) -> Result<Project, AppError> {
        self.store
            .find_project(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".into()))
    }
}
