use common::{Action, Phase};
use tracing::{info, instrument, warn};

use super::HackdayService;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::event::{UpdateEventRequest, validate_update_event};
use crate::store::{Event, ObserverAssignment};

/// Outcome of a phase transition.
#[derive(Debug)]
pub struct PhaseChange {
    pub event: Event,
    /// Free agents moved into the Observers team on entering hacking.
    pub auto_assigned: Vec<i32>,
}

impl HackdayService<'_> {
    /// Move the event to the next phase.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn advance_phase(&self, caller: &AuthUser) -> Result<PhaseChange, AppError> {
        let event = self.gate(caller, Action::ManageEvent).await?;
        let next = event.phase.next().ok_or_else(|| {
            AppError::Conflict(format!("The event is already in the final {} phase", event.phase))
        })?;
        self.move_phase(event.phase, next).await
    }

    /// Set the phase explicitly. Only the current phase (no-op) or its successor is accepted.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn set_phase(&self, caller: &AuthUser, target: Phase) -> Result<PhaseChange, AppError> {
        let event = self.gate(caller, Action::ManageEvent).await?;
        if target == event.phase {
            return Ok(PhaseChange {
                event,
                auto_assigned: Vec::new(),
            });
        }
        if event.phase.next() != Some(target) {
            warn!(from = %event.phase, to = %target, "Rejected phase change");
            return Err(AppError::Conflict(format!(
                "Phase can only advance one step at a time (from {} the next phase is {})",
                event.phase,
                event.phase.next().map_or("none", |p| p.as_str())
            )));
        }
        self.move_phase(event.phase, target).await
    }

    async fn move_phase(&self, from: Phase, to: Phase) -> Result<PhaseChange, AppError> {
        if to != Phase::Hacking {
            let event = self.store.transition_phase(from, to).await?;
            info!(from = %from, to = %to, "Event phase changed");
            return Ok(PhaseChange {
                event,
                auto_assigned: Vec::new(),
            });
        }

        let (event, assignment) = self
            .store
            .transition_phase_with_observers(from, to, &self.rules.observers_team_name)
            .await?;
        info!(
            from = %from,
            to = %to,
            team_id = assignment.team.id,
            assigned = assignment.assigned.len(),
            "Event phase changed, free agents moved to observers"
        );
        Ok(PhaseChange {
            event,
            auto_assigned: assignment.assigned,
        })
    }

    async fn assign_observers(&self) -> Result<ObserverAssignment, AppError> {
        let assignment = self
            .store
            .assign_observers(&self.rules.observers_team_name)
            .await?;
        info!(
            team_id = assignment.team.id,
            assigned = assignment.assigned.len(),
            "Auto-assigned free agents to observers"
        );
        Ok(assignment)
    }

    /// Manually run the Observers auto-assignment.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn auto_assign(&self, caller: &AuthUser) -> Result<ObserverAssignment, AppError> {
        self.gate(caller, Action::ManageEvent).await?;
        self.assign_observers().await
    }

    #[instrument(skip(self, caller, payload), fields(user_id = caller.user_id))]
    pub async fn update_event(
        &self,
        caller: &AuthUser,
        payload: UpdateEventRequest,
    ) -> Result<Event, AppError> {
        let event = self.gate(caller, Action::ManageEvent).await?;
        let update = validate_update_event(payload, &event)?;
        Ok(self.store.update_event(update).await?)
    }
}
