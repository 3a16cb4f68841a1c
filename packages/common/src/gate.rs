//! Role- and phase-gated permission checks.
//!
//! Every mutation goes through [`check`] before touching storage. Ownership
//! rules (captain, team member) are enforced by the caller on top of this.

use serde::Serialize;
use std::fmt;

use crate::phase::Phase;
use crate::role::{Capabilities, Role};

/// A user-initiated action that is subject to gating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    UpdateProfile,
    ToggleFreeAgent,
    CreateTeam,
    UpdateTeam,
    /// Invites, join requests, responses, leaving, removal and captain transfer.
    ManageMembership,
    SaveDraft,
    SubmitProject,
    Vote,
    Score,
    ViewResults,
    ManageEvent,
    ViewAnalytics,
}

/// Phases in which an action is open, `None` meaning every phase.
fn open_phases(action: Action) -> Option<&'static [Phase]> {
    use Phase::*;
    match action {
        Action::UpdateProfile | Action::ManageEvent | Action::ViewAnalytics => None,
        Action::ToggleFreeAgent => Some(&[Registration, TeamFormation]),
        Action::CreateTeam => Some(&[TeamFormation]),
        Action::UpdateTeam => Some(&[TeamFormation, Hacking, Submission]),
        Action::ManageMembership => Some(&[TeamFormation, Hacking]),
        Action::SaveDraft => Some(&[Hacking, Submission]),
        Action::SubmitProject => Some(&[Submission]),
        Action::Vote => Some(&[Voting]),
        Action::Score => Some(&[Judging]),
        Action::ViewResults => Some(&[Results]),
    }
}

fn required_capability(action: Action) -> Option<fn(&Capabilities) -> bool> {
    match action {
        Action::Vote => Some(|c: &Capabilities| c.can_vote),
        Action::Score => Some(|c: &Capabilities| c.can_judge),
        Action::ManageEvent => Some(|c: &Capabilities| c.can_manage),
        Action::ViewAnalytics => Some(|c: &Capabilities| c.can_view_analytics),
        _ => None,
    }
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpdateProfile => "update_profile",
            Self::ToggleFreeAgent => "toggle_free_agent",
            Self::CreateTeam => "create_team",
            Self::UpdateTeam => "update_team",
            Self::ManageMembership => "manage_membership",
            Self::SaveDraft => "save_draft",
            Self::SubmitProject => "submit_project",
            Self::Vote => "vote",
            Self::Score => "score",
            Self::ViewResults => "view_results",
            Self::ManageEvent => "manage_event",
            Self::ViewAnalytics => "view_analytics",
        }
    }

    /// Whether the action is open in `phase`, ignoring roles.
    pub fn is_open_in(&self, phase: Phase) -> bool {
        open_phases(*self).is_none_or(|phases| phases.contains(&phase))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateDenied {
    #[error("role '{role}' may not {action}")]
    MissingCapability { action: Action, role: Role },
    #[error("{action} is not open during the {phase} phase")]
    PhaseClosed { action: Action, phase: Phase },
}

/// Decide whether `role` may perform `action` while the event is in `phase`.
///
/// Capability is checked before phase, so a participant trying to score
/// is told they lack the role rather than that judging is closed.
/// Managers may view results in any phase.
pub fn check(action: Action, role: Role, phase: Phase) -> Result<(), GateDenied> {
    let caps = role.capabilities();

    if let Some(has) = required_capability(action) {
        if !has(&caps) {
            return Err(GateDenied::MissingCapability { action, role });
        }
    }

    if action == Action::ViewResults && caps.can_manage {
        return Ok(());
    }

    if !action.is_open_in(phase) {
        return Err(GateDenied::PhaseClosed { action, phase });
    }

    Ok(())
}
