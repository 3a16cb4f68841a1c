pub mod config;
pub mod gate;
pub mod phase;
pub mod project_status;
pub mod role;
pub mod team;

pub use config::HackdayConfig;
pub use gate::{Action, GateDenied};
pub use phase::Phase;
pub use project_status::ProjectStatus;
pub use role::{Capabilities, Role};
pub use team::{InviteKind, InviteStatus, TeamKind};
