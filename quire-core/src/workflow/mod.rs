//! Task lifecycle phases and the machine that enforces them

pub mod phase;
pub mod state;

pub use phase::TaskPhase;
pub use state::{PhaseTransition, TaskLifecycle, Workflow};
