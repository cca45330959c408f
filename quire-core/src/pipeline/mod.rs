//! Task-to-commit submission pipeline
//!
//! The orchestrator sequences the components below for one task at a time:
//! 1. Normalizes edited files and builds a sparse tree overlay
//! 2. Creates the task branch at the parent commit (first submission)
//! 3. Writes tree and commit, then moves the branch head
//! 4. Opens a pull request (first submission)
//!
//! Results are recorded onto the task only when every remote step succeeds.

mod branch;
mod fork;
mod orchestrator;
mod pulls;

pub use branch::BranchCoordinator;
pub use fork::{ForkSynchronizer, RetryPolicy};
pub use orchestrator::{SubmissionOrchestrator, SubmitOutcome};
pub use pulls::{pull_request_body, PullRequestGateway};
