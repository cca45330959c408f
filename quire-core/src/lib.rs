//! Quire Core - Task-to-commit pipeline for a GitHub-backed document editor
//!
//! Editors collect edits to a repository's documents in a task. This crate
//! turns those edits into commits on a per-task branch and a pull request
//! against the organization's repository, without touching a local clone.

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod lint;
pub mod pipeline;
pub mod remote;
pub mod secrets;
pub mod task;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::EditableRepo;
pub use config::Config;
pub use error::{Error, Operation, Result};
pub use pipeline::{SubmissionOrchestrator, SubmitOutcome};
pub use remote::{GitHost, RemoteError, RemoteResult, RepoRef, UserIdentity};
pub use secrets::Secrets;
pub use task::{File, PullRequestRef, PullRequestStatus, Task, TaskStore};
pub use workflow::TaskPhase;
