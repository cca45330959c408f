//! Error types for Quire

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::remote::RemoteError;
use crate::workflow::TaskPhase;

/// Result type alias for Quire operations
pub type Result<T> = std::result::Result<T, Error>;

/// The user-facing operation category a network failure is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Fetching a repository snapshot into a task
    Checkout,
    /// Submitting or re-submitting a task
    Submit,
    /// Refreshing pull request status
    Refresh,
}

impl Operation {
    /// The notice shown to the editor when this operation fails on the network
    pub fn user_message(&self) -> &'static str {
        match self {
            Operation::Submit => {
                "There was an error submitting your task to GitHub. Probably just a temporary \
                 glitch on their end. None of your work was lost, try submitting again in a \
                 few seconds."
            }
            Operation::Checkout => {
                "There was an error retrieving source files to edit. Probably just a temporary \
                 glitch with GitHub. Try again in a few seconds."
            }
            Operation::Refresh => {
                "There was an error checking the status of your pull request. Try again in a \
                 few seconds."
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Checkout => write!(f, "checkout"),
            Operation::Submit => write!(f, "submit"),
            Operation::Refresh => write!(f, "refresh"),
        }
    }
}

/// Error type for Quire operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A remote call failed while running an operation; nothing was recorded
    #[error("Network error during {operation}: {source}")]
    Network {
        operation: Operation,
        #[source]
        source: RemoteError,
    },

    /// No authenticated GitHub user is available
    #[error("GitHub user not authenticated")]
    NotAuthenticated,

    /// Task has no parent commit yet
    #[error("Task {0} has not been checked out")]
    NotCheckedOut(Uuid),

    /// Task already has a pull request
    #[error("Task {0} was already submitted; re-submit instead")]
    AlreadySubmitted(Uuid),

    /// Task has no pull request to add commits to
    #[error("Task {0} has no pull request; submit it first")]
    NotSubmitted(Uuid),

    /// No file in the task carries a committable edit
    #[error("Task {0} has no edited files to submit")]
    NoChanges(Uuid),

    /// Another submission for the same task has not resolved yet
    #[error("A submission for task {0} is already in progress")]
    SubmissionInProgress(Uuid),

    /// Recovery requires a merged or closed pull request
    #[error("Task {0} cannot be recovered until its pull request is merged or closed")]
    NotRecoverable(Uuid),

    /// Task not present in the store
    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    /// Path not among the task's files
    #[error("Task {task} has no file {path}")]
    FileNotFound { task: Uuid, path: String },

    /// Phase machine rejected a transition
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: TaskPhase, to: TaskPhase },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a remote failure under the given operation category
    pub fn network(operation: Operation, source: RemoteError) -> Self {
        Error::Network { operation, source }
    }

    /// Check if this is a network failure
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network { .. })
    }

    /// The remote failure behind a network error, if any
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Error::Network { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Message suitable for showing to an editor
    ///
    /// Network failures collapse to the notice for their operation; every
    /// other error is shown as-is.
    pub fn user_message(&self) -> String {
        match self {
            Error::Network { operation, .. } => operation.user_message().to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_user_message_hides_detail() {
        let err = Error::network(
            Operation::Submit,
            RemoteError::Api("502 Bad Gateway".to_string()),
        );
        assert!(err.is_network());
        assert!(err.user_message().contains("None of your work was lost"));
        assert!(!err.user_message().contains("502"));
    }

    #[test]
    fn test_checkout_message_differs_from_submit() {
        assert_ne!(
            Operation::Checkout.user_message(),
            Operation::Submit.user_message()
        );
    }

    #[test]
    fn test_branch_conflict_still_reachable() {
        let err = Error::network(
            Operation::Submit,
            RemoteError::BranchExists("task-1".to_string()),
        );
        assert!(matches!(err.remote(), Some(RemoteError::BranchExists(_))));
    }

    #[test]
    fn test_non_network_message_passthrough() {
        let err = Error::NotAuthenticated;
        assert!(!err.is_network());
        assert_eq!(err.user_message(), "GitHub user not authenticated");
    }
}
