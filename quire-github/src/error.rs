//! Error types for GitHub operations

use quire_core::RemoteError;
use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub API error
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Raw content fetch failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// The addressed object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A ref with this name already exists
    #[error("Branch already exists: {0}")]
    BranchExists(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Check if GitHub answered with "Not Found"
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Api(e) => api_message(e).is_some_and(|m| m.contains("Not Found")),
            _ => false,
        }
    }
}

/// Message GitHub attached to a rejected request
pub(crate) fn api_message(err: &octocrab::Error) -> Option<&str> {
    match err {
        octocrab::Error::GitHub { source, .. } => Some(source.message.as_str()),
        _ => None,
    }
}

/// Map an API failure on `what`, separating missing objects from the rest
pub(crate) fn classify(err: octocrab::Error, what: impl Into<String>) -> Error {
    match api_message(&err) {
        Some(m) if m.contains("Not Found") => Error::NotFound(what.into()),
        _ => Error::Api(err),
    }
}

impl From<Error> for RemoteError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(what) => RemoteError::NotFound(what),
            Error::BranchExists(branch) => RemoteError::BranchExists(branch),
            Error::Parse(msg) => RemoteError::Malformed(msg),
            other => RemoteError::Api(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_mapping() {
        assert_eq!(
            RemoteError::from(Error::NotFound("refs/heads/x".to_string())),
            RemoteError::NotFound("refs/heads/x".to_string())
        );
        assert_eq!(
            RemoteError::from(Error::BranchExists("task-1".to_string())),
            RemoteError::BranchExists("task-1".to_string())
        );
        assert_eq!(
            RemoteError::from(Error::Parse("missing sha".to_string())),
            RemoteError::Malformed("missing sha".to_string())
        );
        assert!(matches!(
            RemoteError::from(Error::Auth("bad".to_string())),
            RemoteError::Api(_)
        ));
    }

    #[test]
    fn test_not_found_detection() {
        assert!(Error::NotFound("x".to_string()).is_not_found());
        assert!(!Error::Parse("x".to_string()).is_not_found());
    }
}
