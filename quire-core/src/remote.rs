//! The hosting-service seam
//!
//! Every remote call the pipeline makes goes through [`GitHost`]. The
//! trait mirrors the git-data and pull-request routes of the hosting API
//! one-to-one; it performs no retries and no interpretation, so failures
//! propagate to whoever sequenced the call.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::TreeEntry;
use crate::task::PullRequestStatus;

/// Result type for remote calls
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Failures reported by a [`GitHost`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The API rejected the call or the transport failed
    #[error("API error: {0}")]
    Api(String),

    /// The addressed object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A ref with this name already exists
    #[error("Branch already exists: {0}")]
    BranchExists(String),

    /// A response lacked a field the pipeline depends on
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// A polled condition did not become true in time
    #[error("Gave up waiting for fork {repo} after {attempts} attempts ({waited:?})")]
    ForkTimeout {
        repo: String,
        attempts: u32,
        waited: Duration,
    },
}

/// A repository addressed by owner and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// The same repository name under another owner (a fork)
    pub fn with_owner(&self, owner: impl Into<String>) -> Self {
        Self::new(owner, self.name.clone())
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One node of a recursive tree listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub path: String,
    pub sha: String,
    /// `blob`, `tree`, or `commit`
    #[serde(rename = "type")]
    pub kind: String,
}

impl TreeNode {
    /// Check if this node is a blob whose path ends with `.<extension>`
    pub fn is_blob_with_extension(&self, extension: &str) -> bool {
        self.kind == "blob"
            && self
                .path
                .rsplit_once('.')
                .is_some_and(|(_, ext)| ext == extension)
    }
}

/// Payload for opening a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    /// Head ref, `branch` or `owner:branch` for forks
    pub head: String,
    pub base: String,
    pub body: String,
    pub maintainer_can_modify: bool,
}

/// Identity of the authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: String,
}

/// Summary of an organization repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
}

/// Authenticated transport to the hosting API
#[async_trait]
pub trait GitHost: Send + Sync {
    /// Head commit sha of `refs/heads/<branch>`
    async fn head_sha(&self, repo: &RepoRef, branch: &str) -> RemoteResult<String>;

    /// The repository's default branch name
    async fn default_branch(&self, repo: &RepoRef) -> RemoteResult<String>;

    /// Recursive tree listing at a commit
    async fn list_tree(&self, repo: &RepoRef, commit_sha: &str) -> RemoteResult<Vec<TreeNode>>;

    /// Blob content decoded to text
    async fn blob_text(&self, repo: &RepoRef, blob_sha: &str) -> RemoteResult<String>;

    /// Tree sha a commit points at
    async fn commit_tree_sha(&self, repo: &RepoRef, commit_sha: &str) -> RemoteResult<String>;

    /// Create a tree overlaying `entries` on `base_tree`, returning its sha
    async fn create_tree(
        &self,
        repo: &RepoRef,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> RemoteResult<String>;

    /// Create a single-parent commit, returning its sha
    async fn create_commit(
        &self,
        repo: &RepoRef,
        tree_sha: &str,
        parent_sha: &str,
        message: &str,
    ) -> RemoteResult<String>;

    /// Create `refs/heads/<branch>` at `sha`; fails if it exists
    async fn create_ref(&self, repo: &RepoRef, branch: &str, sha: &str) -> RemoteResult<()>;

    /// Force-move `refs/heads/<branch>` to `sha`
    async fn update_ref(&self, repo: &RepoRef, branch: &str, sha: &str) -> RemoteResult<()>;

    /// Open a pull request, returning its number
    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> RemoteResult<u64>;

    /// Lifecycle status of a pull request
    async fn pull_request_status(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> RemoteResult<PullRequestStatus>;

    /// The authenticated user
    async fn current_user(&self) -> RemoteResult<UserIdentity>;

    /// Whether the repository can be queried
    async fn repository_exists(&self, repo: &RepoRef) -> RemoteResult<bool>;

    /// Ask the host to fork `upstream` into the authenticated user's account
    async fn create_fork(&self, upstream: &RepoRef) -> RemoteResult<()>;

    /// All repositories of an organization
    async fn list_org_repos(&self, org: &str) -> RemoteResult<Vec<RepoSummary>>;

    /// File names directly under `path` in `repo` on its default branch
    async fn list_directory(&self, repo: &RepoRef, path: &str) -> RemoteResult<Vec<String>>;

    /// Document slug to title map for a repository, from the catalog
    async fn document_titles(&self, repo: &RepoRef) -> RemoteResult<BTreeMap<String, String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_node_extension_filter() {
        let node = |path: &str, kind: &str| TreeNode {
            path: path.to_string(),
            sha: "s".to_string(),
            kind: kind.to_string(),
        };
        assert!(node("01/chapter-1.adoc", "blob").is_blob_with_extension("adoc"));
        assert!(!node("01/chapter-1.adoc", "tree").is_blob_with_extension("adoc"));
        assert!(!node("README.md", "blob").is_blob_with_extension("adoc"));
        assert!(!node("adoc", "blob").is_blob_with_extension("adoc"));
    }

    #[test]
    fn test_repo_ref_display_and_fork() {
        let upstream = RepoRef::new("friends-library", "george-fox");
        assert_eq!(upstream.to_string(), "friends-library/george-fox");
        assert_eq!(
            upstream.with_owner("jane").to_string(),
            "jane/george-fox"
        );
    }
}
