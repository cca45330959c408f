//! Task branch creation and head updates

use tracing::{debug, info};

use crate::remote::{GitHost, RemoteResult, RepoRef};

/// Guarantees a task's branch exists and points at the right commit
pub struct BranchCoordinator<'a, H: GitHost + ?Sized> {
    host: &'a H,
}

impl<'a, H: GitHost + ?Sized> BranchCoordinator<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self { host }
    }

    /// Create `refs/heads/<branch>` at `parent_sha`
    ///
    /// Fails if the ref already exists; nothing is retried here.
    pub async fn ensure_branch(
        &self,
        repo: &RepoRef,
        branch: &str,
        parent_sha: &str,
    ) -> RemoteResult<()> {
        debug!(repo = %repo, branch, parent = parent_sha, "Creating branch");
        self.host.create_ref(repo, branch, parent_sha).await?;
        info!(repo = %repo, branch, "Created branch");
        Ok(())
    }

    /// Move the branch head to `commit_sha`
    pub async fn update_head(
        &self,
        repo: &RepoRef,
        branch: &str,
        commit_sha: &str,
    ) -> RemoteResult<()> {
        debug!(repo = %repo, branch, commit = commit_sha, "Updating branch head");
        self.host.update_ref(repo, branch, commit_sha).await?;
        info!(repo = %repo, branch, commit = commit_sha, "Branch head updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use crate::testing::FakeHost;

    #[tokio::test]
    async fn test_ensure_branch_creates_ref_at_parent() {
        let host = FakeHost::new();
        let repo = host.repo();
        let branches = BranchCoordinator::new(&host);

        branches.ensure_branch(&repo, "task-1", "c1").await.unwrap();
        assert_eq!(host.calls_of("create_ref"), vec!["task-1@c1".to_string()]);
    }

    #[tokio::test]
    async fn test_existing_branch_rejected() {
        let host = FakeHost::new();
        let repo = host.repo();
        let branches = BranchCoordinator::new(&host);

        branches.ensure_branch(&repo, "task-1", "c1").await.unwrap();
        let err = branches.ensure_branch(&repo, "task-1", "c1").await.unwrap_err();
        assert_eq!(err, RemoteError::BranchExists("task-1".to_string()));
    }

    #[tokio::test]
    async fn test_update_head_moves_ref() {
        let host = FakeHost::new();
        let repo = host.repo();
        let branches = BranchCoordinator::new(&host);

        branches.ensure_branch(&repo, "task-1", "c1").await.unwrap();
        branches.update_head(&repo, "task-1", "c2").await.unwrap();
        assert_eq!(host.branch_head("task-1").as_deref(), Some("c2"));
    }
}
