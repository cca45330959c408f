//! [`GitHost`] over the GitHub REST API

use std::collections::BTreeMap;

use async_trait::async_trait;
use quire_core::graph::TreeEntry;
use quire_core::remote::{NewPullRequest, RepoSummary, TreeNode};
use quire_core::{GitHost, PullRequestStatus, RemoteError, RemoteResult, RepoRef, UserIdentity};

use crate::GitHubClient;

#[async_trait]
impl GitHost for GitHubClient {
    async fn head_sha(&self, repo: &RepoRef, branch: &str) -> RemoteResult<String> {
        Ok(self.get_branch_head(repo, branch).await?)
    }

    async fn default_branch(&self, repo: &RepoRef) -> RemoteResult<String> {
        Ok(self.get_default_branch(repo).await?)
    }

    async fn list_tree(&self, repo: &RepoRef, commit_sha: &str) -> RemoteResult<Vec<TreeNode>> {
        Ok(self.get_tree_recursive(repo, commit_sha).await?)
    }

    async fn blob_text(&self, repo: &RepoRef, blob_sha: &str) -> RemoteResult<String> {
        Ok(self.get_blob_text(repo, blob_sha).await?)
    }

    async fn commit_tree_sha(&self, repo: &RepoRef, commit_sha: &str) -> RemoteResult<String> {
        Ok(self.get_commit_tree(repo, commit_sha).await?)
    }

    async fn create_tree(
        &self,
        repo: &RepoRef,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> RemoteResult<String> {
        Ok(self.post_tree(repo, base_tree, entries).await?)
    }

    async fn create_commit(
        &self,
        repo: &RepoRef,
        tree_sha: &str,
        parent_sha: &str,
        message: &str,
    ) -> RemoteResult<String> {
        Ok(self.post_commit(repo, tree_sha, parent_sha, message).await?)
    }

    async fn create_ref(&self, repo: &RepoRef, branch: &str, sha: &str) -> RemoteResult<()> {
        Ok(self.post_branch(repo, branch, sha).await?)
    }

    async fn update_ref(&self, repo: &RepoRef, branch: &str, sha: &str) -> RemoteResult<()> {
        Ok(self.patch_branch(repo, branch, sha).await?)
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> RemoteResult<u64> {
        Ok(self.open_pr(repo, request).await?)
    }

    async fn pull_request_status(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> RemoteResult<PullRequestStatus> {
        Ok(self.get_pr_status(repo, number).await?)
    }

    async fn current_user(&self) -> RemoteResult<UserIdentity> {
        Ok(self.get_current_user().await?)
    }

    async fn repository_exists(&self, repo: &RepoRef) -> RemoteResult<bool> {
        Ok(self.repo_exists(repo).await?)
    }

    async fn create_fork(&self, upstream: &RepoRef) -> RemoteResult<()> {
        Ok(self.request_fork(upstream).await?)
    }

    async fn list_org_repos(&self, org: &str) -> RemoteResult<Vec<RepoSummary>> {
        Ok(self.get_org_repos(org).await?)
    }

    async fn list_directory(&self, repo: &RepoRef, path: &str) -> RemoteResult<Vec<String>> {
        Ok(self.get_directory(repo, path).await?)
    }

    async fn document_titles(&self, repo: &RepoRef) -> RemoteResult<BTreeMap<String, String>> {
        self.get_document_titles(repo).await.map_err(RemoteError::from)
    }
}
