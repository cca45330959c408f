//! Recording in-memory host for pipeline tests

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::graph::TreeEntry;
use crate::remote::{
    GitHost, NewPullRequest, RemoteError, RemoteResult, RepoRef, RepoSummary, TreeNode,
    UserIdentity,
};
use crate::task::PullRequestStatus;

pub const ORG: &str = "friends-library";
pub const REPO: &str = "george-fox";
pub const HEAD: &str = "c1";
pub const PR_NUMBER: u64 = 42;

#[derive(Debug, Clone)]
struct Call {
    op: &'static str,
    repo: Option<RepoRef>,
    detail: String,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    fail_on: Option<&'static str>,
    refs: HashMap<String, String>,
    trees: Vec<Vec<TreeEntry>>,
    commits: Vec<(String, String)>,
    pull_requests: Vec<NewPullRequest>,
    next_commit: u32,
    status: PullRequestStatus,
    fork_created: bool,
    fork_exists: bool,
    fork_pending_polls: u32,
}

/// A [`GitHost`] double that records every call
///
/// Every call yields to the scheduler before doing anything, so concurrent
/// pipelines interleave the way they would against a real network.
#[derive(Debug)]
pub struct FakeHost {
    files: BTreeMap<String, String>,
    state: Mutex<State>,
}

impl FakeHost {
    /// Repository with `doc.adoc = "old"` at head `c1`
    pub fn new() -> Self {
        let mut files = BTreeMap::new();
        files.insert("doc.adoc".to_string(), "old".to_string());
        Self::with_files(files)
    }

    pub fn with_files(files: BTreeMap<String, String>) -> Self {
        Self {
            files,
            state: Mutex::new(State {
                next_commit: 2,
                ..Default::default()
            }),
        }
    }

    pub fn with_existing_fork(self) -> Self {
        self.lock().fork_exists = true;
        self
    }

    /// Fork missing; once created it appears after `polls` failed checks
    pub fn with_pending_fork(self, polls: u32) -> Self {
        self.lock().fork_pending_polls = polls;
        self
    }

    pub fn repo(&self) -> RepoRef {
        RepoRef::new(ORG, REPO)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Make every later call to `op` fail
    pub fn fail_on(&self, op: &'static str) {
        self.lock().fail_on = Some(op);
    }

    pub fn clear_failure(&self) {
        self.lock().fail_on = None;
    }

    pub fn set_status(&self, status: PullRequestStatus) {
        self.lock().status = status;
    }

    pub fn count(&self, op: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.op == op).count()
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.lock().calls.iter().map(|c| c.op).collect()
    }

    pub fn calls_of(&self, op: &str) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op == op)
            .map(|c| c.detail.clone())
            .collect()
    }

    pub fn repos_of(&self, op: &str) -> Vec<RepoRef> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op == op)
            .filter_map(|c| c.repo.clone())
            .collect()
    }

    pub fn branch_head(&self, branch: &str) -> Option<String> {
        self.lock().refs.get(branch).cloned()
    }

    pub fn trees(&self) -> Vec<Vec<TreeEntry>> {
        self.lock().trees.clone()
    }

    /// `(commit sha, parent sha)` pairs in creation order
    pub fn commits(&self) -> Vec<(String, String)> {
        self.lock().commits.clone()
    }

    pub fn opened_pull_requests(&self) -> Vec<NewPullRequest> {
        self.lock().pull_requests.clone()
    }

    async fn enter(
        &self,
        op: &'static str,
        repo: Option<&RepoRef>,
        detail: impl Into<String>,
    ) -> RemoteResult<()> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.push(Call {
            op,
            repo: repo.cloned(),
            detail: detail.into(),
        });
        if state.fail_on == Some(op) {
            return Err(RemoteError::Api(format!("{} failed", op)));
        }
        Ok(())
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GitHost for FakeHost {
    async fn head_sha(&self, repo: &RepoRef, branch: &str) -> RemoteResult<String> {
        self.enter("head_sha", Some(repo), branch).await?;
        Ok(self
            .branch_head(branch)
            .unwrap_or_else(|| HEAD.to_string()))
    }

    async fn default_branch(&self, repo: &RepoRef) -> RemoteResult<String> {
        self.enter("default_branch", Some(repo), "").await?;
        Ok("master".to_string())
    }

    async fn list_tree(&self, repo: &RepoRef, commit_sha: &str) -> RemoteResult<Vec<TreeNode>> {
        self.enter("list_tree", Some(repo), commit_sha).await?;
        let mut nodes: Vec<TreeNode> = self
            .files
            .keys()
            .map(|path| TreeNode {
                path: path.clone(),
                sha: format!("blob:{}", path),
                kind: "blob".to_string(),
            })
            .collect();
        nodes.push(TreeNode {
            path: "01".to_string(),
            sha: "tree:01".to_string(),
            kind: "tree".to_string(),
        });
        Ok(nodes)
    }

    async fn blob_text(&self, repo: &RepoRef, blob_sha: &str) -> RemoteResult<String> {
        self.enter("blob_text", Some(repo), blob_sha).await?;
        let path = blob_sha.trim_start_matches("blob:");
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(blob_sha.to_string()))
    }

    async fn commit_tree_sha(&self, repo: &RepoRef, commit_sha: &str) -> RemoteResult<String> {
        self.enter("commit_tree_sha", Some(repo), commit_sha).await?;
        Ok(format!("tree-of-{}", commit_sha))
    }

    async fn create_tree(
        &self,
        repo: &RepoRef,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> RemoteResult<String> {
        self.enter("create_tree", Some(repo), base_tree).await?;
        let mut state = self.lock();
        state.trees.push(entries.to_vec());
        Ok(format!("t{}", state.trees.len()))
    }

    async fn create_commit(
        &self,
        repo: &RepoRef,
        tree_sha: &str,
        parent_sha: &str,
        message: &str,
    ) -> RemoteResult<String> {
        self.enter("create_commit", Some(repo), format!("{}<-{}: {}", tree_sha, parent_sha, message))
            .await?;
        let mut state = self.lock();
        let sha = format!("c{}", state.next_commit);
        state.next_commit += 1;
        state.commits.push((sha.clone(), parent_sha.to_string()));
        Ok(sha)
    }

    async fn create_ref(&self, repo: &RepoRef, branch: &str, sha: &str) -> RemoteResult<()> {
        self.enter("create_ref", Some(repo), format!("{}@{}", branch, sha))
            .await?;
        let mut state = self.lock();
        if state.refs.contains_key(branch) {
            return Err(RemoteError::BranchExists(branch.to_string()));
        }
        state.refs.insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn update_ref(&self, repo: &RepoRef, branch: &str, sha: &str) -> RemoteResult<()> {
        self.enter("update_ref", Some(repo), format!("{}@{}", branch, sha))
            .await?;
        self.lock().refs.insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> RemoteResult<u64> {
        self.enter("create_pull_request", Some(repo), request.head.clone())
            .await?;
        self.lock().pull_requests.push(request.clone());
        Ok(PR_NUMBER)
    }

    async fn pull_request_status(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> RemoteResult<PullRequestStatus> {
        self.enter("pull_request_status", Some(repo), number.to_string())
            .await?;
        Ok(self.lock().status)
    }

    async fn current_user(&self) -> RemoteResult<UserIdentity> {
        self.enter("current_user", None, "").await?;
        Ok(UserIdentity {
            login: "editor".to_string(),
            name: Some("Ed Itor".to_string()),
            avatar_url: "https://avatars.example/editor".to_string(),
        })
    }

    async fn repository_exists(&self, repo: &RepoRef) -> RemoteResult<bool> {
        self.enter("repository_exists", Some(repo), "").await?;
        if repo.owner == ORG {
            return Ok(true);
        }
        let mut state = self.lock();
        if state.fork_exists {
            return Ok(true);
        }
        if !state.fork_created {
            return Ok(false);
        }
        if state.fork_pending_polls > 0 {
            state.fork_pending_polls -= 1;
            return Ok(false);
        }
        state.fork_exists = true;
        Ok(true)
    }

    async fn create_fork(&self, upstream: &RepoRef) -> RemoteResult<()> {
        self.enter("create_fork", Some(upstream), "").await?;
        self.lock().fork_created = true;
        Ok(())
    }

    async fn list_org_repos(&self, org: &str) -> RemoteResult<Vec<RepoSummary>> {
        self.enter("list_org_repos", None, org).await?;
        Ok(vec![
            RepoSummary {
                id: 1,
                name: ORG.to_string(),
                description: None,
            },
            RepoSummary {
                id: 2,
                name: REPO.to_string(),
                description: Some("📖 George Fox (1624 - 1691)".to_string()),
            },
            RepoSummary {
                id: 3,
                name: "william-penn".to_string(),
                description: Some("📖 William Penn (1644 - 1718)".to_string()),
            },
        ])
    }

    async fn list_directory(&self, repo: &RepoRef, path: &str) -> RemoteResult<Vec<String>> {
        self.enter("list_directory", Some(repo), path).await?;
        Ok(vec![format!("{}.yml", REPO), "README.md".to_string()])
    }

    async fn document_titles(&self, repo: &RepoRef) -> RemoteResult<BTreeMap<String, String>> {
        self.enter("document_titles", Some(repo), "").await?;
        let mut titles = BTreeMap::new();
        titles.insert("journal".to_string(), "The Journal of George Fox".to_string());
        Ok(titles)
    }
}
