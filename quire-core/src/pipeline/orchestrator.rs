//! Sequencing of checkout, submit, resubmit and recovery for tasks
//!
//! Every operation follows the same shape: check local preconditions,
//! run the remote steps against a scratch copy of the task, and copy the
//! results back (and persist them) only when every step succeeded. A remote
//! failure anywhere is reported once, as [`Error::Network`], and leaves the
//! task exactly as it was.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{BranchCoordinator, ForkSynchronizer, PullRequestGateway, RetryPolicy};
use crate::catalog::{self, EditableRepo};
use crate::config::Config;
use crate::error::{Error, Operation, Result};
use crate::graph::{self, TreeEntry};
use crate::lint::{self, AsciidocNormalizer, BlockValidator, Normalizer, Validator};
use crate::remote::{GitHost, RemoteError, RemoteResult, RepoRef, UserIdentity};
use crate::task::{File, PullRequestRef, PullRequestStatus, Task, TaskStore};
use crate::workflow::{TaskLifecycle, TaskPhase, Workflow};

/// Branch used when neither config nor the host names one
const FALLBACK_BASE_BRANCH: &str = "master";

/// What a first submission produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub branch: String,
    pub commit: String,
    pub pull_request: u64,
    /// Paths whose edits the normalizer rewrote
    pub fixed_paths: Vec<String>,
}

/// Remote snapshot fetched during checkout
struct Snapshot {
    base_branch: String,
    head: String,
    files: BTreeMap<String, File>,
    document_titles: BTreeMap<String, String>,
}

/// Removes a task id from the in-flight set when dropped
struct InFlight<'a> {
    set: &'a Mutex<HashSet<Uuid>>,
    id: Uuid,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

/// Drives tasks through the submission pipeline
pub struct SubmissionOrchestrator<H: GitHost> {
    host: H,
    store: TaskStore,
    config: Config,
    user: Option<UserIdentity>,
    normalizer: Box<dyn Normalizer>,
    validator: Box<dyn Validator>,
    in_flight: Mutex<HashSet<Uuid>>,
}

impl<H: GitHost> SubmissionOrchestrator<H> {
    pub fn new(host: H, store: TaskStore, config: Config) -> Self {
        Self {
            host,
            store,
            config,
            user: None,
            normalizer: Box::new(AsciidocNormalizer),
            validator: Box::new(BlockValidator),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_normalizer(mut self, normalizer: impl Normalizer + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn with_user(mut self, user: UserIdentity) -> Self {
        self.authenticate(user);
        self
    }

    /// Set the identity submissions are made as
    pub fn authenticate(&mut self, user: UserIdentity) {
        info!(login = %user.login, "Authenticated");
        self.user = Some(user);
    }

    pub fn sign_out(&mut self) {
        self.user = None;
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Repository a task addresses
    pub fn repo_for(&self, task: &Task) -> RepoRef {
        RepoRef::new(&self.config.github.org, &task.repo)
    }

    /// Create and store an empty task awaiting checkout
    pub fn create_task(&self, name: &str, repo: &str) -> Result<Task> {
        let task = Task::new(name, repo);
        self.store.save(&task)?;
        info!(task = %task.id, repo, "Created task");
        Ok(task)
    }

    /// Remove a task locally
    ///
    /// The remote branch and pull request are left alone for reviewers to
    /// close by hand.
    pub fn delete_task(&self, id: &Uuid) -> Result<TaskPhase> {
        let task = self.store.load(id)?;
        let mut lifecycle = TaskLifecycle::new(task.id, task.phase);
        lifecycle.transition_to(TaskPhase::Deleted)?;
        self.store.delete(id)?;
        info!(task = %id, "Deleted task");
        Ok(lifecycle.phase())
    }

    /// Repositories the configured organization lists as editable
    pub async fn editable_repos(&self) -> Result<Vec<EditableRepo>> {
        catalog::fetch_editable_repos(&self.host, &self.config.github)
            .await
            .map_err(|e| self.abandon(Operation::Checkout, None, e))
    }

    /// Fetch the repository's current head and documents into the task
    ///
    /// Local edits survive for paths that still exist, as long as they
    /// still differ from the fetched content.
    pub async fn checkout(&self, task: &mut Task) -> Result<()> {
        let mut lifecycle = TaskLifecycle::new(task.id, task.phase);
        lifecycle.transition_to(TaskPhase::CheckingOut)?;
        let _guard = self.begin(task.id)?;

        let repo = self.repo_for(task);
        let snapshot = self
            .fetch_snapshot(&repo)
            .await
            .map_err(|e| self.abandon(Operation::Checkout, Some(&lifecycle), e))?;

        lifecycle.transition_to(TaskPhase::Ready)?;

        let mut updated = task.clone();
        updated.files = carry_edits(&task.files, snapshot.files);
        updated.base_branch = Some(snapshot.base_branch);
        updated.parent_commit = Some(snapshot.head);
        updated.document_titles = snapshot.document_titles;
        updated.phase = lifecycle.phase();
        updated.touch();
        self.commit_task(task, updated)?;

        info!(
            task = %task.id,
            repo = %repo,
            files = task.files.len(),
            parent = task.parent_commit.as_deref().unwrap_or_default(),
            "Checked out task"
        );
        Ok(())
    }

    /// First submission: branch, tree, commit, head update, pull request
    pub async fn submit(&self, task: &mut Task) -> Result<SubmitOutcome> {
        let user = self.user.as_ref().ok_or(Error::NotAuthenticated)?;
        if task.pull_request.is_some() {
            return Err(Error::AlreadySubmitted(task.id));
        }
        let parent = task
            .parent_commit
            .clone()
            .ok_or(Error::NotCheckedOut(task.id))?;

        let mut lifecycle = TaskLifecycle::new(task.id, task.phase);
        lifecycle.transition_to(TaskPhase::Submitting)?;
        let _guard = self.begin(task.id)?;

        let (files, fixed_paths) = self.prepare_files(task)?;
        let entries = graph::build_tree_entries(&files);
        let repo = self.repo_for(task);
        let branch = task.branch_name();
        let message = graph::submit_message(task);
        let (id, title) = (task.id, task.name.clone());
        let recorded_base = task.base_branch.clone();

        let result: RemoteResult<(String, u64)> = async {
            // branches live in the org repository, not a fork; the lint
            // check integration has no permission to report on forks
            let branches = BranchCoordinator::new(&self.host);
            match branches.ensure_branch(&repo, &branch, &parent).await {
                // left behind by an earlier attempt of this same task; the
                // head update below moves it to the new commit
                Err(RemoteError::BranchExists(_)) => {
                    info!(task = %id, branch = %branch, "Reusing branch from earlier attempt");
                }
                other => other?,
            }

            let commit = self.write_commit(&repo, &parent, &entries, &message).await?;
            branches.update_head(&repo, &branch, &commit).await?;

            let base = self.resolve_base(recorded_base.as_deref(), &repo).await?;
            let gateway = PullRequestGateway::new(&self.host, &self.config.pull_request);
            let number = gateway
                .open_pull_request(&repo, &branch, &base, &title, &user.login)
                .await?;
            Ok((commit, number))
        }
        .await;

        let (commit, number) =
            result.map_err(|e| self.abandon(Operation::Submit, Some(&lifecycle), e))?;

        lifecycle.transition_to(TaskPhase::Submitted)?;

        let mut updated = task.clone();
        updated.files = files;
        updated.parent_commit = Some(commit.clone());
        updated.pull_request = Some(PullRequestRef::open(number));
        updated.phase = lifecycle.phase();
        updated.touch();
        self.commit_task(task, updated)?;

        info!(task = %task.id, branch = %branch, commit = %commit, pr = number, "Submitted task");
        Ok(SubmitOutcome {
            branch,
            commit,
            pull_request: number,
            fixed_paths,
        })
    }

    /// Follow-up commit on the existing branch; returns the new commit sha
    ///
    /// The existing pull request tracks the branch, so no new one is opened.
    pub async fn resubmit(&self, task: &mut Task) -> Result<String> {
        if self.user.is_none() {
            return Err(Error::NotAuthenticated);
        }
        if task.pull_request.is_none() {
            return Err(Error::NotSubmitted(task.id));
        }
        let parent = task
            .parent_commit
            .clone()
            .ok_or(Error::NotCheckedOut(task.id))?;

        let mut lifecycle = TaskLifecycle::new(task.id, task.phase);
        lifecycle.transition_to(TaskPhase::ReSubmitting)?;
        let _guard = self.begin(task.id)?;

        let (files, _) = self.prepare_files(task)?;
        let entries = graph::build_tree_entries(&files);
        let repo = self.repo_for(task);
        let branch = task.branch_name();
        let message = graph::resubmit_message(task);

        let result: RemoteResult<String> = async {
            let commit = self.write_commit(&repo, &parent, &entries, &message).await?;
            BranchCoordinator::new(&self.host)
                .update_head(&repo, &branch, &commit)
                .await?;
            Ok(commit)
        }
        .await;

        let commit = result.map_err(|e| self.abandon(Operation::Submit, Some(&lifecycle), e))?;

        lifecycle.transition_to(TaskPhase::ReSubmitted)?;

        let mut updated = task.clone();
        updated.files = files;
        updated.parent_commit = Some(commit.clone());
        updated.phase = lifecycle.phase();
        updated.touch();
        self.commit_task(task, updated)?;

        info!(task = %task.id, branch = %branch, commit = %commit, "Re-submitted task");
        Ok(commit)
    }

    /// Submit or resubmit, whichever the task is ready for
    pub async fn publish(&self, task: &mut Task) -> Result<String> {
        if task.pull_request.is_some() {
            self.resubmit(task).await
        } else {
            self.submit(task).await.map(|outcome| outcome.commit)
        }
    }

    /// Read the pull request's review outcome onto the task
    pub async fn refresh_pull_request(&self, task: &mut Task) -> Result<PullRequestStatus> {
        let number = task
            .pull_request
            .as_ref()
            .map(|pr| pr.number)
            .ok_or(Error::NotSubmitted(task.id))?;

        let lifecycle = TaskLifecycle::new(task.id, task.phase);
        let repo = self.repo_for(task);
        let status = PullRequestGateway::new(&self.host, &self.config.pull_request)
            .status(&repo, number)
            .await
            .map_err(|e| self.abandon(Operation::Refresh, Some(&lifecycle), e))?;

        let mut updated = task.clone();
        updated.pull_request = Some(PullRequestRef { number, status });
        if task.pull_request.as_ref().map(|pr| pr.status) != Some(status) {
            updated.touch();
        }
        self.commit_task(task, updated)?;
        Ok(status)
    }

    /// Replace a task whose pull request has shipped with a pristine copy
    ///
    /// The copy gets a new id (and so a new branch), no parent commit and
    /// no pull request, but keeps the file contents.
    pub fn recover(&self, task: &Task) -> Result<Task> {
        let finished = task
            .pull_request
            .as_ref()
            .is_some_and(|pr| pr.status.is_finished());
        if !finished {
            return Err(Error::NotRecoverable(task.id));
        }

        let mut lifecycle = TaskLifecycle::new(task.id, task.phase);
        lifecycle.transition_to(TaskPhase::Recovering)?;

        let fresh = task.reinitialized(Uuid::new_v4());
        self.store.save(&fresh)?;
        if let Err(e) = self.store.delete(&task.id) {
            // the old task file may never have been stored
            debug!(task = %task.id, error = %e, "No stored copy of recovered task");
        }

        info!(old = %task.id, new = %fresh.id, "Recovered task");
        Ok(fresh)
    }

    /// Sync the authenticated user's fork of a task repository
    pub async fn sync_fork(&self, repo: &str) -> Result<RepoRef> {
        let user = self.user.as_ref().ok_or(Error::NotAuthenticated)?;
        let upstream = RepoRef::new(&self.config.github.org, repo);
        let policy = RetryPolicy::from(self.config.fork);

        let result: RemoteResult<RepoRef> = async {
            let branch = match &self.config.github.base_branch {
                Some(branch) => branch.clone(),
                None => self.host.default_branch(&upstream).await?,
            };
            ForkSynchronizer::new(&self.host, policy)
                .ensure_synced_fork(&upstream, &user.login, &branch)
                .await
        }
        .await;

        result.map_err(|e| self.abandon(Operation::Checkout, None, e))
    }

    fn begin(&self, id: Uuid) -> Result<InFlight<'_>> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(id) {
            warn!(task = %id, "Rejected overlapping operation");
            return Err(Error::SubmissionInProgress(id));
        }
        Ok(InFlight {
            set: &self.in_flight,
            id,
        })
    }

    /// Normalize edited files and run diagnostics; refuses empty submissions
    fn prepare_files(&self, task: &Task) -> Result<(BTreeMap<String, File>, Vec<String>)> {
        let (files, fixed_paths) = lint::apply_fixes(&task.files, self.normalizer.as_ref());

        for file in files.values().filter(|f| f.is_eligible()) {
            let Some(text) = file.edited_text() else {
                continue;
            };
            for diag in self.validator.validate(text) {
                warn!(path = %file.path, line = diag.line, message = %diag.message, "Document diagnostic");
            }
        }

        if !files.values().any(File::is_eligible) {
            return Err(Error::NoChanges(task.id));
        }
        Ok((files, fixed_paths))
    }

    async fn fetch_snapshot(&self, repo: &RepoRef) -> RemoteResult<Snapshot> {
        let base_branch = match &self.config.github.base_branch {
            Some(branch) => branch.clone(),
            None => self.host.default_branch(repo).await?,
        };
        let head = self.host.head_sha(repo, &base_branch).await?;

        let extension = &self.config.github.file_extension;
        let mut files = BTreeMap::new();
        for node in self.host.list_tree(repo, &head).await? {
            if !node.is_blob_with_extension(extension) {
                continue;
            }
            let content = self.host.blob_text(repo, &node.sha).await?;
            files.insert(node.path.clone(), File::new(node.path, node.sha, content));
        }
        debug!(repo = %repo, head = %head, count = files.len(), "Fetched documents");

        let document_titles = self.host.document_titles(repo).await?;

        Ok(Snapshot {
            base_branch,
            head,
            files,
            document_titles,
        })
    }

    /// Write tree and commit objects on top of `parent`
    ///
    /// The branch is not touched; a commit left unreferenced by a later
    /// failure is collected by the host.
    async fn write_commit(
        &self,
        repo: &RepoRef,
        parent: &str,
        entries: &[TreeEntry],
        message: &str,
    ) -> RemoteResult<String> {
        let base_tree = self.host.commit_tree_sha(repo, parent).await?;
        let tree = self.host.create_tree(repo, &base_tree, entries).await?;
        let commit = self.host.create_commit(repo, &tree, parent, message).await?;
        debug!(repo = %repo, tree = %tree, commit = %commit, entries = entries.len(), "Wrote commit");
        Ok(commit)
    }

    /// Base branch for the pull request: recorded at checkout, else config, else the host default
    async fn resolve_base(&self, recorded: Option<&str>, repo: &RepoRef) -> RemoteResult<String> {
        if let Some(branch) = recorded.or(self.config.github.base_branch.as_deref()) {
            return Ok(branch.to_string());
        }
        match self.host.default_branch(repo).await {
            Ok(branch) => Ok(branch),
            Err(RemoteError::NotFound(_)) => Ok(FALLBACK_BASE_BRANCH.to_string()),
            Err(e) => Err(e),
        }
    }

    /// Persist `updated`, then make it the caller's task
    fn commit_task(&self, task: &mut Task, updated: Task) -> Result<()> {
        self.store.save(&updated)?;
        *task = updated;
        Ok(())
    }

    fn abandon(
        &self,
        operation: Operation,
        lifecycle: Option<&TaskLifecycle>,
        source: RemoteError,
    ) -> Error {
        match lifecycle {
            Some(lc) => warn!(
                task = %lc.task_id(),
                %operation,
                phases = %lc.path(),
                error = %source,
                "Abandoned operation"
            ),
            None => warn!(%operation, error = %source, "Abandoned operation"),
        }
        Error::network(operation, source)
    }
}

/// Fresh snapshot files with still-relevant local edits carried over
fn carry_edits(
    previous: &BTreeMap<String, File>,
    fetched: BTreeMap<String, File>,
) -> BTreeMap<String, File> {
    fetched
        .into_iter()
        .map(|(path, mut file)| {
            let kept = previous
                .get(&path)
                .and_then(|old| old.edited_text())
                .filter(|edit| *edit != file.content)
                .map(str::to_string);
            file.edited_content = kept;
            (path, file)
        })
        .collect()
}
