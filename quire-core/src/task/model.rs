//! Task and file records

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph;
use crate::workflow::TaskPhase;
use crate::{Error, Result};

/// Lifecycle status of a pull request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestStatus {
    #[default]
    Open,
    Merged,
    Closed,
}

impl PullRequestStatus {
    /// Derive status from the merge and close timestamps of a pull request
    ///
    /// A merged pull request is also closed, so the merge timestamp wins.
    pub fn from_timestamps(
        merged_at: Option<DateTime<Utc>>,
        closed_at: Option<DateTime<Utc>>,
    ) -> Self {
        if merged_at.is_some() {
            PullRequestStatus::Merged
        } else if closed_at.is_some() {
            PullRequestStatus::Closed
        } else {
            PullRequestStatus::Open
        }
    }

    /// Whether review has ended, one way or the other
    pub fn is_finished(&self) -> bool {
        matches!(self, PullRequestStatus::Merged | PullRequestStatus::Closed)
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PullRequestStatus::Open => write!(f, "open"),
            PullRequestStatus::Merged => write!(f, "merged"),
            PullRequestStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Pull request opened for a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    #[serde(default)]
    pub status: PullRequestStatus,
}

impl PullRequestRef {
    pub fn open(number: u64) -> Self {
        Self {
            number,
            status: PullRequestStatus::Open,
        }
    }
}

/// One tracked document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Path within the repository, unique within a task
    pub path: String,
    /// Blob sha of the last-synced remote content
    pub sha: String,
    /// Last-synced remote content
    pub content: String,
    /// Local edit, `None` when the file is untouched
    pub edited_content: Option<String>,
}

impl File {
    pub fn new(path: impl Into<String>, sha: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sha: sha.into(),
            content: content.into(),
            edited_content: None,
        }
    }

    pub fn with_edit(mut self, edited: impl Into<String>) -> Self {
        self.edited_content = Some(edited.into());
        self
    }

    /// Edited text if it is present, non-empty, and not the literal `"null"`
    ///
    /// The literal shows up when an absent edit was stringified somewhere
    /// upstream; it is never real document content.
    pub fn edited_text(&self) -> Option<&str> {
        match self.edited_content.as_deref() {
            None | Some("") | Some("null") => None,
            Some(text) => Some(text),
        }
    }

    /// Whether this file belongs in the next commit
    pub fn is_eligible(&self) -> bool {
        self.edited_text().is_some_and(|text| text != self.content)
    }
}

/// The unit of work an editor submits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable across resubmissions; replaced only on recovery
    pub id: Uuid,
    pub name: String,
    /// Repository name within the configured organization
    pub repo: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub phase: TaskPhase,
    /// Branch pull requests target, recorded at checkout
    #[serde(default)]
    pub base_branch: Option<String>,
    /// Commit the task's edits are based on
    #[serde(default)]
    pub parent_commit: Option<String>,
    #[serde(default)]
    pub pull_request: Option<PullRequestRef>,
    #[serde(default)]
    pub document_titles: BTreeMap<String, String>,
    #[serde(default)]
    pub files: BTreeMap<String, File>,
}

impl Task {
    /// Create an empty task awaiting checkout
    pub fn new(name: impl Into<String>, repo: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            repo: repo.into(),
            created: now,
            updated: now,
            phase: TaskPhase::Idle,
            base_branch: None,
            parent_commit: None,
            pull_request: None,
            document_titles: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    /// Name of the remote branch carrying this task's commits
    pub fn branch_name(&self) -> String {
        graph::branch_name(&self.id)
    }

    /// Whether any file carries a committable edit
    pub fn has_work(&self) -> bool {
        self.files.values().any(File::is_eligible)
    }

    /// Paths of files carrying committable edits
    pub fn edited_paths(&self) -> Vec<&str> {
        self.files
            .values()
            .filter(|f| f.is_eligible())
            .map(|f| f.path.as_str())
            .collect()
    }

    /// Record a local edit of one file
    pub fn edit(&mut self, path: &str, content: impl Into<String>) -> Result<()> {
        let file = self
            .files
            .get_mut(path)
            .ok_or_else(|| Error::FileNotFound {
                task: self.id,
                path: path.to_string(),
            })?;
        file.edited_content = Some(content.into());
        self.touch();
        Ok(())
    }

    /// Drop a local edit, restoring the synced content
    pub fn revert(&mut self, path: &str) -> Result<()> {
        let file = self
            .files
            .get_mut(path)
            .ok_or_else(|| Error::FileNotFound {
                task: self.id,
                path: path.to_string(),
            })?;
        file.edited_content = None;
        self.touch();
        Ok(())
    }

    /// A pristine copy under a new identity, keeping the file contents
    ///
    /// Parent commit, pull request and base branch are cleared so the copy
    /// starts its workflow over from checkout.
    pub fn reinitialized(&self, new_id: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: new_id,
            name: self.name.clone(),
            repo: self.repo.clone(),
            created: now,
            updated: now,
            phase: TaskPhase::Idle,
            base_branch: None,
            parent_commit: None,
            pull_request: None,
            document_titles: self.document_titles.clone(),
            files: self.files.clone(),
        }
    }

    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }
}
