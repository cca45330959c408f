//! Tree and commit payloads computed from a task's files
//!
//! Everything here is pure: the same files always yield the same payload,
//! and inputs are never mutated. Remote shas are assigned later by the host.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::{File, Task};

/// File mode for a regular, non-executable blob
pub const BLOB_MODE: &str = "100644";

/// Object type for file entries
pub const BLOB_TYPE: &str = "blob";

/// Prefix shared by every task branch
pub const BRANCH_PREFIX: &str = "task-";

/// One entry of a sparse tree overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl TreeEntry {
    /// A regular-file blob entry with inline content
    pub fn blob(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: BLOB_MODE.to_string(),
            kind: BLOB_TYPE.to_string(),
            content: content.into(),
        }
    }
}

/// Branch name for a task; branch and task identity move in lockstep
pub fn branch_name(task_id: &Uuid) -> String {
    format!("{}{}", BRANCH_PREFIX, task_id)
}

/// Overlay entries for every file with a committable edit
///
/// Files without a qualifying edit are left out entirely: the overlay is
/// applied on top of the parent commit's tree, so omitted paths keep their
/// current blobs.
pub fn build_tree_entries(files: &BTreeMap<String, File>) -> Vec<TreeEntry> {
    files
        .values()
        .filter(|f| f.is_eligible())
        .filter_map(|f| f.edited_text().map(|text| TreeEntry::blob(&f.path, text)))
        .collect()
}

/// Commit message for the first submission of a task
pub fn submit_message(task: &Task) -> String {
    task.name.clone()
}

/// Commit message for follow-up commits on an existing pull request
pub fn resubmit_message(task: &Task) -> String {
    format!("updates to task: {}", task.name)
}
