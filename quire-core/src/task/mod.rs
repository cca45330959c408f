//! Tasks: named units of edits against one repository

mod model;
mod store;

pub use model::{File, PullRequestRef, PullRequestStatus, Task};
pub use store::TaskStore;
