//! Phases a task moves through from checkout to review outcome

use serde::{Deserialize, Serialize};

/// The phase of a task
///
/// Only the settled phases (`Idle`, `Ready`, `Submitted`, `ReSubmitted`) are
/// ever persisted; the others exist only while an operation is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPhase {
    /// Created, no snapshot fetched yet
    #[default]
    Idle,
    /// Fetching the remote snapshot
    CheckingOut,
    /// Snapshot fetched, editable, never submitted
    Ready,
    /// First submission running
    Submitting,
    /// Pull request open
    Submitted,
    /// Follow-up commit running
    ReSubmitting,
    /// At least one follow-up commit pushed
    ReSubmitted,
    /// Being replaced by a fresh copy after review ended
    Recovering,
    /// Removed locally
    Deleted,
}

impl TaskPhase {
    /// Phases reachable from this one
    pub fn valid_transitions(&self) -> &'static [TaskPhase] {
        use TaskPhase::*;
        match self {
            Idle => &[CheckingOut, Deleted],
            CheckingOut => &[Ready, Deleted],
            Ready => &[CheckingOut, Submitting, Deleted],
            Submitting => &[Submitted, Deleted],
            Submitted => &[ReSubmitting, Recovering, Deleted],
            ReSubmitting => &[ReSubmitted, Deleted],
            ReSubmitted => &[ReSubmitting, Recovering, Deleted],
            Recovering => &[Deleted],
            Deleted => &[],
        }
    }

    pub fn can_transition_to(&self, to: &TaskPhase) -> bool {
        self.valid_transitions().contains(to)
    }

    /// Whether a task may be stored in this phase
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            TaskPhase::Idle | TaskPhase::Ready | TaskPhase::Submitted | TaskPhase::ReSubmitted
        )
    }

    /// Whether a pull request exists in this phase
    pub fn has_pull_request(&self) -> bool {
        matches!(self, TaskPhase::Submitted | TaskPhase::ReSubmitted)
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            TaskPhase::Idle => "Waiting for checkout",
            TaskPhase::CheckingOut => "Checking out",
            TaskPhase::Ready => "Ready to submit",
            TaskPhase::Submitting => "Submitting",
            TaskPhase::Submitted => "Submitted",
            TaskPhase::ReSubmitting => "Re-submitting",
            TaskPhase::ReSubmitted => "Re-submitted",
            TaskPhase::Recovering => "Recovering",
            TaskPhase::Deleted => "Deleted",
        }
    }
}

impl std::fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_path() {
        assert!(TaskPhase::Idle.can_transition_to(&TaskPhase::CheckingOut));
        assert!(TaskPhase::CheckingOut.can_transition_to(&TaskPhase::Ready));
        assert!(TaskPhase::Ready.can_transition_to(&TaskPhase::Submitting));
        assert!(TaskPhase::Submitting.can_transition_to(&TaskPhase::Submitted));
        assert!(TaskPhase::Submitted.can_transition_to(&TaskPhase::ReSubmitting));
        assert!(TaskPhase::ReSubmitting.can_transition_to(&TaskPhase::ReSubmitted));
        assert!(TaskPhase::ReSubmitted.can_transition_to(&TaskPhase::ReSubmitting));
    }

    #[test]
    fn test_no_second_pull_request() {
        assert!(!TaskPhase::Submitted.can_transition_to(&TaskPhase::Submitting));
        assert!(!TaskPhase::ReSubmitted.can_transition_to(&TaskPhase::Submitting));
    }

    #[test]
    fn test_submitted_tasks_cannot_checkout() {
        assert!(!TaskPhase::Submitted.can_transition_to(&TaskPhase::CheckingOut));
    }

    #[test]
    fn test_recovery_only_after_submission() {
        assert!(!TaskPhase::Ready.can_transition_to(&TaskPhase::Recovering));
        assert!(TaskPhase::Submitted.can_transition_to(&TaskPhase::Recovering));
        assert!(TaskPhase::ReSubmitted.can_transition_to(&TaskPhase::Recovering));
    }

    #[test]
    fn test_deleted_is_absorbing() {
        assert!(TaskPhase::Deleted.valid_transitions().is_empty());
        for phase in [
            TaskPhase::Idle,
            TaskPhase::CheckingOut,
            TaskPhase::Ready,
            TaskPhase::Submitting,
            TaskPhase::Submitted,
            TaskPhase::ReSubmitting,
            TaskPhase::ReSubmitted,
            TaskPhase::Recovering,
        ] {
            assert!(phase.can_transition_to(&TaskPhase::Deleted), "{:?}", phase);
        }
    }

    #[test]
    fn test_settled_phases() {
        assert!(TaskPhase::Ready.is_settled());
        assert!(!TaskPhase::Submitting.is_settled());
        assert!(!TaskPhase::Deleted.is_settled());
    }
}
