//! Phase tracking for a single task
//!
//! [`TaskLifecycle`] is created at the start of an operation from the
//! task's stored phase. Transitions are checked against
//! [`TaskPhase::valid_transitions`] and logged; the orchestrator copies the
//! final phase back onto the task only when the operation succeeds.

use uuid::Uuid;

use super::TaskPhase;
use crate::error::{Error, Result};

/// State machine interface
pub trait Workflow {
    /// The phase type for this workflow
    type Phase: Clone + PartialEq + std::fmt::Debug;

    /// Get the current phase of the workflow
    fn current_phase(&self) -> &Self::Phase;

    /// Check if a transition to the given phase is valid
    fn can_transition_to(&self, phase: &Self::Phase) -> bool;

    /// Attempt to transition to a new phase
    ///
    /// Returns an error if the transition is not valid.
    fn transition_to(&mut self, phase: Self::Phase) -> Result<()>;
}

/// A recorded phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: TaskPhase,
    pub to: TaskPhase,
}

/// Phase machine for one task
#[derive(Debug, Clone)]
pub struct TaskLifecycle {
    task_id: Uuid,
    phase: TaskPhase,
    history: Vec<PhaseTransition>,
}

impl TaskLifecycle {
    pub fn new(task_id: Uuid, phase: TaskPhase) -> Self {
        Self {
            task_id,
            phase,
            history: Vec::new(),
        }
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    pub fn history(&self) -> &[PhaseTransition] {
        &self.history
    }

    /// Phases visited so far, e.g. `Ready -> Submitting`
    pub fn path(&self) -> String {
        let start = self.history.first().map_or(self.phase, |t| t.from);
        std::iter::once(start)
            .chain(self.history.iter().map(|t| t.to))
            .map(|phase| format!("{:?}", phase))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl Workflow for TaskLifecycle {
    type Phase = TaskPhase;

    fn current_phase(&self) -> &TaskPhase {
        &self.phase
    }

    fn can_transition_to(&self, phase: &TaskPhase) -> bool {
        self.phase.can_transition_to(phase)
    }

    fn transition_to(&mut self, phase: TaskPhase) -> Result<()> {
        if !self.can_transition_to(&phase) {
            return Err(Error::InvalidTransition {
                from: self.phase,
                to: phase,
            });
        }

        tracing::info!(
            task = %self.task_id,
            from = ?self.phase,
            to = ?phase,
            "Task phase transition"
        );

        self.history.push(PhaseTransition {
            from: self.phase,
            to: phase,
        });
        self.phase = phase;
        Ok(())
    }
}
