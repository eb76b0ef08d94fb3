//! Worker capability contract.

use async_trait::async_trait;

use crate::task::{Task, TaskState};

/// A capability that consumes a task plus its resolved dependencies and
/// yields a terminal state.
///
/// `process` must never fail loudly: collaborator errors of any kind are
/// contained and reported as [`TaskState::Failed`]. That contract is what
/// lets the coordinator run many tasks without special-casing worker
/// crashes.
///
/// Implementations that hold session state must serialize overlapping
/// `process` calls internally; `SingleAgentWorker` does so through its
/// agent's conversation lock.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Static semantic identity of the worker, used in diagnostics and
    /// selection.
    fn description(&self) -> &str;

    /// Process `task` given its ordered `dependencies`, each guaranteed
    /// terminal by the coordinator.
    ///
    /// Returns exactly one of `Done`/`Failed` and sets `task.result` if and
    /// only if it returns `Done`.
    async fn process(&self, task: &mut Task, dependencies: &[Task]) -> TaskState;

    /// Clear internal session state back to the initial configuration.
    /// Idempotent; has no effect on tasks already completed.
    async fn reset(&self);
}
