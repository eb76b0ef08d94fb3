//! Configuration types.

use std::time::Duration;

/// What the coordinator does with a task whose dependency ended `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyFailurePolicy {
    /// Mark the dependent `Failed` without invoking any worker.
    #[default]
    PropagateFailure,
    /// Dispatch the dependent anyway; the failed dependency is rendered
    /// with an empty result.
    ProcessAnyway,
}

/// Workforce configuration.
#[derive(Debug, Clone)]
pub struct WorkforceConfig {
    /// Per-task processing timeout. An elapsed timeout fails the task like
    /// any other internal error.
    pub task_timeout: Duration,
    /// Maximum number of processing calls in flight at once.
    pub max_concurrent_tasks: usize,
    /// Handling of tasks whose dependencies failed.
    pub on_dependency_failure: DependencyFailurePolicy,
}

impl Default for WorkforceConfig {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(300), // 5 minutes
            max_concurrent_tasks: 4,
            on_dependency_failure: DependencyFailurePolicy::PropagateFailure,
        }
    }
}
