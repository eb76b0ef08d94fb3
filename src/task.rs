//! Task and its state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TaskError;

/// State of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Waiting for its dependencies and a worker.
    Pending,
    /// Handed to a worker, processing attempt in flight.
    Running,
    /// Processed successfully; the result is set.
    Done,
    /// Processing attempt failed; no result.
    Failed,
}

impl TaskState {
    /// Check if this state allows transitioning to another state.
    pub fn can_transition_to(&self, target: TaskState) -> bool {
        use TaskState::*;

        matches!(
            (self, target),
            // From Pending. Pending -> Failed is the path taken when a
            // dependency failure is propagated without dispatch.
            (Pending, Running) | (Pending, Failed) |
            // From Running
            (Running, Done) | (Running, Failed)
        )
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A unit of work.
///
/// Carries identity, an opaque content payload, the current state, a result
/// that is present exactly when the state is `Done`, and ordered id
/// references to the tasks whose results this one may need as context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Stable unique identifier. Immutable for the task's lifetime.
    pub id: String,
    /// Semantic description of the work to be done.
    pub content: String,
    /// Current state.
    pub state: TaskState,
    /// Result payload, set only when `state` is `Done`.
    pub result: Option<String>,
    /// Ordered ids of tasks this task depends on. Order is
    /// caller-significant: it is the order dependency results are rendered
    /// for the worker.
    pub dependencies: Vec<String>,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task with a generated id.
    pub fn new(content: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), content)
    }

    /// Create a task with a caller-supplied id.
    pub fn with_id(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            state: TaskState::Pending,
            result: None,
            dependencies: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Register a dependency. Chainable.
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    /// Transition to a new state. Invalid transitions are defects in the
    /// scheduler, surfaced as typed errors.
    pub fn transition_to(&mut self, target: TaskState) -> Result<(), TaskError> {
        if !self.state.can_transition_to(target) {
            return Err(TaskError::InvalidTransition {
                id: self.id.clone(),
                state: self.state.to_string(),
                target: target.to_string(),
            });
        }
        self.state = target;
        Ok(())
    }

    /// Explicit retry hook: return a terminal task to `Pending` and drop
    /// its result. This is the only way a task leaves a terminal state; the
    /// coordinator never calls it on its own.
    pub fn reset_for_retry(&mut self) {
        self.result = None;
        self.state = TaskState::Pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_transitions_valid() {
        assert!(TaskState::Pending.can_transition_to(TaskState::Running));
        assert!(TaskState::Pending.can_transition_to(TaskState::Failed));
        assert!(TaskState::Running.can_transition_to(TaskState::Done));
        assert!(TaskState::Running.can_transition_to(TaskState::Failed));
    }

    #[test]
    fn state_transitions_invalid() {
        assert!(!TaskState::Done.can_transition_to(TaskState::Running));
        assert!(!TaskState::Done.can_transition_to(TaskState::Pending));
        assert!(!TaskState::Failed.can_transition_to(TaskState::Running));
        assert!(!TaskState::Pending.can_transition_to(TaskState::Done));
    }

    #[test]
    fn terminal_states() {
        assert!(TaskState::Done.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
    }

    #[test]
    fn task_transitions() {
        let mut task = Task::with_id("t1", "do something");
        assert_eq!(task.state, TaskState::Pending);

        task.transition_to(TaskState::Running).unwrap();
        task.transition_to(TaskState::Done).unwrap();
        assert_eq!(task.state, TaskState::Done);

        let err = task.transition_to(TaskState::Running).unwrap_err();
        assert!(err.to_string().contains("t1"));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = Task::new("a");
        let b = Task::new("b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn depends_on_preserves_order() {
        let task = Task::with_id("t", "x").depends_on("d2").depends_on("d1");
        assert_eq!(task.dependencies, vec!["d2".to_string(), "d1".to_string()]);
    }

    #[test]
    fn reset_for_retry_clears_terminal_state() {
        let mut task = Task::with_id("t", "x");
        task.transition_to(TaskState::Running).unwrap();
        task.result = Some("out".to_string());
        task.transition_to(TaskState::Done).unwrap();

        task.reset_for_retry();
        assert_eq!(task.state, TaskState::Pending);
        assert!(task.result.is_none());
    }

    #[test]
    fn task_state_serde_roundtrip() {
        let json = serde_json::to_string(&TaskState::Running).unwrap();
        assert_eq!(json, "\"running\"");
        let parsed: TaskState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TaskState::Running);
    }

    #[test]
    fn task_state_display() {
        assert_eq!(TaskState::Pending.to_string(), "pending");
        assert_eq!(TaskState::Done.to_string(), "done");
    }
}
