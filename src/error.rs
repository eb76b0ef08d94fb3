//! Error types for taskforce.

use std::time::Duration;

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("Workforce error: {0}")]
    Workforce(#[from] WorkforceError),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Task state machine errors.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task {id} already in state {state}, cannot transition to {target}")]
    InvalidTransition {
        id: String,
        state: String,
        target: String,
    },
}

/// Coordinator errors.
///
/// These signal defects in how the task graph was assembled or scheduled,
/// not runtime conditions to recover from. Collaborator failures never
/// surface here; they end as a task's `Failed` state.
#[derive(Debug, thiserror::Error)]
pub enum WorkforceError {
    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("Task {task_id} depends on unknown task {missing}")]
    DependencyNotFound { task_id: String, missing: String },

    #[error("Circular dependency: {0}")]
    CircularDependency(String),

    #[error("Task {0} not found in the graph")]
    TaskNotFound(String),

    #[error("No workers registered")]
    NoWorkers,
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
