//! Dependency-aware dispatch of tasks to a pool of workers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::config::{DependencyFailurePolicy, WorkforceConfig};
use crate::error::{Result, WorkforceError};
use crate::llm::ChatAgent;
use crate::task::{Task, TaskState};
use crate::worker::{SingleAgentWorker, Worker};
use crate::workforce::graph::TaskGraph;

/// Cloneable handle for cancelling a running workforce.
///
/// Cancellation is cooperative: in-flight processing calls finish and are
/// recorded, but no new dispatch occurs.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of one processing attempt, carried back from the dispatch
/// future to the arena.
struct AttemptOutcome {
    task_id: String,
    state: TaskState,
    result: Option<String>,
}

/// Coordinates a pool of workers over a task dependency graph.
///
/// A task is dispatched the instant every one of its dependencies is
/// terminal; independent ready tasks run concurrently, bounded by the
/// configured limit. Exactly one worker processes a given task per attempt.
pub struct Workforce {
    description: String,
    config: WorkforceConfig,
    workers: Vec<Arc<dyn Worker>>,
    next_worker: AtomicUsize,
    cancel: CancelHandle,
    /// Tasks seeded ahead of the next `process_task` run.
    seeded: Vec<Task>,
}

impl Workforce {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            config: WorkforceConfig::default(),
            workers: Vec::new(),
            next_worker: AtomicUsize::new(0),
            cancel: CancelHandle::default(),
            seeded: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: WorkforceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Register any object satisfying the worker contract. Chainable.
    pub fn add_worker(&mut self, worker: Arc<dyn Worker>) -> &mut Self {
        self.workers.push(worker);
        self
    }

    /// Register a named single-agent worker. Chainable.
    pub fn add_single_agent_worker(
        &mut self,
        description: impl Into<String>,
        agent: ChatAgent,
    ) -> &mut Self {
        self.add_worker(Arc::new(SingleAgentWorker::new(description, agent)))
    }

    /// Seed a task into the next run's graph, typically a dependency of the
    /// root task. Chainable.
    pub fn add_task(&mut self, task: Task) -> &mut Self {
        self.seeded.push(task);
        self
    }

    /// Handle for cancelling the current (or next) run.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Drive dependency-aware execution until the root task is terminal.
    ///
    /// The seeded tasks and the root form the graph. The returned root
    /// always carries a terminal state; a cancelled or short-circuited run
    /// marks it `Failed`. Graph defects (duplicate ids, unknown dependency
    /// ids, cycles) surface as errors, not as task failures.
    pub async fn process_task(&mut self, root: Task) -> Result<Task> {
        if self.workers.is_empty() {
            return Err(WorkforceError::NoWorkers.into());
        }

        let root_id = root.id.clone();
        let mut tasks = std::mem::take(&mut self.seeded);
        tasks.push(root);
        let mut graph = TaskGraph::from_tasks(tasks)?;
        graph.validate()?;

        tracing::info!(
            workforce = %self.description,
            root = %root_id,
            tasks = graph.len(),
            workers = self.workers.len(),
            "processing task graph"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_tasks));
        let mut in_flight: FuturesUnordered<BoxFuture<'static, AttemptOutcome>> =
            FuturesUnordered::new();

        loop {
            let root_terminal = graph
                .get(&root_id)
                .is_some_and(|task| task.state.is_terminal());
            if !root_terminal && !self.cancel.is_cancelled() {
                self.dispatch_ready(&mut graph, &mut in_flight, &semaphore)?;
            }

            match in_flight.next().await {
                Some(outcome) => self.record(&mut graph, outcome)?,
                None => break,
            }
        }

        let Some(mut root) = graph.remove(&root_id) else {
            return Err(WorkforceError::TaskNotFound(root_id).into());
        };
        if !root.state.is_terminal() {
            tracing::warn!(
                workforce = %self.description,
                task_id = %root.id,
                cancelled = self.cancel.is_cancelled(),
                "run ended before the root task completed, marking it failed"
            );
            root.result = None;
            root.transition_to(TaskState::Failed)?;
        }
        Ok(root)
    }

    /// Dispatch every currently-ready task, iterating to a fixpoint since
    /// failure propagation can make further tasks ready.
    fn dispatch_ready(
        &self,
        graph: &mut TaskGraph,
        in_flight: &mut FuturesUnordered<BoxFuture<'static, AttemptOutcome>>,
        semaphore: &Arc<Semaphore>,
    ) -> Result<()> {
        loop {
            let ready = graph.ready_tasks();
            if ready.is_empty() {
                return Ok(());
            }

            for id in ready {
                let failed_deps = graph.failed_dependencies(&id);
                if !failed_deps.is_empty()
                    && self.config.on_dependency_failure
                        == DependencyFailurePolicy::PropagateFailure
                {
                    tracing::warn!(
                        workforce = %self.description,
                        task_id = %id,
                        failed_dependencies = ?failed_deps,
                        "dependency failed, propagating without dispatch"
                    );
                    graph.transition(&id, TaskState::Failed)?;
                    continue;
                }

                graph.transition(&id, TaskState::Running)?;
                let Some(task) = graph.get(&id) else {
                    return Err(WorkforceError::TaskNotFound(id).into());
                };
                let mut attempt = task.clone();
                let dependencies = graph.dependency_snapshot(&id);

                let worker = self.select_worker();
                let timeout = self.config.task_timeout;
                let semaphore = Arc::clone(semaphore);

                tracing::debug!(
                    workforce = %self.description,
                    task_id = %id,
                    worker = %worker.description(),
                    "dispatching task"
                );

                in_flight.push(
                    async move {
                        let task_id = attempt.id.clone();
                        let Ok(_permit) = semaphore.acquire_owned().await else {
                            // The semaphore is never closed while a run is
                            // active.
                            return AttemptOutcome {
                                task_id,
                                state: TaskState::Failed,
                                result: None,
                            };
                        };

                        let state = match tokio::time::timeout(
                            timeout,
                            worker.process(&mut attempt, &dependencies),
                        )
                        .await
                        {
                            Ok(state) => state,
                            Err(_) => {
                                tracing::error!(
                                    worker = %worker.description(),
                                    task_id = %task_id,
                                    ?timeout,
                                    "processing attempt timed out"
                                );
                                TaskState::Failed
                            }
                        };

                        AttemptOutcome {
                            task_id,
                            state,
                            result: attempt.result.take(),
                        }
                    }
                    .boxed(),
                );
            }
        }
    }

    /// Record a processing attempt's outcome in the arena.
    fn record(&self, graph: &mut TaskGraph, outcome: AttemptOutcome) -> Result<()> {
        let mut state = outcome.state;
        if !state.is_terminal() {
            tracing::error!(
                task_id = %outcome.task_id,
                state = %state,
                "worker returned a non-terminal state, recording failure"
            );
            state = TaskState::Failed;
        }
        if state == TaskState::Done && outcome.result.is_none() {
            tracing::error!(
                task_id = %outcome.task_id,
                "worker reported done without a result, recording failure"
            );
            state = TaskState::Failed;
        }
        graph.record_outcome(&outcome.task_id, state, outcome.result)
    }

    fn select_worker(&self) -> Arc<dyn Worker> {
        let idx = self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        Arc::clone(&self.workers[idx])
    }
}
