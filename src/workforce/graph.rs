//! Task dependency graph (DAG) arena.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, WorkforceError};
use crate::task::{Task, TaskState};

/// Arena of task records indexed by id, with dependency edges stored as id
/// references.
///
/// The coordinator is the sole owner and the sole mutator of task states in
/// the arena; workers only ever see clones of individual tasks.
#[derive(Debug)]
pub struct TaskGraph {
    nodes: HashMap<String, Task>,
    /// Insertion order, for stable ready-set ordering.
    order: Vec<String>,
}

impl TaskGraph {
    /// Build the arena from a task list. Rejects duplicate ids.
    pub fn from_tasks(tasks: Vec<Task>) -> std::result::Result<Self, WorkforceError> {
        let mut nodes = HashMap::with_capacity(tasks.len());
        let mut order = Vec::with_capacity(tasks.len());
        for task in tasks {
            if nodes.contains_key(&task.id) {
                return Err(WorkforceError::DuplicateTaskId(task.id));
            }
            order.push(task.id.clone());
            nodes.insert(task.id.clone(), task);
        }
        Ok(Self { nodes, order })
    }

    /// Validate dependency relationships: every referenced id exists and
    /// the graph is acyclic.
    pub fn validate(&self) -> std::result::Result<(), WorkforceError> {
        for id in &self.order {
            let Some(task) = self.nodes.get(id) else {
                continue;
            };
            for dep in &task.dependencies {
                if !self.nodes.contains_key(dep) {
                    return Err(WorkforceError::DependencyNotFound {
                        task_id: id.clone(),
                        missing: dep.clone(),
                    });
                }
            }
        }
        if let Some(cycle) = self.find_cycle() {
            return Err(WorkforceError::CircularDependency(cycle.join(" -> ")));
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pending tasks whose dependencies are all terminal, in insertion
    /// order.
    pub fn ready_tasks(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| {
                self.nodes.get(*id).is_some_and(|task| {
                    task.state == TaskState::Pending
                        && task.dependencies.iter().all(|dep| {
                            self.nodes.get(dep).is_some_and(|d| d.state.is_terminal())
                        })
                })
            })
            .cloned()
            .collect()
    }

    /// Ids of failed dependencies of `id`, in dependency order.
    pub fn failed_dependencies(&self, id: &str) -> Vec<String> {
        let Some(task) = self.nodes.get(id) else {
            return Vec::new();
        };
        task.dependencies
            .iter()
            .filter(|dep| {
                self.nodes
                    .get(*dep)
                    .is_some_and(|d| d.state == TaskState::Failed)
            })
            .cloned()
            .collect()
    }

    /// Ordered clones of the dependency tasks of `id`.
    pub fn dependency_snapshot(&self, id: &str) -> Vec<Task> {
        let Some(task) = self.nodes.get(id) else {
            return Vec::new();
        };
        task.dependencies
            .iter()
            .filter_map(|dep| self.nodes.get(dep).cloned())
            .collect()
    }

    /// Apply a state transition to a task in the arena.
    pub fn transition(&mut self, id: &str, target: TaskState) -> Result<()> {
        let Some(task) = self.nodes.get_mut(id) else {
            return Err(WorkforceError::TaskNotFound(id.to_string()).into());
        };
        task.transition_to(target)?;
        Ok(())
    }

    /// Record the outcome of a processing attempt.
    ///
    /// State and result land in one call, so an observer of the arena never
    /// sees a partially-updated task.
    pub fn record_outcome(
        &mut self,
        id: &str,
        state: TaskState,
        result: Option<String>,
    ) -> Result<()> {
        let Some(task) = self.nodes.get_mut(id) else {
            return Err(WorkforceError::TaskNotFound(id.to_string()).into());
        };
        task.transition_to(state)?;
        task.result = if state == TaskState::Done { result } else { None };
        Ok(())
    }

    /// Remove and return a task.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        self.order.retain(|t| t != id);
        self.nodes.remove(id)
    }

    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        for id in &self.order {
            if visited.contains(id) {
                continue;
            }
            let mut stack = Vec::new();
            if self.dfs_cycle(id, &mut visited, &mut stack) {
                return Some(stack);
            }
        }
        None
    }

    fn dfs_cycle(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> bool {
        visited.insert(node.to_string());
        stack.push(node.to_string());

        if let Some(task) = self.nodes.get(node) {
            for dep in &task.dependencies {
                // A dependency already on the current path closes a cycle.
                if let Some(pos) = stack.iter().position(|s| s == dep) {
                    stack.push(dep.clone());
                    stack.drain(..pos);
                    return true;
                }
                if !visited.contains(dep) && self.dfs_cycle(dep, visited, stack) {
                    return true;
                }
            }
        }

        stack.pop();
        false
    }
}
