//! Workforce coordination over a task dependency graph.
//!
//! Core components:
//! - `graph` - arena of task records with id-reference dependency edges
//! - `coordinator` - worker pool, readiness tracking, dispatch

pub mod coordinator;
pub mod graph;

pub use coordinator::{CancelHandle, Workforce};
pub use graph::TaskGraph;
