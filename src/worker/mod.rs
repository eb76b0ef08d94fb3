//! Worker contracts and implementations.
//!
//! Core components:
//! - `worker` - the capability contract every worker fulfils
//! - `single_agent` - a worker backed by one conversational agent

pub mod single_agent;
pub mod worker;

pub use single_agent::SingleAgentWorker;
pub use worker::Worker;
