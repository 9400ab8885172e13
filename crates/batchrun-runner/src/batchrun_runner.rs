//! batchrun runner - migration batch execution
//!
//! This crate turns a raw SQL script into batches and runs them, in order,
//! over a single connection:
//!
//! - `split_batches` - cuts a script at standalone `GO` lines
//! - `ConnectionLease` - one acquired connection, released exactly once
//! - `BatchExecutor` - runs one batch and tags the outcome, never erroring
//! - `Orchestrator` - drives a full run and produces a `RunResult`
//!
//! Failed batches never stop a run; only a structural failure (missing or
//! empty script, no connection) aborts it, and it does so before any batch
//! executes.

mod error;
mod executor;
mod lifecycle;
mod orchestrator;
mod report;
mod script;
mod splitter;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

pub use error::{RunnerError, RunnerResult};
pub use executor::{BatchExecutor, BatchOutcome, BatchReport};
pub use lifecycle::ConnectionLease;
pub use orchestrator::{Orchestrator, RunResult, RunState, RunStatus};
pub use report::{RunReporter, SilentReporter};
pub use script::MigrationScript;
pub use splitter::{Batch, split_batches};
