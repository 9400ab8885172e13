//! Progress reporting hooks

use crate::executor::BatchReport;
use crate::orchestrator::{RunResult, RunState};
use crate::splitter::Batch;

/// Receives progress as a run advances.
///
/// The orchestrator calls these synchronously and in order, so a reporter
/// can print each batch result the moment it is known.
pub trait RunReporter {
    fn state_changed(&mut self, _state: RunState) {}

    fn batch_started(&mut self, batch: &Batch, total: usize);

    fn batch_finished(&mut self, report: &BatchReport, total: usize);

    fn run_finished(&mut self, result: &RunResult);
}

/// Reporter that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl RunReporter for SilentReporter {
    fn batch_started(&mut self, batch: &Batch, total: usize) {
        tracing::trace!(batch = batch.index(), total, "batch started");
    }

    fn batch_finished(&mut self, report: &BatchReport, total: usize) {
        tracing::trace!(
            batch = report.index,
            total,
            success = report.outcome.is_success(),
            "batch finished"
        );
    }

    fn run_finished(&mut self, result: &RunResult) {
        tracing::trace!(exit_code = result.exit_code(), "run finished");
    }
}
