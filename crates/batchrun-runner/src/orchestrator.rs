//! Run orchestration
//!
//! A run moves through `NotStarted -> Loaded -> Connected -> Executing ->
//! Finished`. Failing to load the script or to connect jumps straight to
//! `Finished` with `RunStatus::AbortedBeforeExecution`; once `Executing`
//! is reached the run always ends `Completed`, however many batches failed.

use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use batchrun_core::{Connection, ConnectionConfig, ConnectionFactory};
use futures::FutureExt;

use crate::error::{RunnerError, RunnerResult};
use crate::executor::{BatchExecutor, BatchReport};
use crate::lifecycle::ConnectionLease;
use crate::report::RunReporter;
use crate::script::MigrationScript;
use crate::splitter::{Batch, split_batches};

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Loaded,
    Connected,
    Executing,
    Finished,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::Loaded => "loaded",
            Self::Connected => "connected",
            Self::Executing => "executing",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// How a finished run ended
#[derive(Debug)]
pub enum RunStatus {
    /// Every batch was attempted
    Completed,
    /// The run stopped before executing anything
    AbortedBeforeExecution(RunnerError),
}

/// Outcome of a whole run
#[derive(Debug)]
pub struct RunResult {
    pub status: RunStatus,
    pub reports: Vec<BatchReport>,
    pub elapsed: Duration,
}

impl RunResult {
    fn aborted(reason: RunnerError, elapsed: Duration) -> Self {
        Self {
            status: RunStatus::AbortedBeforeExecution(reason),
            reports: Vec::new(),
            elapsed,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, RunStatus::Completed)
    }

    pub fn abort_reason(&self) -> Option<&RunnerError> {
        match &self.status {
            RunStatus::AbortedBeforeExecution(reason) => Some(reason),
            RunStatus::Completed => None,
        }
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn succeeded(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchReport> {
        self.reports.iter().filter(|r| !r.outcome.is_success())
    }

    /// Process exit code: 0 once execution was reached, 1 for an abort.
    /// Failed batches do not affect it.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Completed => 0,
            RunStatus::AbortedBeforeExecution(_) => 1,
        }
    }
}

/// Drives one migration run against one connection
pub struct Orchestrator {
    factory: Arc<dyn ConnectionFactory>,
    config: ConnectionConfig,
    executor: BatchExecutor,
}

impl Orchestrator {
    pub fn new(factory: Arc<dyn ConnectionFactory>, config: ConnectionConfig) -> Self {
        Self {
            factory,
            config,
            executor: BatchExecutor::new(),
        }
    }

    pub fn with_executor(mut self, executor: BatchExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Load the script at `path` and run it
    pub async fn run_path(&self, path: &Path, reporter: &mut dyn RunReporter) -> RunResult {
        let started = Instant::now();
        let state = Tracker::new(reporter);

        let script = match MigrationScript::load(path).await {
            Ok(script) => script,
            Err(e) => return state.abort(e, started),
        };

        self.run_loaded(script, state, started).await
    }

    /// Run a script that is already in memory
    pub async fn run_script(
        &self,
        script: MigrationScript,
        reporter: &mut dyn RunReporter,
    ) -> RunResult {
        let started = Instant::now();
        let state = Tracker::new(reporter);
        self.run_loaded(script, state, started).await
    }

    async fn run_loaded(
        &self,
        script: MigrationScript,
        mut state: Tracker<'_>,
        started: Instant,
    ) -> RunResult {
        state.enter(RunState::Loaded);
        let batches = split_batches(script.text());
        tracing::info!(
            script = %script.path().display(),
            batches = batches.len(),
            "script split into batches"
        );

        let lease = match self.connect().await {
            Ok(lease) => lease,
            Err(e) => return state.abort(e, started),
        };
        state.enter(RunState::Connected);

        state.enter(RunState::Executing);
        let executed = AssertUnwindSafe(self.execute_all(
            lease.connection(),
            &batches,
            state.reporter(),
        ))
        .catch_unwind()
        .await;

        lease.release().await;

        let reports = match executed {
            Ok(reports) => reports,
            Err(panic) => std::panic::resume_unwind(panic),
        };

        state.enter(RunState::Finished);
        let result = RunResult {
            status: RunStatus::Completed,
            reports,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            total = result.total(),
            succeeded = result.succeeded(),
            failed = result.failed(),
            "run completed"
        );
        state.reporter().run_finished(&result);
        result
    }

    async fn connect(&self) -> RunnerResult<ConnectionLease> {
        ConnectionLease::acquire(self.factory.as_ref(), &self.config).await
    }

    async fn execute_all(
        &self,
        connection: &dyn Connection,
        batches: &[Batch],
        reporter: &mut dyn RunReporter,
    ) -> Vec<BatchReport> {
        let total = batches.len();
        let mut reports = Vec::with_capacity(total);

        for batch in batches {
            reporter.batch_started(batch, total);
            let report = self.executor.execute(connection, batch).await;
            reporter.batch_finished(&report, total);
            reports.push(report);
        }

        reports
    }
}

/// Tracks the current state and forwards transitions to the reporter
struct Tracker<'a> {
    current: RunState,
    reporter: &'a mut dyn RunReporter,
}

impl<'a> Tracker<'a> {
    fn new(reporter: &'a mut dyn RunReporter) -> Self {
        reporter.state_changed(RunState::NotStarted);
        Self {
            current: RunState::NotStarted,
            reporter,
        }
    }

    fn enter(&mut self, next: RunState) {
        tracing::debug!(from = %self.current, to = %next, "run state changed");
        self.current = next;
        self.reporter.state_changed(next);
    }

    fn reporter(&mut self) -> &mut dyn RunReporter {
        &mut *self.reporter
    }

    fn abort(mut self, reason: RunnerError, started: Instant) -> RunResult {
        tracing::error!(state = %self.current, error = %reason, "run aborted before execution");
        self.enter(RunState::Finished);
        let result = RunResult::aborted(reason, started.elapsed());
        self.reporter.run_finished(&result);
        result
    }
}
