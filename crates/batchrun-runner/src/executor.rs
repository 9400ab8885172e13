//! Single batch execution
//!
//! Every batch outcome is a value. A database error, a binding error or any
//! other per-batch failure becomes `BatchOutcome::Failed` so the run can move
//! on to the next batch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use batchrun_core::{BatchrunError, Connection, QueryResult, Value};
use batchrun_params::Statement;

use crate::splitter::Batch;

/// Result of executing one batch
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// The batch ran; `result` holds the first result set it returned, if any
    Succeeded { result: QueryResult },
    /// The batch failed with the given diagnostic
    Failed { message: String },
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn result(&self) -> Option<&QueryResult> {
        match self {
            Self::Succeeded { result } => Some(result),
            Self::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { message } => Some(message),
        }
    }
}

/// A batch outcome plus the bookkeeping reported alongside it
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub index: usize,
    pub preview: String,
    pub outcome: BatchOutcome,
    pub duration: Duration,
}

/// Executes batches with a fixed set of named parameter bindings
#[derive(Debug, Clone, Default)]
pub struct BatchExecutor {
    bindings: HashMap<String, Value>,
}

const PREVIEW_CHARS: usize = 60;

impl BatchExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings applied to every batch; names are given without the colon
    pub fn with_bindings(mut self, bindings: HashMap<String, Value>) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn bindings(&self) -> &HashMap<String, Value> {
        &self.bindings
    }

    /// Run one batch on `connection`. Never returns an error.
    pub async fn execute(&self, connection: &dyn Connection, batch: &Batch) -> BatchReport {
        let started = Instant::now();
        let outcome = self.run(connection, batch).await;
        let duration = started.elapsed();

        match &outcome {
            BatchOutcome::Succeeded { result } => tracing::debug!(
                batch = batch.index(),
                rows = result.row_count(),
                elapsed_ms = duration.as_millis() as u64,
                "batch succeeded"
            ),
            BatchOutcome::Failed { message } => tracing::warn!(
                batch = batch.index(),
                error = %message,
                "batch failed"
            ),
        }

        BatchReport {
            index: batch.index(),
            preview: batch.preview(PREVIEW_CHARS),
            outcome,
            duration,
        }
    }

    async fn run(&self, connection: &dyn Connection, batch: &Batch) -> BatchOutcome {
        // without bindings the batch goes to the server exactly as written
        let (sql, values) = if self.bindings.is_empty() {
            (batch.sql().to_string(), Vec::new())
        } else {
            match Statement::new(batch.sql())
                .bind_all(&self.bindings)
                .into_bound()
            {
                Ok(bound) => (bound.sql, bound.values),
                Err(e) => {
                    return BatchOutcome::Failed {
                        message: e.to_string(),
                    };
                }
            }
        };

        match connection.execute(&sql, &values).await {
            Ok(result) => BatchOutcome::Succeeded { result },
            Err(e) => BatchOutcome::Failed {
                message: failure_message(e),
            },
        }
    }
}

/// Database errors are reported with the server's own text
fn failure_message(error: BatchrunError) -> String {
    match error {
        BatchrunError::Query(message) => message,
        other => other.to_string(),
    }
}
