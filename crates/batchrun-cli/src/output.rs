//! Console progress output
//!
//! Prints one block per batch as soon as it finishes, then a summary. All of
//! it goes to the writer given at construction (stdout in the binary).

use std::fmt::Display;
use std::io::Write;
use std::time::Duration;

use batchrun_core::QueryResult;
use batchrun_runner::{Batch, BatchOutcome, BatchReport, RunReporter, RunResult};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};

const SUCCESS_BANNER: &str = "Migration script completed.";
const ABORT_BANNER: &str = "Migration aborted before any batch was executed.";

pub struct ConsoleReporter<W: Write> {
    out: W,
    max_rows: usize,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, max_rows: usize) -> Self {
        Self { out, max_rows }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: impl Display) {
        if let Err(e) = writeln!(self.out, "{text}") {
            tracing::warn!(error = %e, "failed to write progress output");
        }
    }

    fn emit_rows(&mut self, result: &QueryResult) {
        if result.columns.is_empty() {
            return;
        }
        self.emit(render_rows(result, self.max_rows));
        let hidden = result.row_count().saturating_sub(self.max_rows);
        if hidden > 0 {
            self.emit(format!("... {hidden} more rows"));
        }
    }
}

/// Render up to `max_rows` rows as a table
pub fn render_rows(result: &QueryResult, max_rows: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(result.columns.iter().map(|c| c.name.as_str()));

    for row in result.rows.iter().take(max_rows) {
        table.add_row(row.values.iter().map(ToString::to_string));
    }
    table
}

/// Table of failed batches with their messages
pub fn render_failures(result: &RunResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Batch", "Statement", "Error"]);

    for report in result.failures() {
        table.add_row(vec![
            report.index.to_string(),
            report.preview.clone(),
            report.outcome.error_message().unwrap_or_default().to_string(),
        ]);
    }
    table
}

fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis} ms")
    } else {
        format!("{:.2} s", duration.as_secs_f64())
    }
}

impl<W: Write> RunReporter for ConsoleReporter<W> {
    fn batch_started(&mut self, batch: &Batch, total: usize) {
        self.emit(format!(
            "Executing batch {}/{}: {}",
            batch.index(),
            total,
            batch.preview(60)
        ));
    }

    fn batch_finished(&mut self, report: &BatchReport, total: usize) {
        match &report.outcome {
            BatchOutcome::Succeeded { result } => {
                self.emit(format!(
                    "Batch {}/{} succeeded ({})",
                    report.index,
                    total,
                    format_duration(report.duration)
                ));
                self.emit_rows(result);
            }
            BatchOutcome::Failed { message } => {
                self.emit(format!("Batch {}/{} failed: {}", report.index, total, message));
            }
        }
    }

    fn run_finished(&mut self, result: &RunResult) {
        if let Some(reason) = result.abort_reason() {
            self.emit(format!("Error: {reason}"));
            self.emit(ABORT_BANNER);
            return;
        }

        self.emit("");
        self.emit(format!(
            "Batches: {} total, {} succeeded, {} failed in {}",
            result.total(),
            result.succeeded(),
            result.failed(),
            format_duration(result.elapsed)
        ));
        if result.failed() > 0 {
            self.emit(render_failures(result));
        }
        self.emit(SUCCESS_BANNER);
    }
}
