//! Batch splitting on `GO` delimiter lines
//!
//! A delimiter is a line holding nothing but `GO` (any case) and optional
//! horizontal whitespace. The splitter does not parse SQL, so a `GO` line
//! inside a string literal or a block comment is still a split point.

use regex::Regex;
use std::sync::LazyLock;

// `\r` is allowed before the line end so CRLF scripts split the same way
static GO_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*GO[ \t\r]*$").expect("valid regex"));

/// One independently executable unit of SQL text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    index: usize,
    sql: String,
}

impl Batch {
    pub fn new(index: usize, sql: impl Into<String>) -> Self {
        Self {
            index,
            sql: sql.into(),
        }
    }

    /// 1-based position in the script
    pub fn index(&self) -> usize {
        self.index
    }

    /// Trimmed SQL text
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// First line of the batch, shortened to `max_chars`
    pub fn preview(&self, max_chars: usize) -> String {
        let first_line = self.sql.lines().next().unwrap_or_default();
        if first_line.chars().count() > max_chars {
            let cut: String = first_line.chars().take(max_chars).collect();
            format!("{}...", cut)
        } else {
            first_line.to_string()
        }
    }
}

/// Split a script into batches.
///
/// Segments between delimiter lines are trimmed and empty ones dropped, so
/// blank lines, leading or trailing `GO` lines and repeated `GO` lines never
/// produce a batch. Indices are assigned after filtering and start at 1.
///
/// ```
/// use batchrun_runner::split_batches;
///
/// let batches = split_batches("SELECT 1\nGO\nSELECT 2");
/// assert_eq!(batches.len(), 2);
/// assert_eq!(batches[1].sql(), "SELECT 2");
/// ```
pub fn split_batches(script: &str) -> Vec<Batch> {
    GO_LINE_REGEX
        .split(script)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(i, segment)| Batch::new(i + 1, segment))
        .collect()
}
