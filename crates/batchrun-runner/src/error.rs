//! Structural errors that abort a run before any batch executes

use std::path::PathBuf;

use batchrun_core::BatchrunError;
use thiserror::Error;

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("failed to read script {}: {source}", path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("script is empty: {}", .0.display())]
    EmptyScript(PathBuf),

    #[error("could not connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: BatchrunError,
    },
}

/// Result type alias for runner operations
pub type RunnerResult<T> = std::result::Result<T, RunnerError>;
