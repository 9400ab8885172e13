//! Migration script loading

use std::path::{Path, PathBuf};

use crate::error::{RunnerError, RunnerResult};

/// A migration script file and its contents, immutable once loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    path: PathBuf,
    text: String,
}

impl MigrationScript {
    /// Build a script from text already in memory
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read a script from disk.
    ///
    /// A zero-byte file is rejected; a file holding only whitespace or `GO`
    /// lines loads fine and simply yields no batches.
    pub async fn load(path: &Path) -> RunnerResult<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RunnerError::ScriptNotFound(path.to_path_buf())
            } else {
                RunnerError::ScriptRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        if text.is_empty() {
            return Err(RunnerError::EmptyScript(path.to_path_buf()));
        }

        tracing::debug!(path = %path.display(), bytes = text.len(), "script loaded");
        Ok(Self::from_text(path, text))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
