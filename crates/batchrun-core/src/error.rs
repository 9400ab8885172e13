//! Error types for batchrun

use thiserror::Error;

/// Errors raised by connections and drivers
#[derive(Error, Debug)]
pub enum BatchrunError {
    /// Opening, closing or talking to the server failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server rejected a batch; holds the server's message
    #[error("Query error: {0}")]
    Query(String),

    /// A wire value could not be represented as a `Value`
    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Connection is closed")]
    Closed,
}

/// Result type alias for batchrun operations
pub type Result<T> = std::result::Result<T, BatchrunError>;
