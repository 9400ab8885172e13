//! Connection and connection factory traits

use crate::{ConnectionConfig, QueryResult, Result, Value};
use async_trait::async_trait;

/// An open database session
///
/// A connection is used by exactly one run at a time; implementations only
/// need interior mutability to satisfy `&self` receivers, not concurrent
/// access.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "mssql")
    fn driver_name(&self) -> &str;

    /// Execute one unit of SQL text, binding `params` to the positional
    /// placeholders `@P1..@Pn` in order.
    ///
    /// An empty `params` slice sends the text as a plain SQL batch. The
    /// first result set that carries columns is returned; units that produce
    /// no result set (DDL, UPDATE, DELETE) yield an empty `QueryResult`.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}

/// Factory trait for opening new connections
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Open a connection described by `config`
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>>;
}
