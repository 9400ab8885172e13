//! Connection lifecycle
//!
//! A run owns exactly one connection, held in a `ConnectionLease`. The lease
//! is the only place a connection gets closed, and `release` consumes it, so
//! a connection cannot be closed twice.

use batchrun_core::{Connection, ConnectionConfig, ConnectionFactory};

use crate::error::{RunnerError, RunnerResult};

/// An acquired connection, owned by one run
pub struct ConnectionLease {
    connection: Box<dyn Connection>,
    target: String,
    released: bool,
}

impl ConnectionLease {
    /// Open a connection through `factory`
    pub async fn acquire(
        factory: &dyn ConnectionFactory,
        config: &ConnectionConfig,
    ) -> RunnerResult<Self> {
        let target = config.target();
        tracing::debug!(%target, "acquiring connection");

        let connection =
            factory
                .connect(config)
                .await
                .map_err(|source| RunnerError::Connection {
                    target: target.clone(),
                    source,
                })?;

        tracing::info!(%target, driver = connection.driver_name(), "connection acquired");
        Ok(Self {
            connection,
            target,
            released: false,
        })
    }

    /// The leased connection
    pub fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    /// Close the connection.
    ///
    /// A close failure is logged and otherwise ignored: by the time a run
    /// releases its lease its outcome is already decided.
    pub async fn release(mut self) {
        self.released = true;
        match self.connection.close().await {
            Ok(()) => tracing::debug!(target = %self.target, "connection released"),
            Err(e) => tracing::error!(
                target = %self.target,
                error = %e,
                "failed to close connection cleanly"
            ),
        }
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(
                target = %self.target,
                "connection lease dropped without release"
            );
        }
    }
}

impl std::fmt::Debug for ConnectionLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionLease")
            .field("target", &self.target)
            .field("released", &self.released)
            .finish()
    }
}
