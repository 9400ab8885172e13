//! MS SQL Server driver implementation

use crate::connection::MssqlConnection;
use async_trait::async_trait;
use batchrun_core::{Connection, ConnectionConfig, ConnectionFactory, Result};

/// MS SQL Server connection factory
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDriver;

impl MssqlDriver {
    /// Create a new MS SQL Server driver instance
    pub fn new() -> Self {
        tracing::debug!("MS SQL Server driver initialized");
        Self
    }

    /// ADO.NET-style connection string with the password masked, for logs
    pub fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        let mut conn_str = format!("Server={},{}", config.server, config.port);

        if !config.database.is_empty() {
            conn_str.push_str(&format!(";Database={}", config.database));
        }

        if !config.username.is_empty() {
            conn_str.push_str(&format!(";User Id={};Password=****", config.username));
        }

        conn_str.push_str(&format!(
            ";Encrypt={};TrustServerCertificate={};Connect Timeout={}",
            config.options.encrypt,
            config.options.trust_server_certificate,
            config.options.connect_timeout_secs
        ));

        conn_str
    }
}

#[async_trait]
impl ConnectionFactory for MssqlDriver {
    #[tracing::instrument(skip(self, config), fields(server = %config.server, database = %config.database))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
        tracing::debug!(
            connection = %self.build_connection_string(config),
            "opening MS SQL Server connection"
        );
        let connection = MssqlConnection::connect(config).await?;
        Ok(Box::new(connection))
    }
}
