//! MS SQL Server connection implementation using tiberius

use async_trait::async_trait;
use batchrun_core::{
    BatchrunError, ColumnMeta, Connection, ConnectionConfig, QueryResult, Result, Row, Value,
};
use futures::TryStreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, QueryItem, QueryStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::convert::{tiberius_column_to_meta, tiberius_row_to_values, values_to_tiberius_params};

/// SQL Server error number for a failed login
pub(crate) const LOGIN_FAILED: u32 = 18456;

const APPLICATION_NAME: &str = "batchrun";

/// MS SQL Server connection errors
#[derive(Debug, thiserror::Error)]
pub enum MssqlConnectionError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Connection timed out after {0}s")]
    Timeout(u64),

    #[error("Session setup failed: {0}")]
    SessionSetup(String),

    #[error("Tiberius error: {0}")]
    Tiberius(#[from] tiberius::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MssqlConnectionError> for BatchrunError {
    fn from(err: MssqlConnectionError) -> Self {
        BatchrunError::Connection(err.to_string())
    }
}

type TdsClient = Client<Compat<TcpStream>>;

/// MS SQL Server connection using tiberius
///
/// The client lives behind an async mutex so the `&self` receivers of
/// `Connection` can drive it; `close` takes it out, after which every call
/// fails with `BatchrunError::Closed`.
pub struct MssqlConnection {
    client: Mutex<Option<TdsClient>>,
    closed: AtomicBool,
    target: String,
}

impl MssqlConnection {
    /// Open a session described by `config`
    ///
    /// TCP connect, TLS negotiation, login and session setup together are
    /// bounded by `config.options.connect_timeout_secs`.
    #[tracing::instrument(skip(config), fields(target = %config.target()))]
    pub async fn connect(
        config: &ConnectionConfig,
    ) -> std::result::Result<Self, MssqlConnectionError> {
        if config.server.trim().is_empty() {
            return Err(MssqlConnectionError::ConnectionFailed(
                "no server address configured".to_string(),
            ));
        }

        let timeout_secs = config.options.connect_timeout_secs;
        tracing::debug!(
            encrypt = config.options.encrypt,
            trust_cert = config.options.trust_server_certificate,
            "connecting to MS SQL Server"
        );

        let client = tokio::time::timeout(Duration::from_secs(timeout_secs), open_session(config))
            .await
            .map_err(|_| MssqlConnectionError::Timeout(timeout_secs))??;

        tracing::debug!("successfully connected to MS SQL Server");

        Ok(Self {
            client: Mutex::new(Some(client)),
            closed: AtomicBool::new(false),
            target: config.target(),
        })
    }

    fn ensure_not_closed(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BatchrunError::Closed);
        }
        Ok(())
    }
}

/// Build the tiberius configuration for `host:port`
pub(crate) fn tiberius_config(config: &ConnectionConfig, host: &str, port: u16) -> Config {
    let mut tib = Config::new();
    tib.host(host);
    tib.port(port);
    tib.application_name(APPLICATION_NAME);

    if !config.database.is_empty() {
        tib.database(&config.database);
    }

    tib.authentication(AuthMethod::sql_server(&config.username, &config.password));

    if config.options.encrypt {
        tib.encryption(EncryptionLevel::Required);
    } else {
        tib.encryption(EncryptionLevel::NotSupported);
    }

    if config.options.trust_server_certificate {
        tib.trust_cert();
    }

    tib
}

async fn open_session(
    config: &ConnectionConfig,
) -> std::result::Result<TdsClient, MssqlConnectionError> {
    let mut client = match login(tiberius_config(config, &config.server, config.port)).await {
        Ok(client) => client,
        // Azure SQL gateways answer the first login with a redirect
        Err(MssqlConnectionError::Tiberius(tiberius::error::Error::Routing { host, port })) => {
            tracing::debug!(%host, port, "following server redirect");
            login(tiberius_config(config, &host, port)).await?
        }
        Err(e) => return Err(e),
    };

    if config.options.arith_abort {
        client
            .execute("SET ARITHABORT ON", &[])
            .await
            .map_err(|e| MssqlConnectionError::SessionSetup(e.to_string()))?;
    }

    Ok(client)
}

async fn login(tib: Config) -> std::result::Result<TdsClient, MssqlConnectionError> {
    let tcp = TcpStream::connect(tib.get_addr())
        .await
        .map_err(|e| MssqlConnectionError::ConnectionFailed(e.to_string()))?;

    tcp.set_nodelay(true)?;

    Client::connect(tib, tcp.compat_write())
        .await
        .map_err(classify_login_error)
}

/// Map a failed login handshake onto a connection error.
///
/// Redirects are passed through untouched so the caller can follow them.
pub(crate) fn classify_login_error(err: tiberius::error::Error) -> MssqlConnectionError {
    match err {
        tiberius::error::Error::Server(token) if token.code() == LOGIN_FAILED => {
            MssqlConnectionError::AuthenticationFailed(token.message().to_string())
        }
        err @ tiberius::error::Error::Routing { .. } => MssqlConnectionError::Tiberius(err),
        err => MssqlConnectionError::ConnectionFailed(err.to_string()),
    }
}

#[async_trait]
impl Connection for MssqlConnection {
    fn driver_name(&self) -> &str {
        "mssql"
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.ensure_not_closed()?;
        let start = std::time::Instant::now();

        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or(BatchrunError::Closed)?;

        let stream = if params.is_empty() {
            client.simple_query(sql).await
        } else {
            let tiberius_params = values_to_tiberius_params(params);
            let param_refs: Vec<&dyn tiberius::ToSql> = tiberius_params
                .iter()
                .map(|p| p as &dyn tiberius::ToSql)
                .collect();
            client.query(sql, &param_refs[..]).await
        };

        let stream = stream.map_err(|e| {
            tracing::debug!(error = %e, "batch rejected");
            BatchrunError::Query(e.to_string())
        })?;

        let mut result = collect_first_result_set(stream).await?;
        result.execution_time_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            row_count = result.rows.len(),
            duration_ms = result.execution_time_ms,
            "batch completed"
        );

        Ok(result)
    }

    async fn close(&self) -> Result<()> {
        let client = self.client.lock().await.take();
        self.closed.store(true, Ordering::SeqCst);

        match client {
            Some(client) => {
                client
                    .close()
                    .await
                    .map_err(|e| BatchrunError::Connection(e.to_string()))?;
                tracing::debug!(target = %self.target, "MS SQL Server connection closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Drain every result set of a stream, keeping the first one that has columns.
///
/// Errors raised by later statements only surface while draining, so the
/// stream is always consumed to the end.
async fn collect_first_result_set(mut stream: QueryStream<'_>) -> Result<QueryResult> {
    let mut result = QueryResult::empty();
    let mut captured: Option<usize> = None;

    while let Some(item) = stream
        .try_next()
        .await
        .map_err(|e| BatchrunError::Query(e.to_string()))?
    {
        match item {
            QueryItem::Metadata(meta) => {
                if captured.is_none() && !meta.columns().is_empty() {
                    captured = Some(meta.result_index());
                    result.columns = meta
                        .columns()
                        .iter()
                        .enumerate()
                        .map(|(idx, col)| tiberius_column_to_meta(col, idx))
                        .collect::<Vec<ColumnMeta>>();
                }
            }
            QueryItem::Row(row) => {
                if captured == Some(row.result_index()) {
                    let values = tiberius_row_to_values(row)?;
                    result.rows.push(Row::new(values));
                }
            }
        }
    }

    Ok(result)
}

impl std::fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("target", &self.target)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}
