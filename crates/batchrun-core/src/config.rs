//! Connection configuration

/// Default SQL Server port
pub const DEFAULT_PORT: u16 = 1433;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Transport options fixed for the lifetime of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    /// Require an encrypted (TLS) session
    pub encrypt: bool,
    /// Accept the server certificate without validating its chain
    pub trust_server_certificate: bool,
    /// Issue `SET ARITHABORT ON` right after login
    pub arith_abort: bool,
    /// Upper bound for TCP connect plus login, in seconds
    pub connect_timeout_secs: u64,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            encrypt: true,
            trust_server_certificate: false,
            arith_abort: true,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Database connection parameters for one run
///
/// Missing values are kept as empty strings; an unusable configuration
/// surfaces as a connection failure rather than a validation error.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server host name or address
    pub server: String,
    /// TCP port
    pub port: u16,
    /// Database name
    pub database: String,
    /// SQL login name
    pub username: String,
    /// SQL login password
    pub password: String,
    /// Transport options
    pub options: TransportOptions,
}

impl ConnectionConfig {
    /// Create a configuration with the default port and transport options
    pub fn new(server: &str, database: &str, username: &str, password: &str) -> Self {
        Self {
            server: server.to_string(),
            port: DEFAULT_PORT,
            database: database.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            options: TransportOptions::default(),
        }
    }

    /// Set the TCP port (0 selects the default port)
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = if port == 0 { DEFAULT_PORT } else { port };
        self
    }

    /// Replace the transport options
    pub fn with_options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    /// `server:port/database`, safe to log
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.server, self.port, self.database)
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}
