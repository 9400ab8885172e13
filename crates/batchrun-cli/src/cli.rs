//! Command-line arguments
//!
//! Connection settings come from flags or, more commonly, from the `DB_*`
//! environment variables (a `.env` file is loaded before parsing). Missing
//! connection values default to empty and surface as a connection failure.

use std::collections::HashMap;
use std::path::PathBuf;

use batchrun_core::{
    ConnectionConfig, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_PORT, TransportOptions, Value,
};
use batchrun_runner::RunnerError;
use clap::{ArgAction, CommandFactory, Parser};

#[derive(Debug, Parser)]
#[command(
    name = "batchrun",
    version,
    about = "Run a GO-delimited SQL script against SQL Server, batch by batch"
)]
pub struct Args {
    /// Path to the SQL script
    pub script: PathBuf,

    /// Server host name or address
    #[arg(long, env = "DB_SERVER", default_value = "", hide_env_values = true)]
    pub server: String,

    #[arg(long, env = "DB_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Database to run the script in
    #[arg(long, env = "DB_NAME", default_value = "")]
    pub database: String,

    #[arg(long, env = "DB_USER", default_value = "")]
    pub user: String,

    #[arg(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Require TLS for the connection
    #[arg(long, env = "DB_ENCRYPT", default_value_t = true, action = ArgAction::Set)]
    pub encrypt: bool,

    /// Accept any server certificate
    #[arg(long, env = "DB_TRUST_SERVER_CERTIFICATE", default_value_t = false, action = ArgAction::Set)]
    pub trust_server_certificate: bool,

    /// Run SET ARITHABORT ON after login
    #[arg(long, env = "DB_ARITHABORT", default_value_t = true, action = ArgAction::Set)]
    pub arithabort: bool,

    /// Connect timeout in seconds, covering TCP connect and login
    #[arg(long, env = "DB_CONNECT_TIMEOUT", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout: u64,

    /// Bind a named parameter for every batch, e.g. --var tenant=42
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
    pub vars: Vec<(String, Value)>,

    /// Maximum rows printed per result set
    #[arg(long, default_value_t = 100)]
    pub max_rows: usize,

    /// Debug-level diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Diagnostics as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    pub fn connection_config(&self) -> ConnectionConfig {
        let options = TransportOptions {
            encrypt: self.encrypt,
            trust_server_certificate: self.trust_server_certificate,
            arith_abort: self.arithabort,
            connect_timeout_secs: self.connect_timeout,
        };

        ConnectionConfig::new(&self.server, &self.database, &self.user, &self.password)
            .with_port(self.port)
            .with_options(options)
    }

    /// `--var` bindings; a repeated name keeps its last value
    pub fn bindings(&self) -> HashMap<String, Value> {
        self.vars.iter().cloned().collect()
    }
}

/// Usage line to print when a run aborted because its script path does not
/// exist, matching what clap shows for a missing argument
pub fn usage_hint(reason: Option<&RunnerError>) -> Option<String> {
    match reason {
        Some(RunnerError::ScriptNotFound(_)) => {
            Some(Args::command().render_usage().to_string())
        }
        _ => None,
    }
}

fn parse_binding(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;

    let name = name.trim().trim_start_matches(':');
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(format!("invalid parameter name `{name}`"));
    }

    Ok((name.to_string(), Value::infer(value)))
}
