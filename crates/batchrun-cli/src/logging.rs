//! Diagnostic logging for the batchrun binary
//!
//! Diagnostics always go to stderr so stdout carries only run progress.
//! `RUST_LOG` takes precedence over the built-in default filter.

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable text
    pub json: bool,

    /// Whether to include file/line information in logs
    pub include_location: bool,

    /// Default log level filter, used when RUST_LOG is unset
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            include_location: false,
            default_filter: "warn,batchrun_runner=info,batchrun_driver_mssql=info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn verbose() -> Self {
        Self {
            json: false,
            include_location: cfg!(debug_assertions),
            default_filter: "info,batchrun_core=debug,batchrun_params=debug,batchrun_runner=debug,batchrun_driver_mssql=debug,batchrun=debug,tiberius=info".to_string(),
        }
    }

    pub fn from_flags(verbose: bool, json: bool) -> Self {
        let base = if verbose { Self::verbose() } else { Self::default() };
        Self { json, ..base }
    }
}

/// Install the global subscriber. Fails if one is already set.
pub fn init(config: LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let layer = if config.json {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_location)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry().with(layer).try_init()?;

    tracing::debug!(json = config.json, "logging initialized");
    Ok(())
}
