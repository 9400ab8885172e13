//! batchrun - run a GO-delimited SQL migration script against SQL Server

mod cli;
mod logging;
mod output;


use std::sync::Arc;

use anyhow::Context as _;
use batchrun_driver_mssql::MssqlDriver;
use batchrun_runner::{BatchExecutor, Orchestrator};
use clap::Parser;

use crate::cli::{Args, usage_hint};
use crate::logging::LoggingConfig;
use crate::output::ConsoleReporter;

fn main() {
    let dotenv = dotenvy::dotenv();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // help and version are written to stdout and are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = logging::init(LoggingConfig::from_flags(args.verbose, args.log_json)) {
        // logging is not available yet
        eprintln!("FATAL: failed to initialize logging: {e}");
        std::process::exit(1);
    }

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load .env file"),
    }

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "batchrun failed");
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> anyhow::Result<i32> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let config = args.connection_config();
    tracing::debug!(?config, script = %args.script.display(), "starting run");

    let executor = BatchExecutor::new().with_bindings(args.bindings());
    let orchestrator =
        Orchestrator::new(Arc::new(MssqlDriver::new()), config).with_executor(executor);

    let mut reporter = ConsoleReporter::new(std::io::stdout().lock(), args.max_rows);
    let result = runtime.block_on(orchestrator.run_path(&args.script, &mut reporter));

    if let Some(usage) = usage_hint(result.abort_reason()) {
        eprintln!("{usage}");
    }

    Ok(result.exit_code())
}
