//! MS SQL Server driver for batchrun
//!
//! This crate opens TDS sessions with tiberius and implements the
//! `Connection` and `ConnectionFactory` seams from `batchrun-core`.

mod connection;
mod convert;
mod driver;

#[cfg(test)]
mod connection_tests;
#[cfg(test)]
mod convert_tests;
#[cfg(test)]
mod driver_tests;

pub use connection::{MssqlConnection, MssqlConnectionError};
pub use driver::MssqlDriver;
