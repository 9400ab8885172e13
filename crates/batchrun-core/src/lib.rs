//! batchrun core - shared abstractions for the migration batch runner
//!
//! This crate provides the traits and types every other batchrun crate
//! depends on:
//!
//! - `Connection` - an open database session a batch can run against
//! - `ConnectionFactory` - the seam that turns a `ConnectionConfig` into a `Connection`
//! - `ConnectionConfig` / `TransportOptions` - immutable per-run connection settings
//! - Common types like `Value`, `Row`, `ColumnMeta` and `QueryResult`

mod config;
mod connection;
mod error;
mod types;


pub use config::*;
pub use connection::*;
pub use error::*;
pub use types::*;
