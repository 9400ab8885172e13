//! batchrun params - named parameter binding for SQL Server batches
//!
//! Every batch reaches the database as a [`Statement`]: SQL text plus named
//! bindings to typed values. Named placeholders are written `:name` and are
//! rewritten to SQL Server positional parameters (`@P1`, `@P2`, ...) before
//! execution, so variable data never gets concatenated into SQL text.
//!
//! Only names that have a binding are rewritten. T-SQL's own `@variable`
//! syntax is left alone, as is `:name` text inside string literals, quoted or
//! bracketed identifiers, comments, and `::` scope qualifiers (`SCHEMA::dbo`).
//!
//! # Example
//!
//! ```
//! use batchrun_core::Value;
//! use batchrun_params::Statement;
//!
//! let statement = Statement::new("UPDATE plans SET status = :status WHERE id = :id")
//!     .bind("status", Value::String("active".into()))
//!     .bind("id", Value::Int64(7));
//!
//! let bound = statement.into_bound().unwrap();
//! assert_eq!(bound.sql, "UPDATE plans SET status = @P1 WHERE id = @P2");
//! assert_eq!(bound.values.len(), 2);
//! ```

mod binder;
mod extractor;
mod statement;

#[cfg(test)]
mod tests;

pub use binder::{BindError, BindResult, BoundStatement, bind_named};
pub use extractor::extract_placeholders;
pub use statement::Statement;
