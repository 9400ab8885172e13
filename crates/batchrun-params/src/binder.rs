//! SQL Parameter Binder
//!
//! Rewrites `:name` placeholders to SQL Server positional parameters and
//! collects the bound values in position order.

use std::collections::HashMap;

use batchrun_core::Value;
use thiserror::Error;

use crate::extractor::find_placeholders;

/// Errors that can occur during parameter binding.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindError {
    /// SQL Server accepts at most 2100 parameters per request.
    #[error("too many parameters: {0} (SQL Server allows at most 2100)")]
    TooManyParameters(usize),
}

/// Result type for parameter binding operations.
pub type BindResult<T> = Result<T, BindError>;

const MAX_PARAMETERS: usize = 2100;

/// SQL ready for execution together with its positional values.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    /// The SQL with placeholders converted to `@P1`, `@P2`, ...
    pub sql: String,
    /// The bound values; `values[n - 1]` belongs to `@Pn`.
    pub values: Vec<Value>,
}

/// Binds named parameters to SQL text.
///
/// Each distinct name gets one position, assigned in order of first
/// occurrence, so a name used twice references the same `@Pn`.
///
/// Only names present in `params` are rewritten. Any other `:name` text, such
/// as a statement label (`done:`) followed by a keyword, is left as written,
/// and bindings whose name does not appear in the SQL are ignored.
///
/// ```
/// use std::collections::HashMap;
/// use batchrun_core::Value;
/// use batchrun_params::bind_named;
///
/// let mut params = HashMap::new();
/// params.insert("id".to_string(), Value::Int64(42));
///
/// let bound = bind_named("DELETE FROM Sessions WHERE UserId = :id OR OwnerId = :id", &params).unwrap();
/// assert_eq!(bound.sql, "DELETE FROM Sessions WHERE UserId = @P1 OR OwnerId = @P1");
/// assert_eq!(bound.values, vec![Value::Int64(42)]);
/// ```
pub fn bind_named(sql: &str, params: &HashMap<String, Value>) -> BindResult<BoundStatement> {
    let placeholders = find_placeholders(sql);

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut values: Vec<Value> = Vec::new();
    let mut result = String::with_capacity(sql.len());
    let mut last_end = 0;

    for placeholder in &placeholders {
        let position = match positions.get(placeholder.name.as_str()) {
            Some(&pos) => pos,
            None => {
                let Some(value) = params.get(&placeholder.name) else {
                    continue;
                };
                values.push(value.clone());
                positions.insert(&placeholder.name, values.len());
                values.len()
            }
        };

        result.push_str(&sql[last_end..placeholder.start]);
        result.push_str(&format!("@P{}", position));
        last_end = placeholder.end;
    }

    if values.len() > MAX_PARAMETERS {
        return Err(BindError::TooManyParameters(values.len()));
    }

    result.push_str(&sql[last_end..]);

    Ok(BoundStatement {
        sql: result,
        values,
    })
}
