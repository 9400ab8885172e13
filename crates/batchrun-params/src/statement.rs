//! Parameterized statements

use std::collections::HashMap;

use batchrun_core::Value;

use crate::binder::{BindResult, BoundStatement, bind_named};

/// SQL text with named bindings
///
/// This is the only shape in which SQL reaches a connection: values are
/// always carried as typed bindings, never spliced into the text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    sql: String,
    bindings: HashMap<String, Value>,
}

impl Statement {
    /// Create a statement with no bindings
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: HashMap::new(),
        }
    }

    /// Bind a value to `:name`, replacing any previous binding
    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bindings.insert(name.into(), value);
        self
    }

    /// Bind every entry of `bindings`
    pub fn bind_all(mut self, bindings: &HashMap<String, Value>) -> Self {
        self.bindings
            .extend(bindings.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// The SQL text as written
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The named bindings
    pub fn bindings(&self) -> &HashMap<String, Value> {
        &self.bindings
    }

    /// Resolve placeholders into positional form
    pub fn to_bound(&self) -> BindResult<BoundStatement> {
        bind_named(&self.sql, &self.bindings)
    }

    /// Consuming variant of [`Statement::to_bound`]
    pub fn into_bound(self) -> BindResult<BoundStatement> {
        self.to_bound()
    }
}
