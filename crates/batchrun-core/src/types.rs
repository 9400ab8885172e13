//! Values and result sets exchanged between drivers, the runner and the CLI

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

/// A typed SQL Server value, used both for bound parameters and result cells
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// BIT
    Bool(bool),
    /// SMALLINT, and TINYINT widened
    Int16(i16),
    /// INT
    Int32(i32),
    /// BIGINT, and every integer given on the command line
    Int64(i64),
    /// REAL
    Float32(f32),
    /// FLOAT
    Float64(f64),
    /// DECIMAL/NUMERIC/MONEY as exact text
    Decimal(String),
    /// Any character type
    String(String),
    /// BINARY/VARBINARY
    Bytes(Vec<u8>),
    /// UNIQUEIDENTIFIER
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    /// DATETIME, SMALLDATETIME and DATETIME2
    DateTime(NaiveDateTime),
    /// DATETIMEOFFSET normalized to UTC
    DateTimeUtc(DateTime<Utc>),
}

impl Value {
    /// Infer a typed value from command-line text.
    ///
    /// `null` (any case) is NULL, `true`/`false` are booleans, then integers
    /// and floats are tried in that order; everything else stays a string.
    pub fn infer(text: &str) -> Self {
        if text.eq_ignore_ascii_case("null") {
            return Value::Null;
        }
        if text.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if text.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if let Ok(v) = text.parse::<i64>() {
            return Value::Int64(v);
        }
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => Value::Float64(v),
            _ => Value::String(text.to_string()),
        }
    }
}

/// Cell text as shown in result tables
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Decimal(v) | Value::String(v) => f.write_str(v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Time(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "{v}"),
            Value::DateTimeUtc(v) => write!(f, "{v}"),
        }
    }
}

/// One row of a result set, cells in column order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnMeta {
    /// Column name, empty for unnamed expressions such as `SELECT 1`
    pub name: String,
    /// Server type name as reported by the driver
    pub data_type: String,
    /// 0-based position
    pub ordinal: usize,
}

/// The result set a batch produced, if any, and how long the batch took
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Row>,
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// A result with no columns, as returned by DDL and DML batches
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
