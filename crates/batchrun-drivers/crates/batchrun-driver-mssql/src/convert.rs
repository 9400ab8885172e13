//! Conversions between tiberius wire types and batchrun values

use batchrun_core::{BatchrunError, ColumnMeta, Result, Value};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::borrow::Cow;
use tiberius::{ColumnData, Row as TiberiusRow, ToSql};

/// Convert a tiberius column to ColumnMeta
pub(crate) fn tiberius_column_to_meta(col: &tiberius::Column, ordinal: usize) -> ColumnMeta {
    ColumnMeta {
        name: col.name().to_string(),
        data_type: format!("{:?}", col.column_type()),
        ordinal,
    }
}

/// Convert a tiberius row to a vector of Values by consuming the row
pub(crate) fn tiberius_row_to_values(row: TiberiusRow) -> Result<Vec<Value>> {
    row.into_iter().map(column_data_to_value).collect()
}

fn base_date(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| BatchrunError::Driver(format!("invalid base year {}", year)))
}

fn days_after(year: i32, days: i64) -> Result<NaiveDate> {
    base_date(year)?
        .checked_add_signed(Duration::days(days))
        .ok_or_else(|| BatchrunError::Driver(format!("date out of range: {} days", days)))
}

/// TIME/DATETIME2 count `10^-scale` second increments since midnight
pub(crate) fn time_from_increments(increments: u64, scale: u8) -> NaiveTime {
    let nanos = increments as u128 * 10u128.pow(9 - u32::from(scale.min(9)));
    NaiveTime::from_num_seconds_from_midnight_opt(
        (nanos / 1_000_000_000) as u32,
        (nanos % 1_000_000_000) as u32,
    )
    .unwrap_or_default()
}

/// Convert tiberius ColumnData to a batchrun Value
pub(crate) fn column_data_to_value(col_data: ColumnData<'static>) -> Result<Value> {
    match col_data {
        ColumnData::Bit(None)
        | ColumnData::U8(None)
        | ColumnData::I16(None)
        | ColumnData::I32(None)
        | ColumnData::I64(None)
        | ColumnData::F32(None)
        | ColumnData::F64(None)
        | ColumnData::String(None)
        | ColumnData::Guid(None)
        | ColumnData::Binary(None)
        | ColumnData::Numeric(None)
        | ColumnData::Xml(None)
        | ColumnData::DateTime(None)
        | ColumnData::SmallDateTime(None)
        | ColumnData::DateTime2(None)
        | ColumnData::DateTimeOffset(None)
        | ColumnData::Date(None)
        | ColumnData::Time(None) => Ok(Value::Null),
        ColumnData::Bit(Some(v)) => Ok(Value::Bool(v)),
        ColumnData::U8(Some(v)) => Ok(Value::Int16(v as i16)),
        ColumnData::I16(Some(v)) => Ok(Value::Int16(v)),
        ColumnData::I32(Some(v)) => Ok(Value::Int32(v)),
        ColumnData::I64(Some(v)) => Ok(Value::Int64(v)),
        ColumnData::F32(Some(v)) => Ok(Value::Float32(v)),
        ColumnData::F64(Some(v)) => Ok(Value::Float64(v)),
        ColumnData::String(Some(v)) => Ok(Value::String(v.into_owned())),
        ColumnData::Guid(Some(v)) => Ok(Value::Uuid(v)),
        ColumnData::Binary(Some(v)) => Ok(Value::Bytes(v.into_owned())),
        ColumnData::Numeric(Some(v)) => Ok(Value::Decimal(v.to_string())),
        ColumnData::Xml(Some(v)) => Ok(Value::String(v.into_owned().into_string())),
        ColumnData::DateTime(Some(v)) => {
            // 1/300 second fragments since midnight
            let time = NaiveTime::from_num_seconds_from_midnight_opt(
                (v.seconds_fragments() / 300) as u32,
                ((v.seconds_fragments() % 300) as u64 * 1_000_000_000 / 300) as u32,
            )
            .unwrap_or_default();
            Ok(Value::DateTime(NaiveDateTime::new(
                days_after(1900, v.days() as i64)?,
                time,
            )))
        }
        ColumnData::SmallDateTime(Some(v)) => {
            let time = NaiveTime::from_num_seconds_from_midnight_opt(
                (v.seconds_fragments() as u32) * 60,
                0,
            )
            .unwrap_or_default();
            Ok(Value::DateTime(NaiveDateTime::new(
                days_after(1900, v.days() as i64)?,
                time,
            )))
        }
        ColumnData::DateTime2(Some(v)) => Ok(Value::DateTime(NaiveDateTime::new(
            days_after(1, v.date().days() as i64)?,
            time_from_increments(v.time().increments(), v.time().scale()),
        ))),
        ColumnData::DateTimeOffset(Some(v)) => {
            let dt2 = v.datetime2();
            let naive = NaiveDateTime::new(
                days_after(1, dt2.date().days() as i64)?,
                time_from_increments(dt2.time().increments(), dt2.time().scale()),
            );
            Ok(Value::DateTimeUtc(naive.and_utc()))
        }
        ColumnData::Date(Some(v)) => Ok(Value::Date(days_after(1, v.days() as i64)?)),
        ColumnData::Time(Some(v)) => Ok(Value::Time(time_from_increments(v.increments(), v.scale()))),
    }
}

/// Container for tiberius parameter values
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TiberiusParam {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeUtc(chrono::DateTime<chrono::Utc>),
}

impl ToSql for TiberiusParam {
    fn to_sql(&self) -> ColumnData<'_> {
        match self {
            TiberiusParam::Null => ColumnData::I32(None),
            TiberiusParam::Bool(v) => ColumnData::Bit(Some(*v)),
            TiberiusParam::I16(v) => ColumnData::I16(Some(*v)),
            TiberiusParam::I32(v) => ColumnData::I32(Some(*v)),
            TiberiusParam::I64(v) => ColumnData::I64(Some(*v)),
            TiberiusParam::F32(v) => ColumnData::F32(Some(*v)),
            TiberiusParam::F64(v) => ColumnData::F64(Some(*v)),
            TiberiusParam::String(v) => ColumnData::String(Some(Cow::Borrowed(v.as_str()))),
            TiberiusParam::Bytes(v) => ColumnData::Binary(Some(Cow::Borrowed(v.as_slice()))),
            TiberiusParam::Uuid(v) => ColumnData::Guid(Some(*v)),
            TiberiusParam::Date(v) => v.to_sql(),
            TiberiusParam::Time(v) => v.to_sql(),
            TiberiusParam::DateTime(v) => v.to_sql(),
            TiberiusParam::DateTimeUtc(v) => v.to_sql(),
        }
    }
}

/// Convert batchrun Values to tiberius parameters, preserving order
pub(crate) fn values_to_tiberius_params(values: &[Value]) -> Vec<TiberiusParam> {
    values
        .iter()
        .map(|v| match v {
            Value::Null => TiberiusParam::Null,
            Value::Bool(b) => TiberiusParam::Bool(*b),
            Value::Int16(i) => TiberiusParam::I16(*i),
            Value::Int32(i) => TiberiusParam::I32(*i),
            Value::Int64(i) => TiberiusParam::I64(*i),
            Value::Float32(f) => TiberiusParam::F32(*f),
            Value::Float64(f) => TiberiusParam::F64(*f),
            // The server converts the text to the target column's precision
            Value::Decimal(d) => TiberiusParam::String(d.clone()),
            Value::String(s) => TiberiusParam::String(s.clone()),
            Value::Bytes(b) => TiberiusParam::Bytes(b.clone()),
            Value::Uuid(u) => TiberiusParam::Uuid(*u),
            Value::Date(d) => TiberiusParam::Date(*d),
            Value::Time(t) => TiberiusParam::Time(*t),
            Value::DateTime(dt) => TiberiusParam::DateTime(*dt),
            Value::DateTimeUtc(dt) => TiberiusParam::DateTimeUtc(*dt),
        })
        .collect()
}
