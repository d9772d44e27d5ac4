//! Normalized column values.
//!
//! # Responsibility
//! - Represent one column value before and after normalization.
//! - Convert between SQLite storage values and domain values.
//!
//! # Invariants
//! - Datetimes are always UTC and stored as `YYYY-MM-DD HH:MM:SS` text.
//! - Booleans are stored as `0`/`1` integers.
//! - `Null` is the only representation of an unset column.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rusqlite::types::Value as SqlValue;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Text layout used for datetime columns in storage.
pub const STORAGE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Semantic type a column is normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    Boolean,
    DateTime,
}

impl ColumnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
        }
    }
}

impl Display for ColumnKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column value.
///
/// Serialized untagged, so JSON output carries plain scalars and RFC 3339
/// datetimes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    DateTime(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(value) => Some(*value),
            _ => None,
        }
    }

    /// Converts a raw SQLite value. Blobs are read as lossy UTF-8 text.
    pub fn from_sql(value: SqlValue) -> Self {
        match value {
            SqlValue::Null => Self::Null,
            SqlValue::Integer(value) => Self::Integer(value),
            SqlValue::Real(value) => Self::Float(value),
            SqlValue::Text(value) => Self::Text(value),
            SqlValue::Blob(bytes) => Self::Text(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// Converts into the SQLite storage representation.
    pub fn to_sql(&self) -> SqlValue {
        match self {
            Self::Null => SqlValue::Null,
            Self::Integer(value) => SqlValue::Integer(*value),
            Self::Float(value) => SqlValue::Real(*value),
            Self::Text(value) => SqlValue::Text(value.clone()),
            Self::Boolean(value) => SqlValue::Integer(i64::from(*value)),
            Self::DateTime(value) => {
                SqlValue::Text(value.format(STORAGE_DATETIME_FORMAT).to_string())
            }
        }
    }

    /// Coerces this value into `kind`.
    ///
    /// Returns `None` when the raw value has no sensible reading as `kind`.
    /// `Null` coerces to `Null` for every kind.
    pub fn coerce(self, kind: ColumnKind) -> Option<Self> {
        if self.is_null() {
            return Some(Self::Null);
        }

        match kind {
            ColumnKind::Integer => coerce_integer(self),
            ColumnKind::Float => coerce_float(self),
            ColumnKind::Text => Some(coerce_text(self)),
            ColumnKind::Boolean => coerce_boolean(self),
            ColumnKind::DateTime => coerce_datetime(self),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::DateTime(value) => write!(f, "{}", value.format(STORAGE_DATETIME_FORMAT)),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

fn coerce_integer(value: Value) -> Option<Value> {
    match value {
        Value::Integer(_) => Some(value),
        Value::Boolean(flag) => Some(Value::Integer(i64::from(flag))),
        Value::Float(number)
            if number.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&number) =>
        {
            Some(Value::Integer(number as i64))
        }
        Value::Text(text) => text.trim().parse::<i64>().ok().map(Value::Integer),
        _ => None,
    }
}

fn coerce_float(value: Value) -> Option<Value> {
    match value {
        Value::Float(_) => Some(value),
        Value::Integer(number) => Some(Value::Float(number as f64)),
        Value::Text(text) => text.trim().parse::<f64>().ok().map(Value::Float),
        _ => None,
    }
}

fn coerce_text(value: Value) -> Value {
    match value {
        Value::Text(_) => value,
        other => Value::Text(other.to_string()),
    }
}

fn coerce_boolean(value: Value) -> Option<Value> {
    match value {
        Value::Boolean(_) => Some(value),
        Value::Integer(number) => Some(Value::Boolean(number != 0)),
        Value::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(Value::Boolean(true)),
            "" | "0" | "false" | "no" | "off" => Some(Value::Boolean(false)),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_datetime(value: Value) -> Option<Value> {
    match value {
        Value::DateTime(_) => Some(value),
        Value::Integer(seconds) => Utc.timestamp_opt(seconds, 0).single().map(Value::DateTime),
        Value::Text(text) => parse_datetime(text.trim()).map(Value::DateTime),
        _ => None,
    }
}

/// Parses storage text, `T`-separated local-less text, or RFC 3339.
///
/// Naive inputs are read as UTC.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in [STORAGE_DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{parse_datetime, ColumnKind, Value};
    use chrono::{TimeZone, Utc};
    use rusqlite::types::Value as SqlValue;

    #[test]
    fn coerces_numeric_text_into_integer() {
        assert_eq!(
            Value::from(" 42 ").coerce(ColumnKind::Integer),
            Some(Value::Integer(42))
        );
        assert_eq!(Value::from("4x").coerce(ColumnKind::Integer), None);
    }

    #[test]
    fn whole_floats_become_integers_only_within_range() {
        assert_eq!(
            Value::Float(-3.0).coerce(ColumnKind::Integer),
            Some(Value::Integer(-3))
        );
        assert_eq!(Value::Float(1e30).coerce(ColumnKind::Integer), None);
        assert_eq!(Value::Float(-1e30).coerce(ColumnKind::Integer), None);
        assert_eq!(Value::Float(2.5).coerce(ColumnKind::Integer), None);
    }

    #[test]
    fn coerces_storage_text_into_utc_datetime() {
        let expected = Utc.with_ymd_and_hms(2016, 10, 22, 9, 0, 0).unwrap();
        assert_eq!(
            Value::from("2016-10-22 09:00:00").coerce(ColumnKind::DateTime),
            Some(Value::DateTime(expected))
        );
        assert_eq!(
            parse_datetime("2016-10-22T11:00:00+02:00"),
            Some(expected),
            "offsets are folded into UTC"
        );
    }

    #[test]
    fn coerces_flags_into_booleans() {
        assert_eq!(
            Value::Integer(1).coerce(ColumnKind::Boolean),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            Value::from("off").coerce(ColumnKind::Boolean),
            Some(Value::Boolean(false))
        );
        assert_eq!(Value::from("maybe").coerce(ColumnKind::Boolean), None);
    }

    #[test]
    fn null_survives_every_kind() {
        for kind in [
            ColumnKind::Integer,
            ColumnKind::Float,
            ColumnKind::Text,
            ColumnKind::Boolean,
            ColumnKind::DateTime,
        ] {
            assert_eq!(Value::Null.coerce(kind), Some(Value::Null));
        }
    }

    #[test]
    fn storage_representation_uses_text_datetimes_and_integer_flags() {
        let instant = Utc.with_ymd_and_hms(2019, 10, 26, 18, 30, 0).unwrap();
        assert_eq!(
            Value::DateTime(instant).to_sql(),
            SqlValue::Text("2019-10-26 18:30:00".to_string())
        );
        assert_eq!(Value::Boolean(true).to_sql(), SqlValue::Integer(1));
        assert_eq!(Value::from_sql(SqlValue::Real(7.68)), Value::Float(7.68));
    }
}
