//! Attribute store: the typed column mapping behind every record.
//!
//! # Responsibility
//! - Hold one value per declared column of a record type.
//! - Coerce raw input into the semantic type declared by `mark_*` passes.
//!
//! # Invariants
//! - Every column of `C::ALL` is present; unset columns are `Value::Null`.
//! - After a `mark_*` pass, later `set` calls coerce into the same kind, so a
//!   column's runtime type never drifts.
//! - Columns without a declared kind are text once normalized.
//! - Unknown column names are rejected with `AttributeError::UnknownColumn`.

use crate::model::value::{ColumnKind, Value};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter, Write};

static NULL_VALUE: Value = Value::Null;

pub type AttributeResult<T> = Result<T, AttributeError>;

/// Closed set of columns owned by one table.
///
/// Implemented by the per-entity column enums declared with
/// `record_columns!`.
pub trait Column: Copy + Ord + Debug + 'static {
    /// Table owning these columns.
    const TABLE: &'static str;
    /// Every column, in storage order.
    const ALL: &'static [Self];

    /// Storage column name.
    fn name(self) -> &'static str;

    /// Resolves a storage column name.
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|column| column.name() == name)
    }
}

/// Errors raised by the normalization layer.
///
/// All variants indicate a mismatch between code and schema/input and are
/// not meant to be recovered from.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeError {
    UnknownColumn {
        table: &'static str,
        column: String,
    },
    MissingValue {
        table: &'static str,
        column: &'static str,
    },
    InvalidValue {
        table: &'static str,
        column: &'static str,
        expected: ColumnKind,
        value: String,
    },
    InvalidFormat {
        table: &'static str,
        column: &'static str,
        format: String,
    },
}

impl Display for AttributeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownColumn { table, column } => {
                write!(f, "unknown column `{column}` for table `{table}`")
            }
            Self::MissingValue { table, column } => {
                write!(f, "missing value for `{table}.{column}`")
            }
            Self::InvalidValue {
                table,
                column,
                expected,
                value,
            } => write!(
                f,
                "value `{value}` for `{table}.{column}` is not a valid {expected}"
            ),
            Self::InvalidFormat {
                table,
                column,
                format,
            } => write!(f, "cannot format `{table}.{column}` with `{format}`"),
        }
    }
}

impl Error for AttributeError {}

/// Typed key-value holder for one record's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeStore<C: Column> {
    values: BTreeMap<C, Value>,
    kinds: BTreeMap<C, ColumnKind>,
}

impl<C: Column> Default for AttributeStore<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Column> AttributeStore<C> {
    /// Creates a store with every column set to `Null`.
    pub fn new() -> Self {
        Self {
            values: C::ALL.iter().map(|column| (*column, Value::Null)).collect(),
            kinds: BTreeMap::new(),
        }
    }

    /// Returns the current value; never absent.
    pub fn get(&self, column: C) -> &Value {
        self.values.get(&column).unwrap_or(&NULL_VALUE)
    }

    /// Returns the current value or fails when it is `Null`.
    pub fn get_non_null(&self, column: C) -> AttributeResult<&Value> {
        let value = self.get(column);
        if value.is_null() {
            return Err(AttributeError::MissingValue {
                table: C::TABLE,
                column: column.name(),
            });
        }
        Ok(value)
    }

    /// Declared kind, `Text` when no pass declared one.
    pub fn kind(&self, column: C) -> ColumnKind {
        self.kinds.get(&column).copied().unwrap_or(ColumnKind::Text)
    }

    /// Sets a column, coercing `raw` into the column's declared kind.
    pub fn set(&mut self, column: C, raw: impl Into<Value>) -> AttributeResult<()> {
        let normalized = coerce_for(column, self.kind(column), raw.into())?;
        self.values.insert(column, normalized);
        Ok(())
    }

    /// Sets a column by its storage name.
    pub fn set_by_name(&mut self, name: &str, raw: impl Into<Value>) -> AttributeResult<C> {
        let column = resolve::<C>(name)?;
        self.set(column, raw)?;
        Ok(column)
    }

    /// Stores a value exactly as read from storage, before normalization.
    pub(crate) fn load_raw(&mut self, name: &str, raw: Value) -> AttributeResult<C> {
        let column = resolve::<C>(name)?;
        self.values.insert(column, raw);
        Ok(column)
    }

    pub fn mark_integers(&mut self, columns: &[C]) -> AttributeResult<()> {
        self.mark(columns, ColumnKind::Integer)
    }

    pub fn mark_floats(&mut self, columns: &[C]) -> AttributeResult<()> {
        self.mark(columns, ColumnKind::Float)
    }

    pub fn mark_datetimes(&mut self, columns: &[C]) -> AttributeResult<()> {
        self.mark(columns, ColumnKind::DateTime)
    }

    pub fn mark_booleans(&mut self, columns: &[C]) -> AttributeResult<()> {
        self.mark(columns, ColumnKind::Boolean)
    }

    /// Coerces every column without a declared kind into text.
    ///
    /// Runs last in every record's normalization.
    pub fn mark_remaining_as_text(&mut self) -> AttributeResult<()> {
        let pending = C::ALL
            .iter()
            .copied()
            .filter(|column| !self.kinds.contains_key(column))
            .collect::<Vec<_>>();
        self.mark(&pending, ColumnKind::Text)
    }

    pub fn integer(&self, column: C) -> Option<i64> {
        self.get(column).as_i64()
    }

    pub fn float(&self, column: C) -> Option<f64> {
        self.get(column).as_f64()
    }

    pub fn text(&self, column: C) -> Option<&str> {
        self.get(column).as_str()
    }

    /// Boolean value; `Null` reads as `false`.
    pub fn boolean(&self, column: C) -> bool {
        self.get(column).as_bool().unwrap_or(false)
    }

    pub fn datetime(&self, column: C) -> Option<DateTime<Utc>> {
        self.get(column).as_datetime()
    }

    pub fn required_integer(&self, column: C) -> AttributeResult<i64> {
        let value = self.get_non_null(column)?;
        value.as_i64().ok_or_else(|| wrong_kind(column, ColumnKind::Integer, value))
    }

    pub fn required_text(&self, column: C) -> AttributeResult<&str> {
        let value = self.get_non_null(column)?;
        value.as_str().ok_or_else(|| wrong_kind(column, ColumnKind::Text, value))
    }

    pub fn required_datetime(&self, column: C) -> AttributeResult<DateTime<Utc>> {
        let value = self.get_non_null(column)?;
        value
            .as_datetime()
            .ok_or_else(|| wrong_kind(column, ColumnKind::DateTime, value))
    }

    /// Required datetime rendered with a `chrono` format string.
    ///
    /// Unknown specifiers fail with `InvalidFormat` instead of panicking.
    pub fn formatted_datetime(&self, column: C, format: &str) -> AttributeResult<String> {
        let value = self.required_datetime(column)?;
        let mut rendered = String::new();
        write!(rendered, "{}", value.format(format)).map_err(|_| {
            AttributeError::InvalidFormat {
                table: C::TABLE,
                column: column.name(),
                format: format.to_string(),
            }
        })?;
        Ok(rendered)
    }

    /// Iterates columns in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (C, &Value)> {
        C::ALL.iter().map(move |column| (*column, self.get(*column)))
    }

    fn mark(&mut self, columns: &[C], kind: ColumnKind) -> AttributeResult<()> {
        for column in columns {
            let normalized = coerce_for(*column, kind, self.get(*column).clone())?;
            self.values.insert(*column, normalized);
            self.kinds.insert(*column, kind);
        }
        Ok(())
    }
}

impl<C: Column> Serialize for AttributeStore<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(C::ALL.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column.name(), value)?;
        }
        map.end()
    }
}

fn resolve<C: Column>(name: &str) -> AttributeResult<C> {
    C::from_name(name).ok_or_else(|| AttributeError::UnknownColumn {
        table: C::TABLE,
        column: name.to_string(),
    })
}

fn coerce_for<C: Column>(column: C, kind: ColumnKind, raw: Value) -> AttributeResult<Value> {
    let shown = raw.to_string();
    raw.coerce(kind).ok_or(AttributeError::InvalidValue {
        table: C::TABLE,
        column: column.name(),
        expected: kind,
        value: shown,
    })
}

fn wrong_kind<C: Column>(column: C, expected: ColumnKind, value: &Value) -> AttributeError {
    AttributeError::InvalidValue {
        table: C::TABLE,
        column: column.name(),
        expected,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeError, AttributeStore, Column};
    use crate::model::value::{ColumnKind, Value};
    use chrono::{TimeZone, Utc};

    record_columns! {
        enum Sample in "sample" {
            Id => "sample_ID",
            Label => "sample_label",
            When => "sample_when",
            Enabled => "sample_enabled",
        }
    }

    fn normalized(raw: &[(&str, Value)]) -> AttributeStore<Sample> {
        let mut store = AttributeStore::<Sample>::new();
        for (name, value) in raw {
            store.load_raw(name, value.clone()).expect("known column");
        }
        store.mark_integers(&[Sample::Id]).unwrap();
        store.mark_datetimes(&[Sample::When]).unwrap();
        store.mark_booleans(&[Sample::Enabled]).unwrap();
        store.mark_remaining_as_text().unwrap();
        store
    }

    #[test]
    fn unset_columns_are_null_not_absent() {
        let store = AttributeStore::<Sample>::new();
        assert_eq!(store.iter().count(), Sample::ALL.len());
        assert!(store.get(Sample::Label).is_null());
    }

    #[test]
    fn mark_passes_coerce_raw_text() {
        let store = normalized(&[
            ("sample_ID", Value::from("7")),
            ("sample_when", Value::from("2016-10-22 18:00:00")),
            ("sample_enabled", Value::Integer(1)),
            ("sample_label", Value::from("lab")),
        ]);

        assert_eq!(store.integer(Sample::Id), Some(7));
        assert_eq!(
            store.datetime(Sample::When),
            Some(Utc.with_ymd_and_hms(2016, 10, 22, 18, 0, 0).unwrap())
        );
        assert!(store.boolean(Sample::Enabled));
        assert_eq!(store.text(Sample::Label), Some("lab"));
    }

    #[test]
    fn set_after_normalization_keeps_declared_kind() {
        let mut store = normalized(&[]);
        store.set(Sample::Id, "12").unwrap();
        store.set(Sample::Label, 99_i64).unwrap();

        assert_eq!(store.get(Sample::Id), &Value::Integer(12));
        assert_eq!(store.get(Sample::Label), &Value::Text("99".to_string()));
        assert_eq!(store.kind(Sample::When), ColumnKind::DateTime);
    }

    #[test]
    fn rejects_unknown_column_names() {
        let mut store = normalized(&[]);
        let err = store.set_by_name("sample_lable", "typo").unwrap_err();
        assert_eq!(
            err,
            AttributeError::UnknownColumn {
                table: "sample",
                column: "sample_lable".to_string(),
            }
        );
    }

    #[test]
    fn get_non_null_reports_missing_value() {
        let store = normalized(&[]);
        let err = store.get_non_null(Sample::Id).unwrap_err();
        assert!(matches!(
            err,
            AttributeError::MissingValue {
                column: "sample_ID",
                ..
            }
        ));
    }

    #[test]
    fn failed_mark_keeps_column_and_raw_value() {
        let mut store = AttributeStore::<Sample>::new();
        store.load_raw("sample_ID", Value::from("seven")).unwrap();

        let err = store.mark_integers(&[Sample::Id]).unwrap_err();
        assert!(matches!(
            err,
            AttributeError::InvalidValue {
                expected: ColumnKind::Integer,
                ..
            }
        ));
        assert!(store.values.contains_key(&Sample::Id));
        assert_eq!(store.get(Sample::Id), &Value::Text("seven".to_string()));
        assert_eq!(store.kind(Sample::Id), ColumnKind::Text);
    }

    #[test]
    fn formatted_datetime_rejects_unknown_specifiers() {
        let store = normalized(&[("sample_when", Value::from("2016-10-22 18:05:00"))]);
        assert_eq!(
            store.formatted_datetime(Sample::When, "%H:%M").unwrap(),
            "18:05"
        );
        let err = store.formatted_datetime(Sample::When, "%Q").unwrap_err();
        assert_eq!(
            err,
            AttributeError::InvalidFormat {
                table: "sample",
                column: "sample_when",
                format: "%Q".to_string(),
            }
        );
    }

    #[test]
    fn invalid_raw_value_is_rejected() {
        let mut store = normalized(&[]);
        let err = store.set(Sample::When, "next tuesday").unwrap_err();
        assert!(matches!(
            err,
            AttributeError::InvalidValue {
                expected: ColumnKind::DateTime,
                ..
            }
        ));
    }
}
