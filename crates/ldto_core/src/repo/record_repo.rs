//! Generic row persistence for `Record` types.
//!
//! # Responsibility
//! - Materialize SQLite rows into normalized records.
//! - Normalize and validate column-tagged payloads before writes.
//! - Insert rows and report generated IDs.
//!
//! # Invariants
//! - Payload values are coerced with the record's declared kinds before
//!   they reach SQL.
//! - Materialized rows pass through `Record::normalize`; unknown result
//!   columns are rejected.

use crate::db::DbError;
use crate::model::attributes::{AttributeError, AttributeStore, Column};
use crate::model::record::{ColumnValue, Record, RecordValidationError};
use crate::model::value::Value;
use log::{debug, error};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record reads and writes.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Attribute(AttributeError),
    Validation(RecordValidationError),
    NotFound { table: &'static str, key: String },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Attribute(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { table, key } => write!(f, "{table} not found: {key}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Attribute(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<AttributeError> for RepoError {
    fn from(value: AttributeError) -> Self {
        Self::Attribute(value)
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Normalized payload ready for binding.
pub(crate) struct PreparedPayload<C: Column> {
    pub(crate) columns: Vec<C>,
    pub(crate) values: Vec<SqlValue>,
}

/// Coerces payload values and validates UID/required constraints.
///
/// With `require_all` every `R::REQUIRED` column must be present and
/// non-null (inserts). Otherwise only listed required columns are checked
/// for null (partial updates). Later entries win on duplicate columns.
pub(crate) fn prepare_payload<R: Record>(
    payload: &[ColumnValue<R::Column>],
    require_all: bool,
) -> RepoResult<PreparedPayload<R::Column>> {
    let mut attributes: AttributeStore<R::Column> = R::blank_attributes()?;
    let mut columns = Vec::with_capacity(payload.len());
    for entry in payload {
        attributes.set(entry.column, entry.value.clone())?;
        if !columns.contains(&entry.column) {
            columns.push(entry.column);
        }
    }

    for column in R::REQUIRED {
        let listed = columns.contains(column);
        if (require_all || listed) && attributes.get(*column).is_null() {
            return Err(RecordValidationError::MissingRequired {
                table: R::table(),
                column: column.name(),
            }
            .into());
        }
    }

    if columns.contains(&R::UID) {
        validate_uid::<R>(attributes.get(R::UID))?;
    }

    let values = columns
        .iter()
        .map(|column| attributes.get(*column).to_sql())
        .collect();
    Ok(PreparedPayload { columns, values })
}

fn validate_uid<R: Record>(value: &Value) -> Result<(), RecordValidationError> {
    let uid = value.as_str().unwrap_or_default();
    if uid.trim().is_empty() {
        return Err(RecordValidationError::BlankUid { table: R::table() });
    }

    let actual = uid.chars().count();
    if actual > R::MAX_UID_LEN {
        return Err(RecordValidationError::UidTooLong {
            table: R::table(),
            max: R::MAX_UID_LEN,
            actual,
        });
    }

    Ok(())
}

pub(crate) fn insert_row<R: Record>(
    conn: &Connection,
    payload: &[ColumnValue<R::Column>],
) -> RepoResult<i64> {
    let started_at = Instant::now();
    let prepared = prepare_payload::<R>(payload, true)?;

    let names = prepared
        .columns
        .iter()
        .map(|column| quote_ident(column.name()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; prepared.columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders});",
        quote_ident(R::table())
    );

    if let Err(err) = conn.execute(&sql, params_from_iter(prepared.values.iter())) {
        error!(
            "event=record_insert module=repo status=error table={} duration_ms={} error={}",
            R::table(),
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err.into());
    }

    let id = conn.last_insert_rowid();
    debug!(
        "event=record_insert module=repo status=ok table={} id={} duration_ms={}",
        R::table(),
        id,
        started_at.elapsed().as_millis()
    );
    Ok(id)
}

/// Builds a normalized record from one result row.
pub(crate) fn materialize<R: Record>(row: &Row<'_>) -> RepoResult<R> {
    let mut attributes = AttributeStore::<R::Column>::new();
    let statement = row.as_ref();
    for index in 0..statement.column_count() {
        let name = statement.column_name(index)?;
        let raw: SqlValue = row.get(index)?;
        attributes.load_raw(name, Value::from_sql(raw))?;
    }
    R::normalize(&mut attributes)?;
    Ok(R::from_attributes(attributes))
}

/// Double-quotes an SQL identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
