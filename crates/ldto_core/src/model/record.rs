//! Record contract shared by every site entity.
//!
//! # Responsibility
//! - Declare table identity, key columns and normalization per entity.
//! - Provide the factory entry points (`factory`, `factory_by_id`,
//!   `factory_from_uid`) and row writes (`insert_row`, `update_by_id`,
//!   `update`).
//!
//! # Invariants
//! - Every factory call builds a fresh query; nothing is cached.
//! - Inserts require every `REQUIRED` column to be non-null.
//! - UIDs are non-blank and at most `MAX_UID_LEN` chars.

use crate::model::attributes::{AttributeResult, AttributeStore, Column};
use crate::model::value::Value;
use crate::repo::query::Query;
use crate::repo::record_repo::{self, RepoError, RepoResult};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default upper bound for UID length.
pub const DEFAULT_MAX_UID_LEN: usize = 100;

/// One column write inside an insert or update payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue<C: Column> {
    pub column: C,
    pub value: Value,
}

impl<C: Column> ColumnValue<C> {
    pub fn new(column: C, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

/// Payload validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    MissingRequired {
        table: &'static str,
        column: &'static str,
    },
    BlankUid {
        table: &'static str,
    },
    UidTooLong {
        table: &'static str,
        max: usize,
        actual: usize,
    },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { table, column } => {
                write!(f, "`{table}.{column}` is required")
            }
            Self::BlankUid { table } => write!(f, "`{table}` uid must not be blank"),
            Self::UidTooLong { table, max, actual } => write!(
                f,
                "`{table}` uid is {actual} chars long, at most {max} allowed"
            ),
        }
    }
}

impl Error for RecordValidationError {}

/// An entity backed by one relational row.
///
/// Implementors own their `AttributeStore`; derived behavior is added by
/// extension traits rather than stored state.
pub trait Record: Sized {
    type Column: Column;

    /// Primary-key column.
    const ID: Self::Column;
    /// External unique identifier column.
    const UID: Self::Column;
    /// Columns that must be non-null on insert.
    const REQUIRED: &'static [Self::Column];
    const MAX_UID_LEN: usize = DEFAULT_MAX_UID_LEN;

    /// Declares the semantic type of each column.
    fn normalize(attributes: &mut AttributeStore<Self::Column>) -> AttributeResult<()>;

    fn from_attributes(attributes: AttributeStore<Self::Column>) -> Self;

    fn attributes(&self) -> &AttributeStore<Self::Column>;

    fn table() -> &'static str {
        <Self::Column as Column>::TABLE
    }

    /// An all-null store with this record's declared kinds.
    fn blank_attributes() -> AttributeResult<AttributeStore<Self::Column>> {
        let mut attributes = AttributeStore::new();
        Self::normalize(&mut attributes)?;
        Ok(attributes)
    }

    fn record_id(&self) -> AttributeResult<i64> {
        self.attributes().required_integer(Self::ID)
    }

    fn record_uid(&self) -> AttributeResult<&str> {
        self.attributes().required_text(Self::UID)
    }

    /// Unfiltered query over this record type.
    fn factory(conn: &Connection) -> Query<'_, Self> {
        Query::new(conn)
    }

    fn factory_by_id(conn: &Connection, id: i64) -> Query<'_, Self> {
        Self::factory(conn).where_eq(Self::ID, id).limit(1)
    }

    /// Query by UID; an unknown UID yields an empty result.
    fn factory_from_uid<'conn>(conn: &'conn Connection, uid: &str) -> Query<'conn, Self> {
        Self::factory(conn).where_eq(Self::UID, uid).limit(1)
    }

    /// Inserts a new row and returns its generated ID.
    fn insert_row(conn: &Connection, payload: &[ColumnValue<Self::Column>]) -> RepoResult<i64> {
        record_repo::insert_row::<Self>(conn, payload)
    }

    /// Writes only the listed columns of the row with `id`.
    fn update_by_id(
        conn: &Connection,
        id: i64,
        payload: &[ColumnValue<Self::Column>],
    ) -> RepoResult<()> {
        let changed = Self::factory_by_id(conn, id).update(payload)?;
        if changed == 0 && !payload.is_empty() {
            return Err(RepoError::NotFound {
                table: Self::table(),
                key: id.to_string(),
            });
        }
        Ok(())
    }

    /// Writes only the listed columns of this record's row.
    ///
    /// `self` keeps its loaded values; re-query to observe the write.
    fn update(&self, conn: &Connection, payload: &[ColumnValue<Self::Column>]) -> RepoResult<()> {
        Self::update_by_id(conn, self.record_id()?, payload)
    }
}
