//! Query builder and record materialization.
//!
//! # Responsibility
//! - Build filtered, ordered, paginated reads over one record type.
//! - Materialize results eagerly (`query_rows`), singly (`query_row`) or as
//!   a streaming cursor (`query_generator`).
//! - Apply partial updates and deletes to the rows a filter selects.
//!
//! # Invariants
//! - Every value is bound as a parameter; only identifiers are formatted.
//! - Without `order_by` the result order is unspecified.
//! - `update`/`delete` ignore ordering and pagination; they act on every
//!   row matching the filters.

use crate::model::attributes::Column;
use crate::model::record::{ColumnValue, Record};
use crate::model::value::Value;
use crate::repo::record_repo::{materialize, prepare_payload, quote_ident, RepoResult};
use log::debug;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, Rows, Statement};
use std::marker::PhantomData;

/// Sort direction for `order_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
enum Predicate<C> {
    Compare {
        column: C,
        operator: &'static str,
        value: Value,
    },
    IsNull(C),
    IsNotNull(C),
    Exists {
        sql: String,
        params: Vec<Value>,
    },
}

/// Filtered view over one record type.
///
/// Not persisted; each terminal call re-reads storage.
pub struct Query<'conn, R: Record> {
    conn: &'conn Connection,
    predicates: Vec<Predicate<R::Column>>,
    order: Vec<(R::Column, Direction)>,
    limit: Option<u32>,
    offset: u32,
    _record: PhantomData<fn() -> R>,
}

impl<'conn, R: Record> Query<'conn, R> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: 0,
            _record: PhantomData,
        }
    }

    /// Equality filter; a `Null` value filters with `IS NULL`.
    pub fn where_eq(self, column: R::Column, value: impl Into<Value>) -> Self {
        let value = value.into();
        if value.is_null() {
            return self.where_null(column);
        }
        self.compare(column, "=", value)
    }

    pub fn where_not_eq(mut self, column: R::Column, value: impl Into<Value>) -> Self {
        let value = value.into();
        if value.is_null() {
            self.predicates.push(Predicate::IsNotNull(column));
            return self;
        }
        self.compare(column, "<>", value)
    }

    pub fn where_lt(self, column: R::Column, value: impl Into<Value>) -> Self {
        self.compare(column, "<", value.into())
    }

    pub fn where_gt(self, column: R::Column, value: impl Into<Value>) -> Self {
        self.compare(column, ">", value.into())
    }

    pub fn where_null(mut self, column: R::Column) -> Self {
        self.predicates.push(Predicate::IsNull(column));
        self
    }

    /// Correlated `EXISTS (...)` filter.
    ///
    /// `sql` is the inner select; it may reference the outer table by its
    /// quoted name and binds `params` positionally.
    pub fn where_exists(mut self, sql: impl Into<String>, params: Vec<Value>) -> Self {
        self.predicates.push(Predicate::Exists {
            sql: sql.into(),
            params,
        });
        self
    }

    pub fn order_by(mut self, column: R::Column, direction: Direction) -> Self {
        self.order.push((column, direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Prepares the select statement for streaming reads.
    pub fn prepare(&self) -> RepoResult<PreparedQuery<'conn, R>> {
        let (sql, params) = self.select_sql();
        debug!(
            "event=query_prepare module=repo table={} predicates={}",
            R::table(),
            self.predicates.len()
        );
        let statement = self.conn.prepare(&sql)?;
        Ok(PreparedQuery {
            statement,
            params,
            _record: PhantomData,
        })
    }

    /// First matching record, `None` when nothing matches.
    pub fn query_row(&self) -> RepoResult<Option<R>> {
        let mut prepared = self.prepare()?;
        let mut records = prepared.query_generator()?;
        records.next().transpose()
    }

    /// Every matching record, in query order.
    pub fn query_rows(&self) -> RepoResult<Vec<R>> {
        let mut prepared = self.prepare()?;
        let records = prepared.query_generator()?;
        records.collect()
    }

    pub fn count(&self) -> RepoResult<u64> {
        let (where_sql, params) = self.where_sql();
        let sql = format!(
            "SELECT COUNT(*) FROM {}{where_sql};",
            quote_ident(R::table())
        );
        let count: i64 =
            self.conn
                .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Writes only the listed columns on every matching row.
    ///
    /// Returns the number of changed rows.
    pub fn update(&self, payload: &[ColumnValue<R::Column>]) -> RepoResult<usize> {
        if payload.is_empty() {
            return Ok(0);
        }

        let prepared = prepare_payload::<R>(payload, false)?;
        let assignments = prepared
            .columns
            .iter()
            .map(|column| format!("{} = ?", quote_ident(column.name())))
            .collect::<Vec<_>>()
            .join(", ");
        let (where_sql, where_params) = self.where_sql();
        let sql = format!(
            "UPDATE {} SET {assignments}{where_sql};",
            quote_ident(R::table())
        );

        let mut params = prepared.values;
        params.extend(where_params);
        let changed = self.conn.execute(&sql, params_from_iter(params.iter()))?;
        debug!(
            "event=record_update module=repo status=ok table={} columns={} changed={}",
            R::table(),
            prepared.columns.len(),
            changed
        );
        Ok(changed)
    }

    /// Deletes every matching row and returns how many were removed.
    pub fn delete(&self) -> RepoResult<usize> {
        let (where_sql, params) = self.where_sql();
        let sql = format!("DELETE FROM {}{where_sql};", quote_ident(R::table()));
        let deleted = self.conn.execute(&sql, params_from_iter(params.iter()))?;
        debug!(
            "event=record_delete module=repo status=ok table={} deleted={}",
            R::table(),
            deleted
        );
        Ok(deleted)
    }

    fn compare(mut self, column: R::Column, operator: &'static str, value: Value) -> Self {
        self.predicates.push(Predicate::Compare {
            column,
            operator,
            value,
        });
        self
    }

    fn select_sql(&self) -> (String, Vec<SqlValue>) {
        let table = quote_ident(R::table());
        let columns = R::Column::ALL
            .iter()
            .map(|column| {
                let name = quote_ident(column.name());
                format!("{table}.{name} AS {name}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        let (where_sql, mut params) = self.where_sql();
        let mut sql = format!("SELECT {columns} FROM {table}{where_sql}");

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, direction)| {
                    format!(
                        "{table}.{} {}",
                        quote_ident(column.name()),
                        direction.as_sql()
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            params.push(SqlValue::Integer(i64::from(limit)));
            if self.offset > 0 {
                sql.push_str(" OFFSET ?");
                params.push(SqlValue::Integer(i64::from(self.offset)));
            }
        } else if self.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            params.push(SqlValue::Integer(i64::from(self.offset)));
        }

        sql.push(';');
        (sql, params)
    }

    fn where_sql(&self) -> (String, Vec<SqlValue>) {
        if self.predicates.is_empty() {
            return (String::new(), Vec::new());
        }

        let table = quote_ident(R::table());
        let mut clauses = Vec::with_capacity(self.predicates.len());
        let mut params = Vec::new();
        for predicate in &self.predicates {
            match predicate {
                Predicate::Compare {
                    column,
                    operator,
                    value,
                } => {
                    clauses.push(format!(
                        "{table}.{} {operator} ?",
                        quote_ident(column.name())
                    ));
                    params.push(value.to_sql());
                }
                Predicate::IsNull(column) => {
                    clauses.push(format!("{table}.{} IS NULL", quote_ident(column.name())));
                }
                Predicate::IsNotNull(column) => {
                    clauses.push(format!(
                        "{table}.{} IS NOT NULL",
                        quote_ident(column.name())
                    ));
                }
                Predicate::Exists {
                    sql,
                    params: inner,
                } => {
                    clauses.push(format!("EXISTS ({sql})"));
                    params.extend(inner.iter().map(Value::to_sql));
                }
            }
        }

        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

/// A prepared select, reusable for one or more streaming passes.
pub struct PreparedQuery<'conn, R: Record> {
    statement: Statement<'conn>,
    params: Vec<SqlValue>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> PreparedQuery<'_, R> {
    /// Starts a lazy, one-shot pass over the matching records.
    pub fn query_generator(&mut self) -> RepoResult<Records<'_, R>> {
        let rows = self.statement.query(params_from_iter(self.params.iter()))?;
        Ok(Records {
            rows,
            finished: false,
            _record: PhantomData,
        })
    }
}

/// Streaming record cursor backed by `rusqlite::Rows`.
///
/// Rows are materialized one at a time; the cursor stops after the first
/// error.
pub struct Records<'stmt, R: Record> {
    rows: Rows<'stmt>,
    finished: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Iterator for Records<'_, R> {
    type Item = RepoResult<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.rows.next() {
            Ok(Some(row)) => {
                let record = materialize::<R>(row);
                if record.is_err() {
                    self.finished = true;
                }
                Some(record)
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err.into()))
            }
        }
    }
}
