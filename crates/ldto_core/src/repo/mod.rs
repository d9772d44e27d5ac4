//! Persistence layer: query builder, record writes and join tables.
//!
//! # Responsibility
//! - Turn typed queries and payloads into parameterized SQLite statements.
//! - Own the join tables that have no record identity of their own.
//!
//! # Invariants
//! - Values are always bound, never interpolated.
//! - Repository APIs return semantic errors (`NotFound`, validation) in
//!   addition to DB transport errors.

pub mod event_user_repo;
pub mod query;
pub mod record_repo;
pub mod skill_repo;
pub mod subscription_repo;
