//! Core backend for the Linux Day Torino conference site.
//! Records, queries, entity behavior and the request handlers built on them.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod ical;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::{ApiError, ApiResponse, RequestContext, SiteApi};
pub use auth::{Authorizer, Permission, StaticAuthorizer};
pub use config::AppConfig;
pub use db::{ensure_migrated, open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::conference::{Conference, ConferenceColumn, ConferenceTrait};
pub use model::event::{Event, EventColumn, EventTrait};
pub use model::location::{Location, LocationColumn};
pub use model::record::{ColumnValue, Record};
pub use model::skill::{Skill, SkillColumn, SkillTrait};
pub use model::user::{User, UserColumn, UserTrait};
pub use model::value::Value;
pub use repo::query::{Direction, Query};
pub use repo::record_repo::{RepoError, RepoResult};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
