//! Process configuration resolved from `LDTO_*` environment variables.

use crate::logging::{default_log_level, LogLevel, LoggingError};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "LDTO_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "LDTO_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LDTO_LOG_DIR";
pub const ENV_SITE_URL: &str = "LDTO_SITE_URL";

const DEFAULT_DB_FILE_NAME: &str = "ldto.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "ldto-logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
    /// Base URL for generated links; empty when unset.
    pub site_url: String,
}

impl AppConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggingError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(level) => LogLevel::parse(&level)?.as_str().to_string(),
            None => default_log_level().to_string(),
        };

        Ok(Self {
            db_path: read(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level,
            log_dir: read(ENV_LOG_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME)),
            site_url: read(ENV_SITE_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_default(),
        })
    }
}
