//! Request handlers for the public and administrative site endpoints.
//!
//! # Responsibility
//! - Carry request state explicitly (`RequestContext`) instead of globals.
//! - Map domain failures onto HTTP-like status codes and plain-text bodies.
//! - Expose the iCal export (`tropical`) and user edit (`user_edit`) flows.
//!
//! # Invariants
//! - Handlers never panic; every failure becomes an `ApiResponse`.
//! - Routing and HTML rendering stay outside this crate.

pub mod tropical;
pub mod user_edit;

use crate::auth::{Authorizer, PermissionError};
use crate::db::{ensure_migrated, DbError};
use crate::model::attributes::AttributeError;
use crate::repo::record_repo::RepoError;
use crate::service::user_service::ServiceError;
use chrono::Utc;
use log::{error, warn};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use user_edit::{UserEditOutcome, UserEditView};

pub const STATUS_OK: u16 = 200;
pub const STATUS_FOUND: u16 = 302;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_FORBIDDEN: u16 = 403;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL: u16 = 500;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Query parameters, form fields and caller identity of one request.
pub struct RequestContext<'a> {
    query: BTreeMap<String, String>,
    form: BTreeMap<String, String>,
    authorizer: &'a dyn Authorizer,
}

impl<'a> RequestContext<'a> {
    pub fn new(authorizer: &'a dyn Authorizer) -> Self {
        Self {
            query: BTreeMap::new(),
            form: BTreeMap::new(),
            authorizer,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Query parameter that is present and not empty or `"0"`.
    pub fn query_non_empty(&self, name: &str) -> Option<&str> {
        self.query(name).filter(|value| is_filled(value))
    }

    pub fn form(&self, name: &str) -> Option<&str> {
        self.form.get(name).map(String::as_str)
    }

    /// Submitted form action, if any.
    pub fn action(&self) -> Option<&str> {
        self.form("action")
    }

    pub fn is_action(&self, action: &str) -> bool {
        self.action() == Some(action)
    }

    pub fn authorizer(&self) -> &'a dyn Authorizer {
        self.authorizer
    }
}

fn is_filled(value: &str) -> bool {
    !value.is_empty() && value != "0"
}

/// Status, headers and body of a handler result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ApiResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// `302 Found` pointing at `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            status: STATUS_FOUND,
            headers: vec![("Location".to_string(), location.into())],
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value named `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Handler-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    NotFound(String),
    PermissionDenied(String),
    Validation(String),
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => STATUS_NOT_FOUND,
            Self::PermissionDenied(_) => STATUS_FORBIDDEN,
            Self::Validation(_) => STATUS_BAD_REQUEST,
            Self::Internal(_) => STATUS_INTERNAL,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(message)
            | Self::PermissionDenied(message)
            | Self::Validation(message)
            | Self::Internal(message) => message,
        }
    }

    pub fn into_response(self) -> ApiResponse {
        let status = self.status();
        ApiResponse {
            status,
            headers: vec![("Content-Type".to_string(), TEXT_PLAIN.to_string())],
            body: match self {
                Self::NotFound(message)
                | Self::PermissionDenied(message)
                | Self::Validation(message)
                | Self::Internal(message) => message,
            },
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status(), self.message())
    }
}

impl Error for ApiError {}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err.to_string()),
            RepoError::NotFound { .. } => Self::NotFound("not found".to_string()),
            other => {
                error!("event=api_failure module=api status=error error={other}");
                Self::Internal("internal error".to_string())
            }
        }
    }
}

impl From<AttributeError> for ApiError {
    fn from(value: AttributeError) -> Self {
        RepoError::from(value).into()
    }
}

impl From<DbError> for ApiError {
    fn from(value: DbError) -> Self {
        RepoError::from(value).into()
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::SkillNotFound(_) => Self::NotFound(value.to_string()),
            ServiceError::UserNotFound(_) => Self::NotFound("not found".to_string()),
            ServiceError::InvalidScore(_) => Self::Validation(value.to_string()),
            ServiceError::Repo(err) => err.into(),
            ServiceError::InconsistentState(details) => {
                error!("event=api_failure module=api status=error error={details}");
                Self::Internal("internal error".to_string())
            }
        }
    }
}

impl From<PermissionError> for ApiError {
    fn from(value: PermissionError) -> Self {
        Self::PermissionDenied(value.to_string())
    }
}

/// Site endpoints bound to one migrated connection.
pub struct SiteApi<'conn> {
    conn: &'conn mut Connection,
    site_url: String,
}

impl<'conn> SiteApi<'conn> {
    /// Verifies the schema before handing out handlers.
    pub fn try_new(conn: &'conn mut Connection, site_url: impl Into<String>) -> ApiResult<Self> {
        ensure_migrated(conn)?;
        Ok(Self {
            conn,
            site_url: site_url.into(),
        })
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// iCal export; failures become plain-text error responses.
    pub fn tropical(&self, ctx: &RequestContext<'_>) -> ApiResponse {
        match tropical::handle(self.conn, ctx, Utc::now()) {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "event=ical_export module=api status=error code={}",
                    err.status()
                );
                err.into_response()
            }
        }
    }

    /// User edit flow: redirect, edit view, or a failure.
    pub fn user_edit(&mut self, ctx: &RequestContext<'_>) -> ApiResult<UserEditOutcome> {
        let outcome = user_edit::handle(self.conn, &self.site_url, ctx);
        if let Err(err) = &outcome {
            warn!(
                "event=user_edit module=api status=error code={}",
                err.status()
            );
        }
        outcome
    }
}
