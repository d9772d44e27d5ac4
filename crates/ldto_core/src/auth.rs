//! Authorization boundary: permission ids and the checker contract.
//!
//! # Responsibility
//! - Name the permissions the backend gates on.
//! - Define the `Authorizer` collaborator consulted by handlers and traits.
//!
//! # Invariants
//! - Unknown permission strings are rejected, never mapped to a default.
//! - Undeclared permissions are denied.

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Action a caller may be allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    EditEvents,
    EditUsers,
    EditConferences,
    EditSkills,
}

/// Permission string for editing events.
pub const PERMISSION_EDIT_EVENTS: &str = "edit-events";
/// Permission string for editing users.
pub const PERMISSION_EDIT_USERS: &str = "edit-users";
/// Permission string for editing conferences.
pub const PERMISSION_EDIT_CONFERENCES: &str = "edit-conferences";
/// Permission string for editing skills.
pub const PERMISSION_EDIT_SKILLS: &str = "edit-skills";

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EditEvents => PERMISSION_EDIT_EVENTS,
            Self::EditUsers => PERMISSION_EDIT_USERS,
            Self::EditConferences => PERMISSION_EDIT_CONFERENCES,
            Self::EditSkills => PERMISSION_EDIT_SKILLS,
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one permission id.
pub fn parse_permission(value: &str) -> Result<Permission, PermissionError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(PermissionError::Empty);
    }

    match normalized {
        PERMISSION_EDIT_EVENTS => Ok(Permission::EditEvents),
        PERMISSION_EDIT_USERS => Ok(Permission::EditUsers),
        PERMISSION_EDIT_CONFERENCES => Ok(Permission::EditConferences),
        PERMISSION_EDIT_SKILLS => Ok(Permission::EditSkills),
        other => Err(PermissionError::Unsupported(other.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    Empty,
    Unsupported(String),
    Denied(Permission),
}

impl Display for PermissionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "permission value must not be empty"),
            Self::Unsupported(value) => write!(f, "permission is unsupported: {value}"),
            Self::Denied(permission) => write!(f, "permission denied: {permission}"),
        }
    }
}

impl Error for PermissionError {}

/// External authorization collaborator.
pub trait Authorizer {
    fn has_permission(&self, permission: Permission) -> bool;

    /// ID of the authenticated user, if any.
    fn current_user_id(&self) -> Option<i64> {
        None
    }
}

/// Fails with `PermissionError::Denied` unless `permission` is granted.
pub fn ensure_permission(
    authorizer: &dyn Authorizer,
    permission: Permission,
) -> Result<(), PermissionError> {
    if authorizer.has_permission(permission) {
        Ok(())
    } else {
        Err(PermissionError::Denied(permission))
    }
}

/// Value-backed authorizer: a fixed grant set and optional current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticAuthorizer {
    granted: BTreeSet<Permission>,
    user_id: Option<i64>,
}

impl StaticAuthorizer {
    /// Denies everything.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_permissions(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            granted: permissions.into_iter().collect(),
            user_id: None,
        }
    }

    /// Builds from permission id strings, rejecting unknown ids.
    pub fn from_permission_strs<'a>(
        values: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, PermissionError> {
        let granted = values
            .into_iter()
            .map(parse_permission)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            granted,
            user_id: None,
        })
    }

    pub fn for_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

impl Authorizer for StaticAuthorizer {
    fn has_permission(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }

    fn current_user_id(&self) -> Option<i64> {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ensure_permission, parse_permission, Authorizer, Permission, PermissionError,
        StaticAuthorizer,
    };

    #[test]
    fn parses_all_supported_permissions() {
        for permission in [
            Permission::EditEvents,
            Permission::EditUsers,
            Permission::EditConferences,
            Permission::EditSkills,
        ] {
            assert_eq!(
                parse_permission(permission.as_str()).expect("known permission"),
                permission
            );
        }
    }

    #[test]
    fn rejects_empty_and_unknown_permissions() {
        assert_eq!(parse_permission("  "), Err(PermissionError::Empty));
        assert_eq!(
            parse_permission("Edit-Users"),
            Err(PermissionError::Unsupported("Edit-Users".to_string()))
        );
    }

    #[test]
    fn anonymous_authorizer_denies_everything() {
        let authorizer = StaticAuthorizer::anonymous();
        let err = ensure_permission(&authorizer, Permission::EditEvents)
            .expect_err("anonymous must be denied");
        assert_eq!(err, PermissionError::Denied(Permission::EditEvents));
        assert_eq!(authorizer.current_user_id(), None);
    }

    #[test]
    fn granted_permissions_are_stable_across_checks() {
        let authorizer =
            StaticAuthorizer::from_permission_strs(["edit-users"]).expect("valid grant list");
        for _ in 0..3 {
            assert!(authorizer.has_permission(Permission::EditUsers));
            assert!(!authorizer.has_permission(Permission::EditEvents));
        }
    }
}
