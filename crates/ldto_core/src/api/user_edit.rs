//! User edit endpoint: create/update a user and manage their skills.
//!
//! # Invariants
//! - Editing an existing user needs `edit-users` or being that user.
//! - Creating a user needs `edit-users`.
//! - A successful `save-user` always answers with a redirect.

use crate::api::{ApiError, ApiResponse, ApiResult, RequestContext};
use crate::auth::{ensure_permission, Permission};
use crate::model::skill::Skill;
use crate::model::user::{User, UserTrait};
use crate::service::user_service::{parse_score, UserInput, UserService, UserSkill};
use log::info;
use rusqlite::Connection;
use url::form_urlencoded;

pub const ACTION_SAVE_USER: &str = "save-user";
pub const ACTION_ADD_SKILL: &str = "add-skill";
pub const ACTION_CHANGE_SKILL: &str = "change-skill";

/// Data backing the user edit page.
#[derive(Debug, Clone, PartialEq)]
pub struct UserEditView {
    /// `None` when creating a new user.
    pub user: Option<User>,
    /// Every skill, ordered by UID.
    pub skill_catalogue: Vec<Skill>,
    /// Skills held by `user`, ordered by UID.
    pub user_skills: Vec<UserSkill>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserEditOutcome {
    Redirect(ApiResponse),
    View(UserEditView),
}

/// Edit page URL of a user; the UID is form-urlencoded.
pub fn user_edit_url(site_url: &str, user_uid: &str) -> String {
    let uid = form_urlencoded::byte_serialize(user_uid.as_bytes()).collect::<String>();
    format!(
        "{}/user-edit.php?uid={uid}",
        site_url.trim_end_matches('/')
    )
}

pub fn handle(
    conn: &mut Connection,
    site_url: &str,
    ctx: &RequestContext<'_>,
) -> ApiResult<UserEditOutcome> {
    let mut service = UserService::new(conn);
    let authorizer = ctx.authorizer();

    let user = match ctx.query("uid") {
        Some(uid) => {
            let user = service
                .find_user_by_uid(uid)?
                .ok_or_else(|| ApiError::NotFound("not found".to_string()))?;
            if !user.has_permission_to_edit_user(authorizer)? {
                return Err(ApiError::PermissionDenied("Can't edit user".to_string()));
            }
            Some(user)
        }
        None => {
            ensure_permission(authorizer, Permission::EditUsers)
                .map_err(|_| ApiError::PermissionDenied("Can't create user".to_string()))?;
            None
        }
    };

    if ctx.is_action(ACTION_SAVE_USER) {
        let input = UserInput {
            name: ctx.form("name").unwrap_or_default().to_string(),
            surname: ctx.form("surname").unwrap_or_default().to_string(),
            uid: ctx.form("uid").unwrap_or_default().to_string(),
        };
        let existing = user.as_ref().map(UserTrait::user_id).transpose()?;
        let saved = service.save_user(existing, &input)?;
        return Ok(UserEditOutcome::Redirect(ApiResponse::redirect(
            user_edit_url(site_url, saved.user_uid()?),
        )));
    }

    if let (Some(action), Some(skill_uid), Some(raw_score)) =
        (ctx.action(), ctx.form("skill_uid"), ctx.form("skill_score"))
    {
        let user_id = match &user {
            Some(user) => user.user_id()?,
            None => {
                return Err(ApiError::Validation(
                    "Save the user before editing skills".to_string(),
                ))
            }
        };
        // Unknown skills fail before any action is considered.
        service.find_skill_by_uid(skill_uid)?;
        let score = parse_score(raw_score)?;

        match action {
            ACTION_CHANGE_SKILL => {
                let delete = ctx.form("skill_delete").is_some();
                service.change_skill(user_id, skill_uid, score, delete)?;
                info!(
                    "event=user_skill_change module=api status=ok user_id={user_id} deleted={delete}"
                );
            }
            ACTION_ADD_SKILL => {
                service.assign_skill(user_id, skill_uid, score)?;
                info!("event=user_skill_add module=api status=ok user_id={user_id}");
            }
            _ => {}
        }
    }

    let user_skills = match &user {
        Some(user) => service.user_skills(user.user_id()?)?,
        None => Vec::new(),
    };
    Ok(UserEditOutcome::View(UserEditView {
        skill_catalogue: service.skill_catalogue()?,
        user_skills,
        user,
    }))
}

#[cfg(test)]
mod tests {
    use super::user_edit_url;

    #[test]
    fn edit_url_encodes_uid() {
        assert_eq!(
            user_edit_url("https://linuxdaytorino.org/", "mario rossi"),
            "https://linuxdaytorino.org/user-edit.php?uid=mario+rossi"
        );
        assert_eq!(
            user_edit_url("https://linuxdaytorino.org", "valerio-bozzolan"),
            "https://linuxdaytorino.org/user-edit.php?uid=valerio-bozzolan"
        );
        assert_eq!(
            user_edit_url("", "a&b=c/d"),
            "/user-edit.php?uid=a%26b%3Dc%2Fd"
        );
    }
}
