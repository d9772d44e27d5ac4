//! User administration use-cases.
//!
//! # Responsibility
//! - Create and partially update users from form input.
//! - Assign, rescore and remove skills on a user.
//! - Assemble the user/skill projections shown on the edit page.
//!
//! # Invariants
//! - Skill changes are always scoped to one `(user, skill)` pair.
//! - Re-assigning a skill replaces the previous assignment atomically.

use crate::model::attributes::AttributeError;
use crate::model::record::{ColumnValue, Record};
use crate::model::skill::{Skill, SkillColumn, SkillTrait};
use crate::model::user::{User, UserColumn};
use crate::repo::query::Direction;
use crate::repo::record_repo::{RepoError, RepoResult};
use crate::repo::skill_repo;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for user administration.
#[derive(Debug)]
pub enum ServiceError {
    /// No skill carries the requested UID.
    SkillNotFound(String),
    /// Target user does not exist.
    UserNotFound(i64),
    /// Score input is not an integer.
    InvalidScore(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write succeeded but read-back did not find the row.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SkillNotFound(uid) => write!(f, "Skill '{uid}' not found"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::InvalidScore(value) => write!(f, "invalid skill score: `{value}`"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent user state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { table: "user", key } => match key.parse() {
                Ok(user_id) => Self::UserNotFound(user_id),
                Err(_) => Self::Repo(RepoError::NotFound { table: "user", key }),
            },
            other => Self::Repo(other),
        }
    }
}

impl From<AttributeError> for ServiceError {
    fn from(value: AttributeError) -> Self {
        Self::Repo(value.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Editable user fields as submitted by the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub name: String,
    pub surname: String,
    pub uid: String,
}

impl UserInput {
    fn payload(&self) -> Vec<ColumnValue<UserColumn>> {
        vec![
            ColumnValue::new(UserColumn::Name, self.name.trim()),
            ColumnValue::new(UserColumn::Surname, self.surname.trim()),
            ColumnValue::new(UserColumn::Uid, self.uid.trim()),
        ]
    }
}

/// One skill held by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSkill {
    pub skill: Skill,
    pub score: i64,
}

/// User administration facade over one connection.
pub struct UserService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> UserService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    pub fn find_user_by_uid(&self, uid: &str) -> RepoResult<Option<User>> {
        User::factory_from_uid(self.conn, uid).query_row()
    }

    /// Updates `existing` in place or inserts a new user, then reads it back.
    pub fn save_user(&self, existing: Option<i64>, input: &UserInput) -> ServiceResult<User> {
        let payload = input.payload();
        let user_id = match existing {
            Some(user_id) => {
                User::update_by_id(self.conn, user_id, &payload)?;
                user_id
            }
            None => User::insert_row(self.conn, &payload)?,
        };
        info!(
            "event=user_save module=service status=ok user_id={user_id} created={}",
            existing.is_none()
        );

        User::factory_by_id(self.conn, user_id)
            .query_row()?
            .ok_or(ServiceError::InconsistentState(
                "saved user not found in read-back",
            ))
    }

    pub fn find_skill_by_uid(&self, skill_uid: &str) -> ServiceResult<Skill> {
        Skill::factory_from_uid(self.conn, skill_uid)
            .query_row()?
            .ok_or_else(|| ServiceError::SkillNotFound(skill_uid.to_string()))
    }

    /// Assigns a skill, replacing an earlier assignment of the same skill.
    pub fn assign_skill(&mut self, user_id: i64, skill_uid: &str, score: i64) -> ServiceResult<()> {
        let skill_id = self.find_skill_by_uid(skill_uid)?.skill_id()?;
        skill_repo::replace_user_skill(self.conn, user_id, skill_id, score)?;
        Ok(())
    }

    /// Rescores one assignment, or removes it when `delete` is set.
    pub fn change_skill(
        &self,
        user_id: i64,
        skill_uid: &str,
        score: i64,
        delete: bool,
    ) -> ServiceResult<()> {
        let skill_id = self.find_skill_by_uid(skill_uid)?.skill_id()?;
        if delete {
            skill_repo::delete_user_skill(self.conn, user_id, skill_id)?;
        } else {
            skill_repo::update_user_skill_score(self.conn, user_id, skill_id, score)?;
        }
        Ok(())
    }

    /// Skills held by the user, ordered by skill UID.
    pub fn user_skills(&self, user_id: i64) -> ServiceResult<Vec<UserSkill>> {
        let scores = skill_repo::user_skill_scores(self.conn, user_id)?;
        let skills = Skill::factory_by_user(self.conn, user_id)
            .order_by(SkillColumn::Uid, Direction::Asc)
            .query_rows()?;

        skills
            .into_iter()
            .map(|skill| -> ServiceResult<UserSkill> {
                let score = scores
                    .get(&skill.skill_id()?)
                    .copied()
                    .ok_or(ServiceError::InconsistentState(
                        "user skill listed without a score",
                    ))?;
                Ok(UserSkill { skill, score })
            })
            .collect()
    }

    /// Every skill, ordered by UID.
    pub fn skill_catalogue(&self) -> ServiceResult<Vec<Skill>> {
        let query = Skill::factory(self.conn).order_by(SkillColumn::Uid, Direction::Asc);
        let mut prepared = query.prepare()?;
        let mut skills = Vec::new();
        for skill in prepared.query_generator()? {
            skills.push(skill?);
        }
        Ok(skills)
    }
}

/// Parses a submitted skill score.
pub fn parse_score(value: &str) -> ServiceResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ServiceError::InvalidScore(value.to_string()))
}
