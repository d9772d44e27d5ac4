//! User record: speakers, organizers and other site accounts.

use crate::auth::{Authorizer, Permission};
use crate::model::attributes::{AttributeResult, AttributeStore};
use crate::model::event::Event;
use crate::model::record::Record;
use crate::model::skill::Skill;
use crate::repo::query::Query;
use rusqlite::Connection;

record_columns! {
    /// Columns of the `user` table.
    pub enum UserColumn in "user" {
        Id => "user_ID",
        Uid => "user_uid",
        Name => "user_name",
        Surname => "user_surname",
        Email => "user_email",
        Active => "user_active",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    attributes: AttributeStore<UserColumn>,
}

impl Record for User {
    type Column = UserColumn;

    const ID: UserColumn = UserColumn::Id;
    const UID: UserColumn = UserColumn::Uid;
    const REQUIRED: &'static [UserColumn] =
        &[UserColumn::Uid, UserColumn::Name, UserColumn::Surname];

    fn normalize(attributes: &mut AttributeStore<UserColumn>) -> AttributeResult<()> {
        attributes.mark_integers(&[UserColumn::Id])?;
        attributes.mark_booleans(&[UserColumn::Active])?;
        attributes.mark_remaining_as_text()
    }

    fn from_attributes(attributes: AttributeStore<UserColumn>) -> Self {
        Self { attributes }
    }

    fn attributes(&self) -> &AttributeStore<UserColumn> {
        &self.attributes
    }
}

impl User {
    /// Users taking part in an event.
    pub fn factory_by_event(conn: &Connection, event_id: i64) -> Query<'_, Self> {
        Self::factory(conn).where_exists(
            "SELECT 1 FROM \"event_user\"
             WHERE \"event_user\".\"user_ID\" = \"user\".\"user_ID\"
               AND \"event_user\".\"event_ID\" = ?",
            vec![event_id.into()],
        )
    }
}

/// Derived read-only user behavior.
pub trait UserTrait {
    fn user_attributes(&self) -> &AttributeStore<UserColumn>;

    fn user_id(&self) -> AttributeResult<i64> {
        self.user_attributes().required_integer(UserColumn::Id)
    }

    fn user_uid(&self) -> AttributeResult<&str> {
        self.user_attributes().required_text(UserColumn::Uid)
    }

    fn user_name(&self) -> AttributeResult<&str> {
        self.user_attributes().required_text(UserColumn::Name)
    }

    fn user_surname(&self) -> AttributeResult<&str> {
        self.user_attributes().required_text(UserColumn::Surname)
    }

    fn user_email(&self) -> Option<&str> {
        self.user_attributes().text(UserColumn::Email)
    }

    fn is_user_active(&self) -> bool {
        self.user_attributes().boolean(UserColumn::Active)
    }

    /// "Name Surname".
    fn user_full_name(&self) -> AttributeResult<String> {
        Ok(format!("{} {}", self.user_name()?, self.user_surname()?))
    }

    /// Allowed for `edit-users` holders and for the user themself.
    fn has_permission_to_edit_user(&self, authorizer: &dyn Authorizer) -> AttributeResult<bool> {
        if authorizer.has_permission(Permission::EditUsers) {
            return Ok(true);
        }
        Ok(authorizer.current_user_id() == Some(self.user_id()?))
    }

    fn factory_user_skills<'conn>(
        &self,
        conn: &'conn Connection,
    ) -> AttributeResult<Query<'conn, Skill>> {
        Ok(Skill::factory_by_user(conn, self.user_id()?))
    }

    fn factory_event_by_user<'conn>(
        &self,
        conn: &'conn Connection,
    ) -> AttributeResult<Query<'conn, Event>> {
        Ok(Event::factory_by_user(conn, self.user_id()?))
    }
}

impl UserTrait for User {
    fn user_attributes(&self) -> &AttributeStore<UserColumn> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::{User, UserColumn, UserTrait};
    use crate::auth::{Permission, StaticAuthorizer};
    use crate::model::attributes::AttributeStore;
    use crate::model::record::Record;

    fn user(id: i64) -> User {
        let mut attributes = AttributeStore::<UserColumn>::new();
        attributes.load_raw("user_ID", id.into()).unwrap();
        attributes.load_raw("user_uid", "valerio".into()).unwrap();
        attributes.load_raw("user_name", "Valerio".into()).unwrap();
        attributes.load_raw("user_surname", "Bozzolan".into()).unwrap();
        User::normalize(&mut attributes).unwrap();
        User::from_attributes(attributes)
    }

    #[test]
    fn full_name_joins_name_and_surname() {
        assert_eq!(user(3).user_full_name().unwrap(), "Valerio Bozzolan");
    }

    #[test]
    fn users_may_edit_themselves_only() {
        let target = user(3);
        assert!(target
            .has_permission_to_edit_user(&StaticAuthorizer::anonymous().for_user(3))
            .unwrap());
        assert!(!target
            .has_permission_to_edit_user(&StaticAuthorizer::anonymous().for_user(4))
            .unwrap());
        assert!(!target
            .has_permission_to_edit_user(&StaticAuthorizer::anonymous())
            .unwrap());
        assert!(target
            .has_permission_to_edit_user(&StaticAuthorizer::with_permissions([
                Permission::EditUsers
            ]))
            .unwrap());
    }

    #[test]
    fn missing_active_flag_reads_inactive() {
        assert!(!user(1).is_user_active());
    }
}
