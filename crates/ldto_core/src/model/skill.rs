//! Skill record and the user-skill join.

use crate::model::attributes::{AttributeResult, AttributeStore};
use crate::model::record::Record;
use crate::repo::query::Query;
use rusqlite::Connection;

record_columns! {
    /// Columns of the `skill` table.
    pub enum SkillColumn in "skill" {
        Id => "skill_ID",
        Uid => "skill_uid",
        Phrase => "skill_phrase",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    attributes: AttributeStore<SkillColumn>,
}

impl Record for Skill {
    type Column = SkillColumn;

    const ID: SkillColumn = SkillColumn::Id;
    const UID: SkillColumn = SkillColumn::Uid;
    const REQUIRED: &'static [SkillColumn] = &[SkillColumn::Uid];

    fn normalize(attributes: &mut AttributeStore<SkillColumn>) -> AttributeResult<()> {
        attributes.mark_integers(&[SkillColumn::Id])?;
        attributes.mark_remaining_as_text()
    }

    fn from_attributes(attributes: AttributeStore<SkillColumn>) -> Self {
        Self { attributes }
    }

    fn attributes(&self) -> &AttributeStore<SkillColumn> {
        &self.attributes
    }
}

impl Skill {
    /// Skills assigned to a user.
    pub fn factory_by_user(conn: &Connection, user_id: i64) -> Query<'_, Self> {
        Self::factory(conn).where_exists(
            "SELECT 1 FROM \"user_skill\"
             WHERE \"user_skill\".\"skill_ID\" = \"skill\".\"skill_ID\"
               AND \"user_skill\".\"user_ID\" = ?",
            vec![user_id.into()],
        )
    }
}

/// Derived read-only skill behavior.
pub trait SkillTrait {
    fn skill_attributes(&self) -> &AttributeStore<SkillColumn>;

    fn skill_id(&self) -> AttributeResult<i64> {
        self.skill_attributes().required_integer(SkillColumn::Id)
    }

    fn skill_uid(&self) -> AttributeResult<&str> {
        self.skill_attributes().required_text(SkillColumn::Uid)
    }

    /// Human phrase, falling back to the UID.
    fn skill_phrase(&self) -> AttributeResult<&str> {
        match self.skill_attributes().text(SkillColumn::Phrase) {
            Some(phrase) => Ok(phrase),
            None => self.skill_uid(),
        }
    }
}

impl SkillTrait for Skill {
    fn skill_attributes(&self) -> &AttributeStore<SkillColumn> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::{Skill, SkillColumn, SkillTrait};
    use crate::model::attributes::AttributeStore;
    use crate::model::record::Record;
    use crate::model::value::Value;

    fn skill(phrase: Option<&str>) -> Skill {
        let mut attributes = AttributeStore::<SkillColumn>::new();
        attributes.load_raw("skill_ID", Value::from("4")).unwrap();
        attributes.load_raw("skill_uid", Value::from("rust")).unwrap();
        attributes.load_raw("skill_phrase", Value::from(phrase)).unwrap();
        Skill::normalize(&mut attributes).unwrap();
        Skill::from_attributes(attributes)
    }

    #[test]
    fn phrase_falls_back_to_uid() {
        assert_eq!(skill(None).skill_phrase().unwrap(), "rust");
        assert_eq!(
            skill(Some("Rust programming")).skill_phrase().unwrap(),
            "Rust programming"
        );
    }

    #[test]
    fn id_is_normalized_to_integer() {
        assert_eq!(skill(None).skill_id().unwrap(), 4);
        assert_eq!(skill(None).skill_uid().unwrap(), "rust");
    }
}
