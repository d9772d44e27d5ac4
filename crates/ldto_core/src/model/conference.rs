//! Conference record: one edition of the event day.

use crate::model::attributes::{AttributeResult, AttributeStore};
use crate::model::event::{Event, EventColumn};
use crate::model::location::Location;
use crate::model::record::Record;
use crate::repo::query::{Direction, Query};
use crate::repo::record_repo::RepoResult;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

record_columns! {
    /// Columns of the `conference` table.
    pub enum ConferenceColumn in "conference" {
        Id => "conference_ID",
        Uid => "conference_uid",
        Title => "conference_title",
        Url => "conference_url",
        Description => "conference_description",
        Start => "conference_start",
        End => "conference_end",
        LocationId => "location_ID",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conference {
    attributes: AttributeStore<ConferenceColumn>,
}

impl Record for Conference {
    type Column = ConferenceColumn;

    const ID: ConferenceColumn = ConferenceColumn::Id;
    const UID: ConferenceColumn = ConferenceColumn::Uid;
    const REQUIRED: &'static [ConferenceColumn] = &[
        ConferenceColumn::Uid,
        ConferenceColumn::Title,
        ConferenceColumn::Start,
        ConferenceColumn::End,
    ];

    fn normalize(attributes: &mut AttributeStore<ConferenceColumn>) -> AttributeResult<()> {
        attributes.mark_integers(&[ConferenceColumn::Id, ConferenceColumn::LocationId])?;
        attributes.mark_datetimes(&[ConferenceColumn::Start, ConferenceColumn::End])?;
        attributes.mark_remaining_as_text()
    }

    fn from_attributes(attributes: AttributeStore<ConferenceColumn>) -> Self {
        Self { attributes }
    }

    fn attributes(&self) -> &AttributeStore<ConferenceColumn> {
        &self.attributes
    }
}

/// Derived read-only conference behavior.
pub trait ConferenceTrait {
    fn conference_attributes(&self) -> &AttributeStore<ConferenceColumn>;

    fn conference_id(&self) -> AttributeResult<i64> {
        self.conference_attributes()
            .required_integer(ConferenceColumn::Id)
    }

    fn conference_uid(&self) -> AttributeResult<&str> {
        self.conference_attributes()
            .required_text(ConferenceColumn::Uid)
    }

    fn conference_title(&self) -> AttributeResult<&str> {
        self.conference_attributes()
            .required_text(ConferenceColumn::Title)
    }

    fn conference_url(&self) -> Option<&str> {
        self.conference_attributes().text(ConferenceColumn::Url)
    }

    fn conference_description(&self) -> Option<&str> {
        self.conference_attributes()
            .text(ConferenceColumn::Description)
    }

    fn conference_start(&self) -> AttributeResult<DateTime<Utc>> {
        self.conference_attributes()
            .required_datetime(ConferenceColumn::Start)
    }

    fn conference_end(&self) -> AttributeResult<DateTime<Utc>> {
        self.conference_attributes()
            .required_datetime(ConferenceColumn::End)
    }

    /// Hosting location, when one is linked.
    fn conference_location(&self, conn: &Connection) -> RepoResult<Option<Location>> {
        match self
            .conference_attributes()
            .integer(ConferenceColumn::LocationId)
        {
            Some(location_id) => Location::factory_by_id(conn, location_id).query_row(),
            None => Ok(None),
        }
    }

    /// Events of this conference ordered by start.
    fn factory_event_by_conference<'conn>(
        &self,
        conn: &'conn Connection,
    ) -> AttributeResult<Query<'conn, Event>> {
        Ok(Event::factory_by_conference(conn, self.conference_id()?)
            .order_by(EventColumn::Start, Direction::Asc))
    }
}

impl ConferenceTrait for Conference {
    fn conference_attributes(&self) -> &AttributeStore<ConferenceColumn> {
        &self.attributes
    }
}
