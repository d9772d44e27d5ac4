//! Event record: a talk, lesson or workshop inside a conference.
//!
//! # Responsibility
//! - Declare the `event` columns and their normalization.
//! - Provide `EventTrait`, the read-only derived event behavior.
//!
//! # Invariants
//! - `event_start`/`event_end` are UTC datetimes once normalized.
//! - An event is passed iff its end is strictly before the evaluation
//!   instant.
//! - Event UIDs are unique per conference, not globally.

use crate::auth::{Authorizer, Permission};
use crate::model::attributes::{AttributeResult, AttributeStore};
use crate::model::conference::Conference;
use crate::model::human_time;
use crate::model::record::Record;
use crate::model::user::User;
use crate::repo::query::Query;
use crate::repo::record_repo::RepoResult;
use crate::repo::subscription_repo;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

record_columns! {
    /// Columns of the `event` table.
    pub enum EventColumn in "event" {
        Id => "event_ID",
        Uid => "event_uid",
        Title => "event_title",
        Subtitle => "event_subtitle",
        Image => "event_img",
        Url => "event_url",
        Description => "event_description",
        Abstract => "event_abstract",
        Note => "event_note",
        Start => "event_start",
        End => "event_end",
        Subscriptions => "event_subscriptions",
        ConferenceId => "conference_ID",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    attributes: AttributeStore<EventColumn>,
}

impl Record for Event {
    type Column = EventColumn;

    const ID: EventColumn = EventColumn::Id;
    const UID: EventColumn = EventColumn::Uid;
    const REQUIRED: &'static [EventColumn] = &[
        EventColumn::Uid,
        EventColumn::Title,
        EventColumn::Start,
        EventColumn::End,
        EventColumn::ConferenceId,
    ];

    fn normalize(attributes: &mut AttributeStore<EventColumn>) -> AttributeResult<()> {
        attributes.mark_integers(&[EventColumn::Id, EventColumn::ConferenceId])?;
        attributes.mark_datetimes(&[EventColumn::Start, EventColumn::End])?;
        attributes.mark_booleans(&[EventColumn::Subscriptions])?;
        attributes.mark_remaining_as_text()
    }

    fn from_attributes(attributes: AttributeStore<EventColumn>) -> Self {
        Self { attributes }
    }

    fn attributes(&self) -> &AttributeStore<EventColumn> {
        &self.attributes
    }
}

impl Event {
    /// Events of one conference.
    pub fn factory_by_conference(conn: &Connection, conference_id: i64) -> Query<'_, Self> {
        Self::factory(conn).where_eq(EventColumn::ConferenceId, conference_id)
    }

    /// One event by conference and event UID.
    pub fn factory_from_conference_and_uid<'conn>(
        conn: &'conn Connection,
        conference_id: i64,
        event_uid: &str,
    ) -> Query<'conn, Self> {
        Self::factory_by_conference(conn, conference_id)
            .where_eq(EventColumn::Uid, event_uid)
            .limit(1)
    }

    /// Events the user takes part in.
    pub fn factory_by_user(conn: &Connection, user_id: i64) -> Query<'_, Self> {
        Self::factory(conn).where_exists(
            "SELECT 1 FROM \"event_user\"
             WHERE \"event_user\".\"event_ID\" = \"event\".\"event_ID\"
               AND \"event_user\".\"user_ID\" = ?",
            vec![user_id.into()],
        )
    }
}

/// Derived read-only event behavior.
///
/// Every accessor reads already-normalized attributes; nothing here writes
/// to the record. `add_subscription` writes a separate subscription row.
pub trait EventTrait {
    fn event_attributes(&self) -> &AttributeStore<EventColumn>;

    fn event_id(&self) -> AttributeResult<i64> {
        self.event_attributes().required_integer(EventColumn::Id)
    }

    fn event_uid(&self) -> AttributeResult<&str> {
        self.event_attributes().required_text(EventColumn::Uid)
    }

    fn event_title(&self) -> AttributeResult<&str> {
        self.event_attributes().required_text(EventColumn::Title)
    }

    fn event_subtitle(&self) -> Option<&str> {
        self.event_attributes().text(EventColumn::Subtitle)
    }

    fn event_start(&self) -> AttributeResult<DateTime<Utc>> {
        self.event_attributes().required_datetime(EventColumn::Start)
    }

    fn event_end(&self) -> AttributeResult<DateTime<Utc>> {
        self.event_attributes().required_datetime(EventColumn::End)
    }

    /// Start formatted with a `chrono` format string.
    fn event_start_formatted(&self, format: &str) -> AttributeResult<String> {
        self.event_attributes()
            .formatted_datetime(EventColumn::Start, format)
    }

    fn event_end_formatted(&self, format: &str) -> AttributeResult<String> {
        self.event_attributes()
            .formatted_datetime(EventColumn::End, format)
    }

    fn event_human_start(&self, now: DateTime<Utc>) -> AttributeResult<String> {
        Ok(human_time::diff(self.event_start()?, now))
    }

    fn event_human_end(&self, now: DateTime<Utc>) -> AttributeResult<String> {
        Ok(human_time::diff(self.event_end()?, now))
    }

    fn has_event_image(&self) -> bool {
        !self.event_attributes().get(EventColumn::Image).is_null()
    }

    /// Image URL resolved against `base` unless already absolute.
    fn event_image(&self, base: &str) -> Option<String> {
        let image = self.event_attributes().text(EventColumn::Image)?;
        if image.starts_with("http://") || image.starts_with("https://") {
            return Some(image.to_string());
        }
        Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            image.trim_start_matches('/')
        ))
    }

    fn has_event_permalink(&self) -> bool {
        !self.event_attributes().get(EventColumn::Url).is_null()
    }

    fn event_url(&self) -> Option<&str> {
        self.event_attributes().text(EventColumn::Url)
    }

    fn has_event_description(&self) -> bool {
        self.event_description().is_some()
    }

    fn has_event_abstract(&self) -> bool {
        self.event_abstract().is_some()
    }

    fn has_event_note(&self) -> bool {
        self.event_note().is_some()
    }

    fn event_description(&self) -> Option<&str> {
        self.event_attributes().text(EventColumn::Description)
    }

    fn event_abstract(&self) -> Option<&str> {
        self.event_attributes().text(EventColumn::Abstract)
    }

    fn event_note(&self) -> Option<&str> {
        self.event_attributes().text(EventColumn::Note)
    }

    /// Passed iff the end instant is strictly before `now`.
    fn is_event_passed_at(&self, now: DateTime<Utc>) -> AttributeResult<bool> {
        Ok(self.event_end()? < now)
    }

    fn is_event_passed(&self) -> AttributeResult<bool> {
        self.is_event_passed_at(Utc::now())
    }

    fn are_event_subscriptions_available_at(&self, now: DateTime<Utc>) -> AttributeResult<bool> {
        let enabled = self.event_attributes().boolean(EventColumn::Subscriptions);
        Ok(enabled && !self.is_event_passed_at(now)?)
    }

    fn is_event_editable(&self, authorizer: &dyn Authorizer) -> bool {
        authorizer.has_permission(Permission::EditEvents)
    }

    /// Users taking part in this event.
    fn factory_user_by_event<'conn>(
        &self,
        conn: &'conn Connection,
    ) -> AttributeResult<Query<'conn, User>> {
        Ok(User::factory_by_event(conn, self.event_id()?))
    }

    fn event_conference(&self, conn: &Connection) -> RepoResult<Option<Conference>> {
        let conference_id = self
            .event_attributes()
            .required_integer(EventColumn::ConferenceId)?;
        Conference::factory_by_id(conn, conference_id).query_row()
    }

    /// Subscribes `email` unless already subscribed.
    ///
    /// Returns whether the subscription already existed.
    fn add_subscription(&self, conn: &Connection, email: &str) -> RepoResult<bool> {
        let event_id = self.event_id()?;
        if subscription_repo::subscription_exists(conn, event_id, email)? {
            return Ok(true);
        }
        subscription_repo::insert_subscription(conn, event_id, email)?;
        Ok(false)
    }
}

impl EventTrait for Event {
    fn event_attributes(&self) -> &AttributeStore<EventColumn> {
        &self.attributes
    }
}
