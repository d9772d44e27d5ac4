//! iCal export endpoint for a conference or one of its events.

use crate::api::{ApiError, ApiResponse, ApiResult, RequestContext};
use crate::ical::{render_ical, CalendarEntry};
use crate::model::conference::{Conference, ConferenceTrait};
use crate::model::event::{Event, EventTrait};
use crate::model::record::Record;
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::Connection;

pub const CONTENT_TYPE_CALENDAR: &str = "text/calendar";

/// Renders the calendar for `conference` (and optionally `event`).
///
/// The iCal `UID` is the numeric record ID; the textual UIDs name the
/// downloaded file.
/// `debug` skips the download headers so the body shows inline.
pub fn handle(
    conn: &Connection,
    ctx: &RequestContext<'_>,
    generated_at: DateTime<Utc>,
) -> ApiResult<ApiResponse> {
    let conference_uid = ctx
        .query_non_empty("conference")
        .ok_or_else(|| ApiError::NotFound("Missing 'conference' argument".to_string()))?;

    let conference = Conference::factory_from_uid(conn, conference_uid)
        .query_row()?
        .ok_or_else(|| ApiError::NotFound("Conference not found".to_string()))?;

    let event = match ctx.query("event") {
        Some(event_uid) => Some(
            Event::factory_from_conference_and_uid(conn, conference.conference_id()?, event_uid)
                .query_row()?
                .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?,
        ),
        None => None,
    };

    let conference_uid = conference.conference_uid()?;
    let (file_stem, mut entry) = match &event {
        Some(event) => {
            let url = if event.has_event_permalink() {
                event.event_url()
            } else {
                None
            };
            let entry = CalendarEntry::new(
                event.event_id()?.to_string(),
                event.event_title()?,
                event.event_start()?,
                event.event_end()?,
            )
            .with_url(url)
            .with_description(event.event_description());
            (format!("{conference_uid}-{}", event.event_uid()?), entry)
        }
        None => {
            let entry = CalendarEntry::new(
                conference.conference_id()?.to_string(),
                conference.conference_title()?,
                conference.conference_start()?,
                conference.conference_end()?,
            )
            .with_url(conference.conference_url())
            .with_description(conference.conference_description());
            (conference_uid.to_string(), entry)
        }
    };

    if let Some(location) = conference.conference_location(conn)? {
        entry = entry.with_geo(location.geo());
    }

    let body = render_ical(&entry, generated_at);
    info!(
        "event=ical_export module=api status=ok id={} file={} scope={}",
        entry.uid,
        file_stem,
        if event.is_some() { "event" } else { "conference" }
    );

    let response = ApiResponse::ok(body);
    if ctx.query_non_empty("debug").is_some() {
        return Ok(response);
    }
    Ok(response
        .with_header("Content-Type", CONTENT_TYPE_CALENDAR)
        .with_header(
            "Content-Disposition",
            format!("attachment; filename={file_stem}.ics"),
        ))
}
