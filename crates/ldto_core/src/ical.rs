//! Minimal iCalendar (RFC 5545) rendering for one event.
//!
//! # Invariants
//! - Every emitted line ends with CRLF, including the last one.
//! - Optional properties are omitted entirely when absent or blank.
//! - Instants are written in UTC basic format (`YYYYMMDDTHHMMSSZ`).

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

pub const ICAL_PRODID: &str = "-//ldto/asd//NONSGML v1.0//EN";
const ICAL_DATETIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const CRLF: &str = "\r\n";

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid html tag regex"));

/// Data needed to render one `VEVENT`.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEntry {
    pub uid: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub url: Option<String>,
    pub description: Option<String>,
    /// `(lat, lng)`.
    pub geo: Option<(f64, f64)>,
}

impl CalendarEntry {
    pub fn new(
        uid: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            uid: uid.into(),
            title: title.into(),
            start,
            end,
            url: None,
            description: None,
            geo: None,
        }
    }

    pub fn with_url(mut self, url: Option<impl Into<String>>) -> Self {
        self.url = url.map(Into::into);
        self
    }

    pub fn with_description(mut self, description: Option<impl Into<String>>) -> Self {
        self.description = description.map(Into::into);
        self
    }

    pub fn with_geo(mut self, geo: Option<(f64, f64)>) -> Self {
        self.geo = geo;
        self
    }
}

/// Renders a `VCALENDAR` holding `entry`, stamped at `generated_at`.
pub fn render_ical(entry: &CalendarEntry, generated_at: DateTime<Utc>) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{ICAL_PRODID}"),
        "CALSCALE:GREGORIAN".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}", single_line(&entry.uid)),
        format!("SUMMARY:{}", escape_html(&single_line(&entry.title))),
    ];

    if let Some(description) = non_blank(entry.description.as_deref()) {
        lines.push(format!("DESCRIPTION:{}", clean_description(description)));
    }
    if let Some(url) = non_blank(entry.url.as_deref()) {
        lines.push(format!("URL;VALUE=URI:{}", escape_html(&single_line(url))));
    }
    if let Some((lat, lng)) = entry.geo {
        lines.push(format!("GEO:{lat};{lng}"));
    }

    lines.push(format!("DTSTART:{}", entry.start.format(ICAL_DATETIME_FORMAT)));
    lines.push(format!("DTEND:{}", entry.end.format(ICAL_DATETIME_FORMAT)));
    lines.push(format!(
        "DTSTAMP:{}",
        generated_at.format(ICAL_DATETIME_FORMAT)
    ));
    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());

    let mut ics = lines.join(CRLF);
    ics.push_str(CRLF);
    ics
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// Line breaks of any style become single spaces.
fn single_line(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Single line, markup removed, entities escaped.
fn clean_description(description: &str) -> String {
    let flattened = single_line(description);
    let stripped = TAG_RE.replace_all(&flattened, "");
    escape_html(&stripped)
}

/// Escapes `& < > " '` as HTML entities.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}
