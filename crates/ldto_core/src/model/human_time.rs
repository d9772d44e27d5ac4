//! Human-relative time phrases ("3 days ago", "in 2 hours").

use chrono::{DateTime, Utc};
use timeago::Formatter;

/// Describes `instant` relative to `now`.
pub fn diff(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let formatter = Formatter::new();
    if instant <= now {
        let elapsed = (now - instant).to_std().unwrap_or_default();
        return formatter.convert(elapsed);
    }

    let remaining = (instant - now).to_std().unwrap_or_default();
    let phrase = formatter.convert(remaining);
    match phrase.strip_suffix(" ago") {
        Some(span) => format!("in {span}"),
        None => phrase,
    }
}

#[cfg(test)]
mod tests {
    use super::diff;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn past_instants_read_as_ago() {
        let now = Utc.with_ymd_and_hms(2016, 10, 25, 12, 0, 0).unwrap();
        assert_eq!(diff(now - Duration::days(3), now), "3 days ago");
    }

    #[test]
    fn future_instants_read_as_in() {
        let now = Utc.with_ymd_and_hms(2016, 10, 22, 7, 0, 0).unwrap();
        assert_eq!(diff(now + Duration::hours(2), now), "in 2 hours");
    }
}
