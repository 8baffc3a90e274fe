//! Lifecycle status derivation and the dashboard's filter/sort pipeline.
//!
//! Everything here is synchronous and pure: callers read the clock once and
//! pass `now` in, so a whole listing is evaluated against a single instant.

pub mod query;
pub mod summary;

pub use query::{select_and_order, CategoryFilter, EventQuery, SortBy, SortOrder, StatusFilter};
pub use summary::{
    count_by_category, count_by_status, todo_stats, CategoryCounts, StatusCounts, TodoStats,
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use crate::models::{Event, Status};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("start date {start} is after end date {end}")]
    InvertedRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Derives the lifecycle status of a window at `now`.
///
/// Both boundaries count as live. Once the window has passed, a span longer
/// than one (rounded-up) day reports `Ongoing` and anything shorter `Ended`.
pub fn derive_status(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Status {
    if now < start {
        return Status::Upcoming;
    }
    if now <= end {
        return Status::Live;
    }
    if span_days(start, end) > 1 {
        Status::Ongoing
    } else {
        Status::Ended
    }
}

/// Like [`derive_status`] but for raw timestamps; unparseable input is an error.
pub fn derive_status_from_str(start: &str, end: &str, now: DateTime<Utc>) -> Result<Status, StatusError> {
    let start = parse_timestamp(start)?;
    let end = parse_timestamp(end)?;
    Ok(derive_status(start, end, now))
}

/// Whole days covered by the window, rounded up.
fn span_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds();
    -(-millis).div_euclid(MILLIS_PER_DAY)
}

/// Returns a copy of `event` with its status recomputed at `now`.
pub fn apply_status(event: &Event, now: DateTime<Utc>) -> Event {
    Event {
        status: derive_status(event.start_date, event.end_date, now),
        ..event.clone()
    }
}

/// True when a deadline is set and lies strictly before `now`.
///
/// Completion is not considered here; see `TodoItem::is_overdue`.
pub fn is_overdue(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    deadline.is_some_and(|d| d < now)
}

/// Parses RFC 3339, zoned date-times without seconds, zone-less date-times and
/// bare dates. Zone-less input is read as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, StatusError> {
    let trimmed = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    // `Z` is spelled as an explicit offset so one `%:z` pattern covers both.
    let zoned = match trimmed.strip_suffix(['Z', 'z']) {
        Some(local) => format!("{local}+00:00"),
        None => trimmed.to_string(),
    };
    for format in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"] {
        if let Ok(parsed) = DateTime::parse_from_str(&zoned, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(StatusError::InvalidTimestamp(input.to_string()))
}

/// Rejects windows whose start lies after their end.
pub fn ensure_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), StatusError> {
    if start > end {
        return Err(StatusError::InvertedRange { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn ts(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn test_upcoming_before_start() {
        let start = ts("2024-01-10T00:00:00Z");
        let end = ts("2024-01-12T00:00:00Z");
        assert_eq!(derive_status(start, end, start - Duration::seconds(1)), Status::Upcoming);
        assert_eq!(derive_status(start, end, ts("2023-06-01")), Status::Upcoming);
    }

    #[test]
    fn test_live_boundaries_are_inclusive() {
        let start = ts("2024-01-10T09:00:00Z");
        let end = ts("2024-01-10T17:00:00Z");
        assert_eq!(derive_status(start, end, start), Status::Live);
        assert_eq!(derive_status(start, end, end), Status::Live);
        assert_eq!(derive_status(start, end, ts("2024-01-10T12:00:00Z")), Status::Live);
    }

    #[test]
    fn test_zero_duration_event() {
        let instant = ts("2024-01-01T00:00Z");
        assert_eq!(derive_status(instant, instant, instant), Status::Live);
        assert_eq!(derive_status(instant, instant, ts("2024-01-02T00:00Z")), Status::Ended);
    }

    #[test]
    fn test_single_day_event_ends() {
        let start = ts("2024-01-01T00:00:00Z");
        let end = start + Duration::days(1);
        assert_eq!(derive_status(start, end, end + Duration::seconds(1)), Status::Ended);
    }

    #[test]
    fn test_elapsed_multi_day_event_reports_ongoing() {
        assert_eq!(
            derive_status(ts("2024-01-01"), ts("2024-01-05"), ts("2024-01-10")),
            Status::Ongoing
        );

        // A day and one second rounds up to two days.
        let start = ts("2024-01-01T00:00:00Z");
        let end = start + Duration::days(1) + Duration::seconds(1);
        assert_eq!(derive_status(start, end, end + Duration::hours(1)), Status::Ongoing);
    }

    #[test]
    fn test_span_days_rounds_up() {
        let start = ts("2024-01-01T00:00:00Z");
        assert_eq!(span_days(start, start), 0);
        assert_eq!(span_days(start, start + Duration::hours(1)), 1);
        assert_eq!(span_days(start, start + Duration::days(1)), 1);
        assert_eq!(span_days(start, start + Duration::hours(25)), 2);
    }

    #[test]
    fn test_derive_from_str_rejects_garbage() {
        let now = ts("2024-01-01");
        assert_eq!(
            derive_status_from_str("not a date", "2024-01-02", now),
            Err(StatusError::InvalidTimestamp("not a date".to_string()))
        );
        assert_eq!(
            derive_status_from_str("2024-01-01", "2024-13-45", now),
            Err(StatusError::InvalidTimestamp("2024-13-45".to_string()))
        );
        assert_eq!(
            derive_status_from_str("2024-01-01", "2024-01-02", now),
            Ok(Status::Live)
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(ts("2024-01-01"), midnight);
        assert_eq!(ts("2024-01-01T00:00"), midnight);
        assert_eq!(ts("2024-01-01T00:00:00.000"), midnight);
        assert_eq!(ts("2024-01-01T00:00:00Z"), midnight);
        assert_eq!(ts("2024-01-01T05:30:00+05:30"), midnight);
        assert_eq!(ts("2024-01-01T00:00Z"), midnight);
        assert_eq!(ts("2024-01-01T02:00+02:00"), midnight);
        assert_eq!(
            ts("2024-01-01T10:00+02:00"),
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
        );
        assert!(parse_timestamp("2024-01-01T00:00Q").is_err());
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("01/02/2024").is_err());
    }

    #[test]
    fn test_apply_status_leaves_input_untouched() {
        let event = Event {
            id: Uuid::new_v4(),
            owner_id: "user-1".to_string(),
            category: Category::Webinar,
            name: "Rust in Production".to_string(),
            start_date: ts("2024-02-01T10:00:00Z"),
            end_date: ts("2024-02-01T11:00:00Z"),
            external_link: None,
            topics: vec!["rust".to_string()],
            notes: None,
            status: Status::Upcoming,
            created_at: ts("2024-01-15"),
        };
        let snapshot = event.clone();

        let applied = apply_status(&event, ts("2024-02-02"));

        assert_eq!(event, snapshot);
        assert_eq!(applied.status, Status::Ended);
        assert_eq!(Event { status: Status::Upcoming, ..applied }, snapshot);
    }

    #[test]
    fn test_is_overdue() {
        let now = ts("2024-01-10T12:00:00Z");
        assert!(is_overdue(Some(now - Duration::milliseconds(1)), now));
        assert!(!is_overdue(Some(now), now));
        assert!(!is_overdue(Some(now + Duration::days(1)), now));
        assert!(!is_overdue(None, now));
    }

    #[test]
    fn test_ensure_window() {
        let a = ts("2024-01-01");
        let b = ts("2024-01-02");
        assert!(ensure_window(a, a).is_ok());
        assert!(ensure_window(a, b).is_ok());
        assert_eq!(
            ensure_window(b, a),
            Err(StatusError::InvertedRange { start: b, end: a })
        );
    }
}
