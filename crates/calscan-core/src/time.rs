//! Time types for calendar events.
//!
//! This module provides [`EventTime`] for representing event start/end times
//! (which may be either a specific datetime or an all-day date), and
//! [`TimeWindow`] for defining query ranges such as "all of tomorrow".

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Error returned when a calendar timestamp cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    /// The backend did not supply a start or end value at all.
    #[error("missing timestamp")]
    Missing,
    /// The value is neither an RFC3339 datetime nor a `YYYY-MM-DD` date.
    #[error("invalid timestamp {value:?}: {reason}")]
    Invalid {
        /// The raw value as received.
        value: String,
        /// Parser message.
        reason: String,
    },
}

/// Represents the time of a calendar event.
///
/// Calendar events can have two types of times:
/// - **DateTime**: A specific point in time (stored as UTC)
/// - **AllDay**: A date without a specific time (all-day events)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific datetime, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day event date (no specific time).
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates a new `EventTime::DateTime` from a UTC datetime.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates a new `EventTime::AllDay` from a date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Parses a raw calendar timestamp.
    ///
    /// Accepts RFC3339 datetimes (`2025-02-05T10:00:00Z`, any offset), naive
    /// ISO datetimes which are taken as UTC (`2025-02-05T10:00:00`), and
    /// all-day dates (`2025-02-05`).
    pub fn parse(raw: &str) -> Result<Self, TimeParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TimeParseError::Missing);
        }

        if !raw.contains('T') {
            return NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Self::AllDay)
                .map_err(|e| TimeParseError::Invalid {
                    value: raw.to_string(),
                    reason: e.to_string(),
                });
        }

        match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Ok(Self::DateTime(dt.with_timezone(&Utc))),
            Err(rfc_err) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| Self::DateTime(naive.and_utc()))
                .map_err(|_| TimeParseError::Invalid {
                    value: raw.to_string(),
                    reason: rfc_err.to_string(),
                }),
        }
    }

    /// Returns `true` if this is an all-day event time.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns the datetime if this is a `DateTime` variant.
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(dt),
            Self::AllDay(_) => None,
        }
    }

    /// Converts to a UTC datetime for comparison purposes.
    ///
    /// For all-day events, returns midnight UTC on that date.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// Returns the date portion of this event time.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.date_naive(),
            Self::AllDay(date) => *date,
        }
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc_datetime().cmp(&other.to_utc_datetime())
    }
}

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a time window from a start time and duration.
    pub fn from_duration(start: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(start, start + duration)
    }

    /// The whole UTC day `date`, midnight to midnight.
    pub fn utc_day(date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        Self::from_duration(start, Duration::days(1))
    }

    /// The UTC day after the one containing `now`.
    pub fn tomorrow_utc(now: DateTime<Utc>) -> Self {
        Self::utc_day(now.date_naive() + Duration::days(1))
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod event_time {
        use super::*;

        #[test]
        fn parse_rfc3339_utc() {
            let et = EventTime::parse("2025-02-05T10:30:00Z").unwrap();
            assert_eq!(et, EventTime::from_utc(utc(2025, 2, 5, 10, 30, 0)));
            assert!(!et.is_all_day());
        }

        #[test]
        fn parse_rfc3339_with_offset() {
            let et = EventTime::parse("2025-02-05T12:30:00+02:00").unwrap();
            assert_eq!(et.as_datetime(), Some(&utc(2025, 2, 5, 10, 30, 0)));
        }

        #[test]
        fn parse_naive_datetime_as_utc() {
            let et = EventTime::parse("2025-02-05T10:30:00.250").unwrap();
            assert_eq!(et.date(), date(2025, 2, 5));
            assert!(et.as_datetime().is_some());
        }

        #[test]
        fn parse_all_day() {
            let et = EventTime::parse("2025-02-05").unwrap();
            assert_eq!(et, EventTime::from_date(date(2025, 2, 5)));
            assert!(et.is_all_day());
            assert_eq!(et.to_utc_datetime(), utc(2025, 2, 5, 0, 0, 0));
        }

        #[test]
        fn parse_missing() {
            assert_eq!(EventTime::parse(""), Err(TimeParseError::Missing));
            assert_eq!(EventTime::parse("   "), Err(TimeParseError::Missing));
        }

        #[test]
        fn parse_garbage() {
            let err = EventTime::parse("next tuesday").unwrap_err();
            assert!(matches!(err, TimeParseError::Invalid { .. }));
            assert!(err.to_string().contains("next tuesday"));

            assert!(EventTime::parse("2025-13-45T99:00:00Z").is_err());
        }

        #[test]
        fn ordering() {
            let et1 = EventTime::from_utc(utc(2025, 2, 5, 10, 0, 0));
            let et2 = EventTime::from_utc(utc(2025, 2, 5, 11, 0, 0));
            let et3 = EventTime::from_date(date(2025, 2, 5));

            assert!(et3 < et1); // midnight < 10:00
            assert!(et1 < et2);
        }
    }

    mod time_window {
        use super::*;

        #[test]
        #[should_panic(expected = "start must be <= end")]
        fn invalid_window() {
            TimeWindow::new(utc(2025, 2, 5, 17, 0, 0), utc(2025, 2, 5, 9, 0, 0));
        }

        #[test]
        fn contains_datetime() {
            let window = TimeWindow::new(utc(2025, 2, 5, 9, 0, 0), utc(2025, 2, 5, 17, 0, 0));

            assert!(window.contains(utc(2025, 2, 5, 10, 0, 0)));
            assert!(window.contains(utc(2025, 2, 5, 9, 0, 0))); // start inclusive
            assert!(!window.contains(utc(2025, 2, 5, 17, 0, 0))); // end exclusive
            assert!(!window.contains(utc(2025, 2, 5, 8, 59, 59)));
        }

        #[test]
        fn tomorrow_from_late_evening() {
            let window = TimeWindow::tomorrow_utc(utc(2025, 2, 5, 23, 59, 59));
            assert_eq!(window.start, utc(2025, 2, 6, 0, 0, 0));
            assert_eq!(window.end, utc(2025, 2, 7, 0, 0, 0));
            assert_eq!(window.duration(), Duration::hours(24));
        }

        #[test]
        fn tomorrow_across_month_end() {
            let window = TimeWindow::tomorrow_utc(utc(2024, 2, 29, 8, 0, 0));
            assert_eq!(window.start, utc(2024, 3, 1, 0, 0, 0));
            assert_eq!(window.end.to_rfc3339(), "2024-03-02T00:00:00+00:00");
        }
    }
}
