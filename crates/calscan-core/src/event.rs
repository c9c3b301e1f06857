//! Calendar event and reminder types.
//!
//! [`CalendarEvent`] is the read-only view of an event fetched from the
//! monitored calendar. [`ReminderEvent`] is the summary event written back
//! to the user's own calendar.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::time::{EventTime, TimeParseError, TimeWindow};

/// Marker prepended to every reminder title.
pub const REMINDER_MARKER: &str = "⚠️";

/// An event fetched from a calendar backend.
///
/// Start and end are kept as the raw strings the backend returned; callers
/// parse them with [`CalendarEvent::start_time`] and decide what to do with
/// events that do not parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Backend identifier.
    pub id: String,
    /// Event title, if the event has one.
    pub title: Option<String>,
    /// Raw start (`dateTime` or all-day `date`).
    pub start: String,
    /// Raw end (`dateTime` or all-day `date`).
    pub end: String,
}

impl CalendarEvent {
    /// Creates an untitled event.
    pub fn new(id: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            start: start.into(),
            end: end.into(),
        }
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Parses the start timestamp.
    pub fn start_time(&self) -> Result<EventTime, TimeParseError> {
        EventTime::parse(&self.start)
    }

    /// Parses the end timestamp.
    pub fn end_time(&self) -> Result<EventTime, TimeParseError> {
        EventTime::parse(&self.end)
    }

    /// Returns the title if it is present and non-empty.
    ///
    /// Whitespace-only titles are kept.
    pub fn usable_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }
}

/// The summary event written to the user's calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEvent {
    /// Marker plus pluralized count, e.g. `⚠️ 2 Reminders`.
    pub title: String,
    /// Configured prefix followed by the filtered event list.
    pub description: String,
    /// Always 09:30 UTC on the reminder day.
    pub start: DateTime<Utc>,
    /// Thirty minutes after `start`.
    pub end: DateTime<Utc>,
}

impl ReminderEvent {
    /// Hour (UTC) at which reminders start.
    pub const START_HOUR: u32 = 9;
    /// Minute at which reminders start.
    pub const START_MINUTE: u32 = 30;
    /// Length of the reminder block in minutes.
    pub const DURATION_MINUTES: i64 = 30;

    /// Builds the reminder for `day` from the filtered event text.
    pub fn for_day(day: NaiveDate, events_text: &str, prefix: &str) -> Self {
        let slot = Self::slot(day);
        Self {
            title: reminder_title(count_listed_events(events_text)),
            description: format!("{prefix}{events_text}"),
            start: slot.start,
            end: slot.end,
        }
    }

    /// The 09:30–10:00 UTC block on `day`.
    pub fn slot(day: NaiveDate) -> TimeWindow {
        let start = day
            .and_hms_opt(Self::START_HOUR, Self::START_MINUTE, 0)
            .expect("valid time")
            .and_utc();
        TimeWindow::from_duration(start, Duration::minutes(Self::DURATION_MINUTES))
    }
}

/// Counts the entries in a comma-separated event list.
///
/// Commas inside a title are not distinguished from separators, so
/// `"Dinner, drinks"` counts as two.
pub fn count_listed_events(text: &str) -> usize {
    text.split(',').count()
}

/// Formats the reminder title for `count` events.
pub fn reminder_title(count: usize) -> String {
    let plural = if count > 1 { "s" } else { "" };
    format!("{REMINDER_MARKER} {count} Reminder{plural}")
}

/// Returns true if `title` looks like one of our reminders.
pub fn is_reminder_title(title: &str) -> bool {
    title.trim_start().starts_with(REMINDER_MARKER)
}
