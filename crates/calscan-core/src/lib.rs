//! Core types: time windows, events, reminders, significance filtering, tracing

pub mod event;
pub mod significance;
pub mod time;
pub mod tracing;

pub use event::{
    CalendarEvent, REMINDER_MARKER, ReminderEvent, count_listed_events, is_reminder_title,
    reminder_title,
};
pub use significance::{FilterResult, SIGNIFICANCE_PROMPT, Verdict, join_titles};
pub use time::{EventTime, TimeParseError, TimeWindow};
pub use crate::tracing::{
    TracingConfig, TracingError, TracingOutputFormat, build_subscriber, init_tracing,
};
