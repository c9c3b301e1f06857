//! Reminder writing stage.

use chrono::NaiveDate;
use tracing::{error, info, warn};

use calscan_core::{ReminderEvent, is_reminder_title};
use calscan_providers::{CalendarBackend, InsertedEvent};

/// Inserts the reminder for `day` listing `events_text`.
///
/// Returns `None` when the insert fails; there is no retry.
pub async fn create_reminder(
    backend: &dyn CalendarBackend,
    calendar_id: &str,
    day: NaiveDate,
    events_text: &str,
    prefix: &str,
) -> Option<InsertedEvent> {
    let reminder = ReminderEvent::for_day(day, events_text, prefix);

    match backend.insert_event(calendar_id, &reminder).await {
        Ok(inserted) => {
            info!(
                "Created reminder in calendar {} with event ID {} on {}",
                calendar_id, inserted.id, day
            );
            Some(inserted)
        }
        Err(e) => {
            error!(
                "Error creating reminder event in calendar {}: {}",
                calendar_id, e
            );
            None
        }
    }
}

/// Returns true if a reminder already starts in `day`'s slot.
///
/// A failed lookup counts as "no reminder yet".
pub async fn already_reminded(
    backend: &dyn CalendarBackend,
    calendar_id: &str,
    day: NaiveDate,
) -> bool {
    let slot = ReminderEvent::slot(day);

    let events = match backend.list_events(calendar_id, &slot).await {
        Ok(events) => events,
        Err(e) => {
            warn!(
                "Could not check calendar {} for existing reminders: {}",
                calendar_id, e
            );
            return false;
        }
    };

    events.iter().any(|event| {
        event.usable_title().is_some_and(is_reminder_title)
            && event
                .start_time()
                .is_ok_and(|start| start.to_utc_datetime() == slot.start)
    })
}
