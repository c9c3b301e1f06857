//! Event fetching stage.

use tracing::{debug, error, info};

use calscan_core::{CalendarEvent, TimeWindow};
use calscan_providers::CalendarBackend;

/// Fetches the events of `calendar_id` in `window`.
///
/// Never fails: a backend error is logged and yields no events.
pub async fn fetch_events(
    backend: &dyn CalendarBackend,
    calendar_id: &str,
    window: &TimeWindow,
) -> Vec<CalendarEvent> {
    match backend.list_events(calendar_id, window).await {
        Ok(events) => {
            info!(
                "Fetched {} events from calendar {}",
                events.len(),
                calendar_id
            );
            events
        }
        Err(e) => {
            error!(
                transient = e.code().is_transient(),
                "Error fetching events from calendar {}: {}", calendar_id, e
            );
            Vec::new()
        }
    }
}

/// Titles worth sending to the filter.
///
/// Events whose start does not parse are logged and skipped; events with a
/// missing or empty title are ignored.
pub fn usable_titles(events: &[CalendarEvent]) -> Vec<String> {
    events
        .iter()
        .filter(|event| match event.start_time() {
            Ok(_) => true,
            Err(e) => {
                error!("Skipping event {} due to parsing error: {}", event.id, e);
                false
            }
        })
        .filter_map(|event| {
            let title = event.usable_title();
            if title.is_none() {
                debug!(event_id = %event.id, "ignoring untitled event");
            }
            title.map(str::to_string)
        })
        .collect()
}
