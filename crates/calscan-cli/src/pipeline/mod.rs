//! The daily scan: fetch tomorrow's events, filter them, write a reminder.

mod fetch;
mod filter;
mod reminder;
#[cfg(test)]
mod testing;

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use calscan_core::{TimeWindow, Verdict};
use calscan_providers::{CalendarBackend, TextGenerator};

pub use fetch::{fetch_events, usable_titles};
pub use filter::filter_significant;
pub use reminder::{already_reminded, create_reminder};

/// Per-run settings taken from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Calendar whose events are scanned.
    pub monitored_calendar_id: String,
    /// Calendar that receives the reminder.
    pub target_calendar_id: String,
    /// Text placed before the event list in the reminder description.
    pub reminder_prefix: String,
    /// Model used by the significance filter.
    pub model: String,
    /// Skip the write when today's slot already holds a reminder.
    pub skip_duplicates: bool,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing with a title is scheduled tomorrow.
    NoEvents,
    /// The filter failed or returned nothing usable.
    FilterError,
    /// The filter judged every event routine.
    NoneSignificant,
    /// A reminder already occupies today's slot.
    AlreadyReminded,
    /// A reminder was written.
    ReminderCreated { event_id: String },
    /// Writing the reminder failed.
    WriteFailed,
}

impl RunOutcome {
    /// Returns true if a reminder was written.
    pub fn created(&self) -> bool {
        matches!(self, Self::ReminderCreated { .. })
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEvents => f.write_str("no events tomorrow"),
            Self::FilterError => f.write_str("filter returned no usable output"),
            Self::NoneSignificant => f.write_str("no significant events tomorrow"),
            Self::AlreadyReminded => f.write_str("reminder already present"),
            Self::ReminderCreated { event_id } => write!(f, "reminder created ({})", event_id),
            Self::WriteFailed => f.write_str("failed to create reminder"),
        }
    }
}

/// Runs one scan against a calendar backend and a text generator.
pub struct Orchestrator<'a> {
    settings: &'a PipelineSettings,
    backend: &'a dyn CalendarBackend,
    generator: &'a dyn TextGenerator,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        settings: &'a PipelineSettings,
        backend: &'a dyn CalendarBackend,
        generator: &'a dyn TextGenerator,
    ) -> Self {
        Self {
            settings,
            backend,
            generator,
        }
    }

    /// Scans the UTC day after `now` and reminds on `now`'s date.
    ///
    /// Every failure past authentication ends the run quietly with an
    /// outcome; nothing here returns an error.
    pub async fn run(&self, now: DateTime<Utc>) -> RunOutcome {
        let settings = self.settings;
        let window = TimeWindow::tomorrow_utc(now);

        let events = fetch_events(self.backend, &settings.monitored_calendar_id, &window)
            .await;
        let titles = usable_titles(&events);
        if titles.is_empty() {
            info!("No important events identified tomorrow");
            return RunOutcome::NoEvents;
        }

        let result = filter_significant(self.generator, &settings.model, &titles)
            .await;
        let events_text = match result.verdict() {
            Verdict::Significant(text) => text,
            Verdict::NoneSignificant => {
                info!("No significant events tomorrow");
                return RunOutcome::NoneSignificant;
            }
            Verdict::Unusable => {
                error!("Error from LLM output: {}", result);
                return RunOutcome::FilterError;
            }
        };

        let today = now.date_naive();
        if settings.skip_duplicates
            && already_reminded(self.backend, &settings.target_calendar_id, today)
                .await
        {
            info!(
                "Reminder for {} already exists in calendar {}",
                today, settings.target_calendar_id
            );
            return RunOutcome::AlreadyReminded;
        }

        match create_reminder(
            self.backend,
            &settings.target_calendar_id,
            today,
            &events_text,
            &settings.reminder_prefix,
        )
        .await
        {
            Some(inserted) => RunOutcome::ReminderCreated {
                event_id: inserted.id,
            },
            None => RunOutcome::WriteFailed,
        }
    }
}
