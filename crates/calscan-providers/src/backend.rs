//! CalendarBackend trait definition.
//!
//! The scanner needs two things from a calendar service: list the events of
//! one calendar inside a time window, and insert a single reminder event.
//! [`CalendarBackend`] covers exactly that, so the pipeline can run against
//! Google Calendar in production and an in-memory fake in tests.

use std::future::Future;
use std::pin::Pin;

use calscan_core::{CalendarEvent, ReminderEvent, TimeWindow};

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Boxing keeps the traits object-safe, so callers can hold
/// `&dyn CalendarBackend`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Identity of an event created by [`CalendarBackend::insert_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedEvent {
    /// Identifier assigned by the backend.
    pub id: String,
    /// Link to the event in the backend's web UI, when provided.
    pub html_link: Option<String>,
}

impl InsertedEvent {
    /// Creates an inserted-event handle with no link.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            html_link: None,
        }
    }

    /// Builder method to set the web link.
    pub fn with_html_link(mut self, link: impl Into<String>) -> Self {
        self.html_link = Some(link.into());
        self
    }
}

/// Read and write access to calendars.
///
/// # Implementation Notes
///
/// - `list_events` handles pagination internally and returns every
///   non-cancelled event overlapping the window, recurring events expanded
///   into instances, ordered by start time.
/// - `insert_event` issues exactly one create request; it never retries.
pub trait CalendarBackend: Send + Sync {
    /// Returns the name of this backend (e.g., "google").
    fn name(&self) -> &str;

    /// Lists the events of `calendar_id` that overlap `window`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network errors, authentication failures,
    /// unknown calendars, etc.
    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>>;

    /// Creates `event` on `calendar_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the backend rejects the event or cannot be
    /// reached.
    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a ReminderEvent,
    ) -> BoxFuture<'a, ProviderResult<InsertedEvent>>;
}

/// A backend that always returns an error.
///
/// Stands in for a calendar service that is unreachable or misconfigured.
#[derive(Debug)]
pub struct ErrorBackend {
    name: String,
    error: ProviderError,
}

impl ErrorBackend {
    /// Creates a new error backend.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn error(&self) -> ProviderError {
        ProviderError::new(self.error.code(), self.error.message()).with_provider(&self.name)
    }
}

impl CalendarBackend for ErrorBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_events<'a>(
        &'a self,
        _calendar_id: &'a str,
        _window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn insert_event<'a>(
        &'a self,
        _calendar_id: &'a str,
        _event: &'a ReminderEvent,
    ) -> BoxFuture<'a, ProviderResult<InsertedEvent>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }
}
