//! In-memory backends for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};

use calscan_core::{CalendarEvent, ReminderEvent, TimeWindow};
use calscan_providers::{
    BoxFuture, CalendarBackend, GenerationRequest, InsertedEvent, ProviderError, ProviderErrorCode,
    ProviderResult, TextGenerator,
};

/// 2025-02-05 08:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 5, 8, 0, 0).unwrap()
}

pub fn tomorrow() -> TimeWindow {
    TimeWindow::tomorrow_utc(now())
}

/// Calendar backend holding events per calendar and recording inserts.
#[derive(Default)]
pub struct FakeBackend {
    calendars: HashMap<String, Vec<CalendarEvent>>,
    fail_inserts: bool,
    listed: Mutex<Vec<String>>,
    inserted: Mutex<Vec<(String, ReminderEvent)>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(mut self, calendar_id: &str, events: Vec<CalendarEvent>) -> Self {
        self.calendars.insert(calendar_id.to_string(), events);
        self
    }

    pub fn failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    pub fn inserted(&self) -> Vec<(String, ReminderEvent)> {
        self.inserted.lock().unwrap().clone()
    }
}

impl CalendarBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        self.listed.lock().unwrap().push(calendar_id.to_string());
        let result = match self.calendars.get(calendar_id) {
            Some(events) => Ok(events
                .iter()
                .filter(|event| {
                    event
                        .start_time()
                        .map_or(true, |start| window.contains(start.to_utc_datetime()))
                })
                .cloned()
                .collect()),
            None => Err(ProviderError::new(
                ProviderErrorCode::NotFound,
                format!("calendar {} not found", calendar_id),
            )),
        };
        Box::pin(async move { result })
    }

    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a ReminderEvent,
    ) -> BoxFuture<'a, ProviderResult<InsertedEvent>> {
        let result = if self.fail_inserts {
            Err(ProviderError::authorization("insufficient permissions"))
        } else {
            let mut inserted = self.inserted.lock().unwrap();
            inserted.push((calendar_id.to_string(), event.clone()));
            Ok(InsertedEvent::new(format!("reminder-{}", inserted.len())))
        };
        Box::pin(async move { result })
    }
}

/// Generator returning a fixed reply or error and recording requests.
pub struct ScriptedGenerator {
    reply: Result<String, String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn reply(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        self.requests.lock().unwrap().push(request.clone());
        let result = self.reply.clone().map_err(ProviderError::inference);
        Box::pin(async move { result })
    }
}
