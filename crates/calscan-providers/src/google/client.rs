//! Google Calendar API v3 client.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use calscan_core::{CalendarEvent, ReminderEvent, TimeWindow};

use crate::backend::{BoxFuture, CalendarBackend, InsertedEvent};
use crate::error::{ProviderError, ProviderResult};

use super::config::GoogleConfig;
use super::credentials::Session;

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

const PROVIDER_NAME: &str = "google";

/// Google Calendar API client bound to one session.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
}

impl GoogleCalendarClient {
    /// Creates a client that authenticates with `session`.
    pub fn new(session: &Session, config: &GoogleConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            access_token: session.access_token().to_string(),
        })
    }

    /// Lists every non-cancelled event of `calendar_id` in the window,
    /// following pagination.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> ProviderResult<Vec<CalendarEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_events_page(calendar_id, time_min, time_max, page_token.as_deref())
                .await?;

            events.extend(page.items.into_iter().filter_map(convert_event));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(calendar_id, count = events.len(), "listed events");
        Ok(events)
    }

    async fn list_events_page(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> ProviderResult<EventListResponse> {
        let mut request = self
            .http_client
            .get(events_url(calendar_id))
            .bearer_auth(&self.access_token)
            .query(&[
                ("timeMin", rfc3339(time_min)),
                ("timeMax", rfc3339(time_max)),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_request(e).with_provider(PROVIDER_NAME))?;
        let body = read_success_body(response).await?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse event list: {}", e))
                .with_provider(PROVIDER_NAME)
        })
    }

    /// Creates `reminder` on `calendar_id`.
    pub async fn insert_event(
        &self,
        calendar_id: &str,
        reminder: &ReminderEvent,
    ) -> ProviderResult<InsertedEvent> {
        let response = self
            .http_client
            .post(events_url(calendar_id))
            .bearer_auth(&self.access_token)
            .json(&InsertEventBody::from(reminder))
            .send()
            .await
            .map_err(|e| ProviderError::from_request(e).with_provider(PROVIDER_NAME))?;
        let body = read_success_body(response).await?;

        let created: CreatedEvent = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse created event: {}", e))
                .with_provider(PROVIDER_NAME)
        })?;

        let mut inserted = InsertedEvent::new(created.id);
        if let Some(link) = created.html_link {
            inserted = inserted.with_html_link(link);
        }
        Ok(inserted)
    }
}

impl CalendarBackend for GoogleCalendarClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        Box::pin(self.list_events(calendar_id, window.start, window.end))
    }

    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a ReminderEvent,
    ) -> BoxFuture<'a, ProviderResult<InsertedEvent>> {
        Box::pin(self.insert_event(calendar_id, event))
    }
}

fn events_url(calendar_id: &str) -> String {
    format!(
        "{}/calendars/{}/events",
        CALENDAR_API_BASE,
        urlencoding::encode(calendar_id)
    )
}

fn rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Returns the body of a 2xx response, or the status mapped to an error.
async fn read_success_body(response: reqwest::Response) -> ProviderResult<String> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        ProviderError::network(format!("failed to read response: {}", e))
            .with_provider(PROVIDER_NAME)
    })?;

    if !status.is_success() {
        return Err(ProviderError::from_status(status.as_u16(), &body).with_provider(PROVIDER_NAME));
    }
    Ok(body)
}

/// Drops cancelled and id-less events; keeps the raw start/end strings.
fn convert_event(event: ApiEvent) -> Option<CalendarEvent> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    Some(CalendarEvent {
        id: event.id?,
        title: event.summary,
        start: event.start.unwrap_or_default().into_raw(),
        end: event.end.unwrap_or_default().into_raw(),
    })
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

impl ApiEventTime {
    /// `dateTime` for timed events, `date` for all-day ones, empty otherwise.
    fn into_raw(self) -> String {
        self.date_time.or(self.date).unwrap_or_default()
    }
}

/// Request body for events.insert.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertEventBody<'a> {
    summary: &'a str,
    description: &'a str,
    start: InsertEventTime,
    end: InsertEventTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertEventTime {
    date_time: String,
    time_zone: &'static str,
}

impl InsertEventTime {
    fn utc(dt: DateTime<Utc>) -> Self {
        Self {
            date_time: rfc3339(dt),
            time_zone: "UTC",
        }
    }
}

impl<'a> From<&'a ReminderEvent> for InsertEventBody<'a> {
    fn from(reminder: &'a ReminderEvent) -> Self {
        Self {
            summary: &reminder.title,
            description: &reminder.description,
            start: InsertEventTime::utc(reminder.start),
            end: InsertEventTime::utc(reminder.end),
        }
    }
}

/// The part of the created event resource we keep.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedEvent {
    id: String,
    html_link: Option<String>,
}
