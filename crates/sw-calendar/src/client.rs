//! Google Calendar v3 client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};
use url::Url;

use sw_core::{BusyInterval, CalendarGateway, CreatedEvent, EventTime, MeetingRequest, TimeWindow};

use crate::auth::{token_source_from_config, TokenSource};
use crate::error::{CalendarError, Result};
use crate::models::{
    ApiErrorEnvelope, Attendee, EventInsert, FreeBusyItem, FreeBusyRequest, FreeBusyResponse,
};

/// Calendar API client backed by a [`TokenSource`]
pub struct GoogleCalendarClient {
    http: Client,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
    timezone: Tz,
}

impl GoogleCalendarClient {
    /// Create a client against `base_url` (e.g. `https://www.googleapis.com`)
    pub fn new(
        http: Client,
        base_url: &str,
        tokens: Arc<dyn TokenSource>,
        timezone: Tz,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CalendarError::Configuration(format!("Invalid API base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CalendarError::Configuration(format!(
                "Invalid API base URL '{}'",
                base_url
            )));
        }

        info!("Calendar client initialized for: {}", base_url);

        Ok(Self {
            http,
            base_url,
            tokens,
            timezone,
        })
    }

    /// Build the client, HTTP timeout and token source from configuration
    pub fn from_config(config: &sw_core::CalendarConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CalendarError::Configuration(e.to_string()))?;
        let timezone = sw_core::time::parse_timezone(&config.timezone)
            .map_err(|e| CalendarError::Configuration(e.to_string()))?;
        let tokens = token_source_from_config(config, &http);

        Self::new(http, &config.api_base_url, tokens, timezone)
    }

    /// `{base}/calendar/v3/<segments...>`, each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CalendarError::Configuration(format!("Invalid API base URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(["calendar", "v3"])
            .extend(segments);
        Ok(url)
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.tokens.access_token().await?;

        debug!("POST {}", url);
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| CalendarError::Connection(e.to_string()))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| CalendarError::Parse(format!("Failed to parse calendar response: {}", e)))
    }

    /// Busy periods of `calendar_id` within the window
    pub async fn free_busy(&self, calendar_id: &str, window: &TimeWindow) -> Result<Vec<BusyInterval>> {
        let url = self.endpoint(&["freeBusy"])?;
        let body = FreeBusyRequest {
            time_min: window.start().to_rfc3339(),
            time_max: window.end().to_rfc3339(),
            time_zone: self.timezone.name(),
            items: vec![FreeBusyItem { id: calendar_id }],
        };

        let mut response: FreeBusyResponse = self.post_json(url, &body).await?;
        let calendar = response.calendars.remove(calendar_id).ok_or_else(|| {
            CalendarError::Parse(format!("Calendar '{}' missing from free/busy response", calendar_id))
        })?;

        if !calendar.errors.is_empty() {
            let reasons: Vec<&str> = calendar.errors.iter().map(|e| e.reason.as_str()).collect();
            error!(calendar_id, reasons = ?reasons, "Free/busy query rejected");
            return Err(CalendarError::CalendarUnavailable {
                calendar_id: calendar_id.to_string(),
                reasons: reasons.join(", "),
            });
        }

        let busy: Vec<BusyInterval> = calendar
            .busy
            .into_iter()
            .map(|p| BusyInterval::new(p.start.with_timezone(&Utc), p.end.with_timezone(&Utc)))
            .collect();

        debug!(calendar_id, busy = busy.len(), "Fetched busy periods");
        Ok(busy)
    }

    /// Create a timed event in `calendar_id`
    pub async fn create_event(&self, calendar_id: &str, request: &MeetingRequest) -> Result<CreatedEvent> {
        let url = self.endpoint(&["calendars", calendar_id, "events"])?;
        let attendees = (!request.attendees.is_empty()).then(|| {
            request
                .attendees
                .iter()
                .map(|email| Attendee { email })
                .collect()
        });
        let body = EventInsert {
            summary: &request.summary,
            description: &request.description,
            start: EventTime::at(&request.start),
            end: EventTime::at(&request.end),
            attendees,
        };

        let event: CreatedEvent = self.post_json(url, &body).await?;
        info!(calendar_id, event_id = %event.id, "Created event");
        Ok(event)
    }
}

/// Turn a non-success response into [`CalendarError::Api`], keeping the provider message
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    error!("Calendar request failed: {} - {}", status, error_text);

    let message = serde_json::from_str::<ApiErrorEnvelope>(&error_text)
        .map(|envelope| envelope.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .or_else(|| (!error_text.trim().is_empty()).then(|| error_text.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

    Err(CalendarError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CalendarGateway for GoogleCalendarClient {
    async fn query_busy(&self, calendar_id: &str, window: &TimeWindow) -> sw_core::Result<Vec<BusyInterval>> {
        Ok(self.free_busy(calendar_id, window).await?)
    }

    async fn insert_event(&self, calendar_id: &str, request: &MeetingRequest) -> sw_core::Result<CreatedEvent> {
        Ok(self.create_event(calendar_id, request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MissingCredentials, StaticTokenSource};
    use chrono::{DateTime, TimeZone};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, tz: Tz) -> GoogleCalendarClient {
        GoogleCalendarClient::new(
            Client::new(),
            &server.uri(),
            Arc::new(StaticTokenSource::new("test-token")),
            tz,
        )
        .unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 20, h, m, 0).unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::new(at(9, 0), at(12, 0)).unwrap()
    }

    #[test]
    fn test_endpoint_encoding() {
        let client = GoogleCalendarClient::new(
            Client::new(),
            "https://www.googleapis.com",
            Arc::new(StaticTokenSource::new("t")),
            chrono_tz::UTC,
        )
        .unwrap();

        let url = client.endpoint(&["calendars", "en.usa#holiday@group.v.calendar.google.com", "events"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/en.usa%23holiday@group.v.calendar.google.com/events"
        );

        assert!(GoogleCalendarClient::new(
            Client::new(),
            "not a url",
            Arc::new(StaticTokenSource::new("t")),
            chrono_tz::UTC,
        )
        .is_err());
    }

    #[tokio::test]
    async fn test_free_busy() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/calendar/v3/freeBusy"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_partial_json(json!({
                "timeMin": "2025-08-20T09:00:00+00:00",
                "timeMax": "2025-08-20T12:00:00+00:00",
                "timeZone": "Europe/Stockholm",
                "items": [{"id": "team@example.com"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "calendar#freeBusy",
                "calendars": {
                    "team@example.com": {
                        "busy": [
                            {"start": "2025-08-20T12:30:00+02:00", "end": "2025-08-20T13:00:00+02:00"},
                            {"start": "2025-08-20T09:00:00Z", "end": "2025-08-20T09:15:00Z"}
                        ]
                    }
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let busy = client(&mock_server, chrono_tz::Europe::Stockholm)
            .query_busy("team@example.com", &window())
            .await
            .unwrap();

        assert_eq!(
            busy,
            vec![
                BusyInterval::new(at(10, 30), at(11, 0)),
                BusyInterval::new(at(9, 0), at(9, 15)),
            ]
        );
    }

    #[tokio::test]
    async fn test_free_busy_calendar_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/calendar/v3/freeBusy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "calendars": {
                    "missing@example.com": {
                        "errors": [{"domain": "global", "reason": "notFound"}],
                        "busy": []
                    }
                }
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server, chrono_tz::UTC)
            .query_busy("missing@example.com", &window())
            .await
            .unwrap_err();

        assert!(matches!(err, sw_core::Error::Upstream(ref m) if m.contains("notFound")));
    }

    #[tokio::test]
    async fn test_provider_error_message_passes_through() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/calendar/v3/freeBusy"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "Rate Limit Exceeded", "errors": []}
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server, chrono_tz::UTC)
            .query_busy("team@example.com", &window())
            .await
            .unwrap_err();

        assert!(matches!(err, sw_core::Error::Upstream(ref m) if m == "Rate Limit Exceeded"));
    }

    #[tokio::test]
    async fn test_raw_error_body_when_not_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/calendar/v3/freeBusy"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway from proxy"))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server, chrono_tz::UTC)
            .free_busy("team@example.com", &window())
            .await
            .unwrap_err();

        assert!(matches!(err, CalendarError::Api { status: 502, ref message } if message == "Bad Gateway from proxy"));
    }

    #[tokio::test]
    async fn test_insert_event() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/calendar/v3/calendars/team@example.com/events"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_partial_json(json!({
                "summary": "Kickoff",
                "description": "",
                "start": {"dateTime": "2025-08-20T12:00:00+00:00", "timeZone": "UTC"},
                "end": {"dateTime": "2025-08-20T13:00:00+00:00", "timeZone": "UTC"},
                "attendees": [{"email": "ana@example.com"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "calendar#event",
                "id": "evt123",
                "status": "confirmed",
                "htmlLink": "https://www.google.com/calendar/event?eid=evt123",
                "summary": "Kickoff",
                "start": {"dateTime": "2025-08-20T12:00:00Z", "timeZone": "UTC"},
                "end": {"dateTime": "2025-08-20T13:00:00Z", "timeZone": "UTC"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let request = MeetingRequest {
            start: chrono_tz::UTC.with_ymd_and_hms(2025, 8, 20, 12, 0, 0).unwrap(),
            end: chrono_tz::UTC.with_ymd_and_hms(2025, 8, 20, 13, 0, 0).unwrap(),
            summary: "Kickoff".to_string(),
            description: String::new(),
            attendees: vec!["ana@example.com".to_string()],
        };

        let event = client(&mock_server, chrono_tz::UTC)
            .insert_event("team@example.com", &request)
            .await
            .unwrap();

        assert_eq!(event.id, "evt123");
        assert_eq!(event.summary.as_deref(), Some("Kickoff"));
        assert_eq!(event.start.date_time.as_deref(), Some("2025-08-20T12:00:00Z"));
        assert_eq!(event.html_link.as_deref(), Some("https://www.google.com/calendar/event?eid=evt123"));
    }

    #[tokio::test]
    async fn test_insert_event_omits_empty_attendees() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/calendar/v3/calendars/team@example.com/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "evt124",
                "start": {"dateTime": "2025-08-20T12:00:00Z"},
                "end": {"dateTime": "2025-08-20T13:00:00Z"}
            })))
            .mount(&mock_server)
            .await;

        let request = MeetingRequest {
            start: chrono_tz::UTC.with_ymd_and_hms(2025, 8, 20, 12, 0, 0).unwrap(),
            end: chrono_tz::UTC.with_ymd_and_hms(2025, 8, 20, 13, 0, 0).unwrap(),
            summary: "Meeting".to_string(),
            description: String::new(),
            attendees: vec![],
        };

        client(&mock_server, chrono_tz::UTC)
            .insert_event("team@example.com", &request)
            .await
            .unwrap();

        let received = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert!(body.get("attendees").is_none());
    }

    #[tokio::test]
    async fn test_missing_credentials_is_configuration_error() {
        let mock_server = MockServer::start().await;
        let client = GoogleCalendarClient::new(
            Client::new(),
            &mock_server.uri(),
            Arc::new(MissingCredentials::new("GOOGLE_APPLICATION_CREDENTIALS is not set")),
            chrono_tz::UTC,
        )
        .unwrap();

        let err = client.query_busy("team@example.com", &window()).await.unwrap_err();
        assert!(matches!(err, sw_core::Error::Configuration(_)));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }
}
