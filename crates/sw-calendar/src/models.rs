//! Google Calendar v3 wire types

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sw_core::EventTime;

/// `POST /calendar/v3/freeBusy` body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyRequest<'a> {
    pub time_min: String,
    pub time_max: String,
    pub time_zone: &'a str,
    pub items: Vec<FreeBusyItem<'a>>,
}

#[derive(Debug, Serialize)]
pub struct FreeBusyItem<'a> {
    pub id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct FreeBusyResponse {
    #[serde(default)]
    pub calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FreeBusyCalendar {
    #[serde(default)]
    pub busy: Vec<BusyPeriod>,
    #[serde(default)]
    pub errors: Vec<FreeBusyError>,
}

#[derive(Debug, Deserialize)]
pub struct BusyPeriod {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// Per-calendar failure, e.g. `{"domain": "global", "reason": "notFound"}`
#[derive(Debug, Deserialize)]
pub struct FreeBusyError {
    #[serde(default)]
    pub domain: Option<String>,
    pub reason: String,
}

/// `POST /calendar/v3/calendars/{id}/events` body
#[derive(Debug, Serialize)]
pub struct EventInsert<'a> {
    pub summary: &'a str,
    pub description: &'a str,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee<'a>>>,
}

#[derive(Debug, Serialize)]
pub struct Attendee<'a> {
    pub email: &'a str,
}

/// Error envelope returned by Google APIs
#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    pub message: String,
}

/// OAuth token endpoint answer
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}
