//! Data models shared by the calculator, the gateway and every transport

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::error::{Error, Result};

/// Summary used when a booking does not name one
pub const DEFAULT_SUMMARY: &str = "Meeting";

/// Search window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting `start >= end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(Error::validation("start must be before end"));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn length(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// A period during which the calendar is occupied, as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Strict overlap with `[start, end)`; touching endpoints do not count
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

/// Meeting length, always strictly positive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDuration(TimeDelta);

impl SlotDuration {
    /// Convert a number of minutes, rejecting zero, negative and overflowing values
    pub fn from_minutes(minutes: i64) -> Result<Self> {
        if minutes <= 0 {
            return Err(Error::validation("duration_minutes must be a positive integer"));
        }
        TimeDelta::try_minutes(minutes)
            .map(Self)
            .ok_or_else(|| Error::validation("duration_minutes is out of range"))
    }

    pub fn as_delta(&self) -> TimeDelta {
        self.0
    }

    pub fn minutes(&self) -> i64 {
        self.0.num_minutes()
    }
}

/// A candidate meeting time offered to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Slot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Render both endpoints as RFC 3339 in the given timezone
    pub fn localized(&self, tz: &Tz) -> LocalSlot {
        LocalSlot {
            start: self.start.with_timezone(tz).to_rfc3339(),
            end: self.end.with_timezone(tz).to_rfc3339(),
        }
    }
}

/// Wire form of a [`Slot`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSlot {
    pub start: String,
    pub end: String,
}

/// Slot computation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotPolicy {
    /// Maximal free gaps at least as long as the duration
    #[default]
    Gaps,
    /// Fixed-length slots aligned to the window start
    Grid,
}

impl SlotPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gaps => "gaps",
            Self::Grid => "grid",
        }
    }

    /// Key under which the slots are listed in responses
    pub fn response_key(&self) -> &'static str {
        match self {
            Self::Gaps => "free_slots",
            Self::Grid => "slots",
        }
    }
}

impl fmt::Display for SlotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gaps" | "free" => Ok(Self::Gaps),
            "grid" => Ok(Self::Grid),
            other => Err(Error::validation(format!(
                "Unknown slot policy '{}', expected 'gaps' or 'grid'",
                other
            ))),
        }
    }
}

/// Result of a slot computation
#[derive(Debug, Clone, PartialEq)]
pub struct Availability {
    pub policy: SlotPolicy,
    pub duration: SlotDuration,
    pub slots: Vec<Slot>,
}

impl Availability {
    /// JSON body `{"free_slots": [...]}` or `{"slots": [...]}` depending on the policy
    pub fn render(&self, tz: &Tz) -> JsonValue {
        let slots: Vec<LocalSlot> = self.slots.iter().map(|s| s.localized(tz)).collect();
        let mut body = serde_json::Map::new();
        body.insert(self.policy.response_key().to_string(), json!(slots));
        JsonValue::Object(body)
    }
}

/// An event to create in the calendar
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingRequest {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub summary: String,
    pub description: String,
    pub attendees: Vec<String>,
}

/// Start or end of a provider event
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    /// Timed event endpoint in the given timezone
    pub fn at(instant: &DateTime<Tz>) -> Self {
        Self {
            date_time: Some(instant.to_rfc3339()),
            date: None,
            time_zone: Some(instant.timezone().name().to_string()),
        }
    }
}

/// The subset of a created provider event echoed back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
    #[serde(rename = "htmlLink", alias = "link", default)]
    pub html_link: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
}
