//! Scheduling service shared by every transport
//!
//! Validates raw caller input, asks the calendar gateway for busy periods or
//! a new event, and runs the slot calculator. Input problems are reported as
//! [`Error::Validation`] before the gateway is touched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::availability;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::gateway::CalendarGateway;
use crate::models::{
    Availability, CreatedEvent, DEFAULT_SUMMARY, MeetingRequest, SlotDuration, SlotPolicy,
    TimeWindow,
};
use crate::time::{parse_datetime, parse_timezone};

/// Settings the service needs from the configuration
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub calendar_id: Option<String>,
    pub timezone: Tz,
    pub default_policy: SlotPolicy,
    pub default_duration_minutes: i64,
}

impl ServiceSettings {
    /// Extract settings, failing on an unknown timezone
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            calendar_id: config.calendar.calendar_id.clone(),
            timezone: parse_timezone(&config.calendar.timezone)?,
            default_policy: config.slots.policy,
            default_duration_minutes: config.slots.default_duration_minutes,
        })
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            calendar_id: None,
            timezone: chrono_tz::UTC,
            default_policy: SlotPolicy::default(),
            default_duration_minutes: 60,
        }
    }
}

/// Raw availability query as received from a transport
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub duration_minutes: Option<i64>,
    pub policy: Option<SlotPolicy>,
}

/// Raw booking request as received from a transport
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingInput {
    pub start: Option<String>,
    pub end: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub attendees: Option<Vec<String>>,
}

/// Free-slot lookup and booking on one configured calendar
pub struct SchedulingService {
    gateway: Arc<dyn CalendarGateway>,
    settings: ServiceSettings,
}

impl SchedulingService {
    pub fn new(gateway: Arc<dyn CalendarGateway>, settings: ServiceSettings) -> Self {
        Self { gateway, settings }
    }

    /// Timezone responses are rendered in
    pub fn timezone(&self) -> &Tz {
        &self.settings.timezone
    }

    /// Compute slots for the query's window
    pub async fn available_slots(&self, query: SlotQuery) -> Result<Availability> {
        let calendar_id = self.calendar_id()?;
        let (start, end) = self.parse_bounds(query.start.as_deref(), query.end.as_deref())?;
        let window = TimeWindow::new(start.with_timezone(&Utc), end.with_timezone(&Utc))?;
        let duration = SlotDuration::from_minutes(
            query
                .duration_minutes
                .unwrap_or(self.settings.default_duration_minutes),
        )?;
        let policy = query.policy.unwrap_or(self.settings.default_policy);

        tracing::debug!(
            calendar_id,
            start = %window.start(),
            end = %window.end(),
            duration_minutes = duration.minutes(),
            policy = %policy,
            "Querying availability"
        );

        let busy = self.gateway.query_busy(calendar_id, &window).await?;
        Ok(availability::compute(policy, &busy, &window, duration))
    }

    /// Create an event for the requested period
    pub async fn book_meeting(&self, input: BookingInput) -> Result<CreatedEvent> {
        let calendar_id = self.calendar_id()?;
        let (start, end) = self.parse_bounds(input.start.as_deref(), input.end.as_deref())?;
        TimeWindow::new(start.with_timezone(&Utc), end.with_timezone(&Utc))?;
        let attendees = normalize_attendees(input.attendees.unwrap_or_default())?;

        let request = MeetingRequest {
            start,
            end,
            summary: input.summary.unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
            description: input.description.unwrap_or_default(),
            attendees,
        };

        let event = self.gateway.insert_event(calendar_id, &request).await?;
        tracing::info!(
            calendar_id,
            event_id = %event.id,
            summary = %request.summary,
            "Booked meeting"
        );
        Ok(event)
    }

    /// Configured calendar id; a missing one is a configuration error
    ///
    /// Every operation checks this first, before looking at its input.
    pub fn calendar_id(&self) -> Result<&str> {
        self.settings
            .calendar_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::configuration("GOOGLE_CALENDAR_ID is not set"))
    }

    fn parse_bounds(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<(DateTime<Tz>, DateTime<Tz>)> {
        let (Some(start), Some(end)) = (non_empty(start), non_empty(end)) else {
            return Err(Error::validation("start and end are required"));
        };
        let tz = &self.settings.timezone;
        Ok((parse_datetime(start, tz)?, parse_datetime(end, tz)?))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Trim addresses and drop blanks; anything without an `@` is rejected
fn normalize_attendees(attendees: Vec<String>) -> Result<Vec<String>> {
    attendees
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .map(|a| {
            if a.contains('@') {
                Ok(a)
            } else {
                Err(Error::validation(format!("Invalid attendee email: '{}'", a)))
            }
        })
        .collect()
}
