//! HTTP API handlers
//!
//! Thin adapters from HTTP requests onto the scheduling service and the tool
//! manifest.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use sw_core::{BookingInput, SlotPolicy, SlotQuery};

use crate::error::{ApiError, Result};
use crate::server::AppState;

// ============================================================================
// Request types
// ============================================================================

/// Query string of `GET /get_available_slots`
///
/// Everything arrives as text so malformed numbers surface as our own 400s.
#[derive(Debug, Default, Deserialize)]
pub struct SlotsParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub duration_minutes: Option<String>,
    pub policy: Option<String>,
}

impl SlotsParams {
    fn into_query(self) -> Result<SlotQuery> {
        let duration_minutes = match non_empty(self.duration_minutes) {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                ApiError::bad_request(format!(
                    "duration_minutes must be an integer, got '{}'",
                    raw
                ))
            })?),
            None => None,
        };
        let policy = non_empty(self.policy)
            .map(|raw| raw.parse::<SlotPolicy>())
            .transpose()?;

        Ok(SlotQuery {
            start: self.start,
            end: self.end,
            duration_minutes,
            policy,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Static tool manifest (`/`, `/mcp/tools`, `/sse`)
pub async fn manifest(State(state): State<AppState>) -> Json<Value> {
    Json(state.tools.manifest())
}

/// Free slots in the requested window
pub async fn get_available_slots(
    State(state): State<AppState>,
    params: std::result::Result<Query<SlotsParams>, QueryRejection>,
) -> Result<Json<Value>> {
    state.service.calendar_id()?;
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    debug!("Slots request: {:?}", params);

    let availability = state.service.available_slots(params.into_query()?).await?;
    Ok(Json(availability.render(state.service.timezone())))
}

/// Create an event from a JSON body
pub async fn book_meeting(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    state.service.calendar_id()?;
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::bad_request("Request body must be JSON"))?;
    if !payload.as_object().is_some_and(|obj| !obj.is_empty()) {
        return Err(ApiError::bad_request("Request body must be JSON"));
    }
    let input: BookingInput = serde_json::from_value(payload)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))?;

    let event = state.service.book_meeting(input).await?;
    info!("Booked event {}", event.id);
    Ok((StatusCode::CREATED, Json(event)).into_response())
}
