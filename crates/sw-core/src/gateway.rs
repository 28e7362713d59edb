//! Calendar provider seam

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BusyInterval, CreatedEvent, MeetingRequest, TimeWindow};

/// Access to a calendar provider's free/busy and event APIs
///
/// Implementations surface provider failures as [`crate::Error::Upstream`] and
/// missing credentials as [`crate::Error::Configuration`]. No retries.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Busy periods of one calendar within the window, in no particular order
    async fn query_busy(&self, calendar_id: &str, window: &TimeWindow) -> Result<Vec<BusyInterval>>;

    /// Create an event and return the provider's view of it
    async fn insert_event(&self, calendar_id: &str, request: &MeetingRequest) -> Result<CreatedEvent>;
}
