//! Free slot lookup tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sw_core::{Result, SchedulingService, SchemaBuilder, SlotQuery, Tool, ToolResult};

use crate::{into_tool_result, parse_input};

/// Finds free meeting slots in the configured calendar
pub struct GetAvailableSlotsTool {
    service: Arc<SchedulingService>,
}

impl GetAvailableSlotsTool {
    pub fn new(service: Arc<SchedulingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for GetAvailableSlotsTool {
    fn name(&self) -> &str {
        "get_available_slots"
    }

    fn description(&self) -> &str {
        "Check free slots in Google Calendar between two times"
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::new()
            .date_time("start", "Start of the search window (ISO 8601)", true)
            .date_time("end", "End of the search window (ISO 8601)", true)
            .integer("duration_minutes", "Meeting length in minutes", true)
            .string_enum(
                "policy",
                "'gaps' for maximal free periods, 'grid' for fixed-length slots",
                &["gaps", "grid"],
                false,
            )
            .build()
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let query: SlotQuery = match parse_input(input) {
            Ok(query) => query,
            Err(message) => return Ok(ToolResult::error(message)),
        };

        tracing::debug!(start = ?query.start, end = ?query.end, "get_available_slots called");

        let outcome = self
            .service
            .available_slots(query)
            .await
            .map(|availability| availability.render(self.service.timezone()).to_string());
        into_tool_result(outcome)
    }
}
