//! Meeting booking tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sw_core::{BookingInput, Result, SchedulingService, SchemaBuilder, Tool, ToolResult};

use crate::{into_tool_result, parse_input};

/// Creates an event in the configured calendar
pub struct BookMeetingTool {
    service: Arc<SchedulingService>,
}

impl BookMeetingTool {
    pub fn new(service: Arc<SchedulingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for BookMeetingTool {
    fn name(&self) -> &str {
        "book_meeting"
    }

    fn description(&self) -> &str {
        "Create a new meeting in Google Calendar"
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::new()
            .date_time("start", "Meeting start (ISO 8601)", true)
            .date_time("end", "Meeting end (ISO 8601)", true)
            .string("summary", "Event title", true)
            .string("description", "Additional details for attendees", false)
            .string_array("attendees", "Email addresses of attendees", false)
            .build()
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let booking: BookingInput = match parse_input(input) {
            Ok(booking) => booking,
            Err(message) => return Ok(ToolResult::error(message)),
        };

        let outcome = match self.service.book_meeting(booking).await {
            Ok(event) => serde_json::to_string(&event).map_err(sw_core::Error::from),
            Err(e) => Err(e),
        };
        into_tool_result(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{settings, FakeGateway};
    use serde_json::json;

    #[tokio::test]
    async fn test_book_meeting() {
        let gateway = Arc::new(FakeGateway::default());
        let tool = BookMeetingTool::new(Arc::new(SchedulingService::new(gateway.clone(), settings())));

        let result = tool
            .execute(json!({
                "start": "2025-08-20T12:00:00Z",
                "end": "2025-08-20T13:00:00Z",
                "summary": "Kickoff",
                "attendees": ["ana@example.com"]
            }))
            .await
            .unwrap();

        assert!(!result.is_error);
        let event: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(event["id"], "evt-1");
        assert_eq!(event["summary"], "Kickoff");
        assert_eq!(event["htmlLink"], "https://calendar.example/evt-1");
        assert_eq!(event["start"]["dateTime"], "2025-08-20T12:00:00+00:00");
        assert_eq!(event["end"]["dateTime"], "2025-08-20T13:00:00+00:00");

        let booked = gateway.booked.lock().unwrap();
        assert_eq!(booked[0].attendees, vec!["ana@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_fields_is_tool_error() {
        let tool = BookMeetingTool::new(Arc::new(SchedulingService::new(
            Arc::new(FakeGateway::default()),
            settings(),
        )));

        let result = tool.execute(json!({"summary": "Kickoff"})).await.unwrap();
        assert!(result.is_error);
        assert_eq!(result.output, "start and end are required");
    }
}
