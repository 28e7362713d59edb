//! sw-tools: Calendar tools for slotwise
//!
//! The two agent-facing operations, `get_available_slots` and `book_meeting`,
//! as [`sw_core::Tool`] implementations over a shared [`SchedulingService`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use sw_core::{Result, SchedulingService, ToolManager, ToolResult};

pub mod booking;
pub mod slots;

pub use booking::BookMeetingTool;
pub use slots::GetAvailableSlotsTool;

/// Register the calendar tools with the tool manager
pub fn register_calendar_tools(manager: &mut ToolManager, service: Arc<SchedulingService>) {
    manager.register(Arc::new(GetAvailableSlotsTool::new(service.clone())));
    manager.register(Arc::new(BookMeetingTool::new(service)));
}

/// Deserialize tool arguments; `null` counts as an empty object
fn parse_input<T: DeserializeOwned + Default>(input: Value) -> std::result::Result<T, String> {
    if input.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(input).map_err(|e| format!("Invalid input: {}", e))
}

/// Caller mistakes become error results; other failures propagate
fn into_tool_result(outcome: Result<String>) -> Result<ToolResult> {
    match outcome {
        Ok(output) => Ok(ToolResult::success(output)),
        Err(e) if e.is_validation() => Ok(ToolResult::error(e.to_string())),
        Err(e) => Err(e),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use test_support::{settings, FakeGateway};

    #[test]
    fn test_register_calendar_tools() {
        let service = Arc::new(SchedulingService::new(Arc::new(FakeGateway::default()), settings()));
        let mut manager = ToolManager::new();
        register_calendar_tools(&mut manager, service);

        assert_eq!(manager.tool_names(), vec!["get_available_slots", "book_meeting"]);
        let manifest = manager.manifest();
        assert_eq!(manifest["tools"].as_array().unwrap().len(), 2);
    }
}
