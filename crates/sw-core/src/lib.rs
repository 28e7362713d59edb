//! sw-core: slotwise core library
//!
//! Configuration, error taxonomy, data model, the free-slot calculator,
//! the calendar gateway seam, the scheduling service and the tool system.

pub mod availability;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod service;
pub mod time;
pub mod tool;

pub use config::{ApiConfig, CalendarConfig, Config, ServerConfig, SlotsConfig};
pub use error::{Error, Result};
pub use gateway::CalendarGateway;
pub use models::{
    Availability, BusyInterval, CreatedEvent, EventTime, LocalSlot, MeetingRequest, Slot,
    SlotDuration, SlotPolicy, TimeWindow,
};
pub use service::{BookingInput, SchedulingService, ServiceSettings, SlotQuery};
pub use tool::{SchemaBuilder, Tool, ToolDefinition, ToolManager, ToolResult};
