//! Tool system for agent tool calls
//!
//! Tools wrap scheduling operations behind a name, a description and a JSON
//! input schema so they can be listed in a manifest and invoked by name.

pub mod definition;
pub mod manager;
pub mod traits;

pub use definition::{SchemaBuilder, ToolDefinition};
pub use manager::ToolManager;
pub use traits::{Tool, ToolResult};
