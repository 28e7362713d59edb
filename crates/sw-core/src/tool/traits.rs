//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::Result;

/// Tool execution result
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Output text, JSON for successful calendar operations
    pub output: String,
    /// Whether the execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: true,
        }
    }
}

/// A callable tool
///
/// Caller mistakes should come back as [`ToolResult::error`]; an `Err` is
/// reserved for failures the caller cannot fix by changing the input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as it appears in the manifest
    fn name(&self) -> &str;

    /// Description shown to the agent when selecting tools
    fn description(&self) -> &str;

    /// JSON schema for the tool's input parameters
    fn input_schema(&self) -> JsonValue;

    /// Execute the tool with the given input
    async fn execute(&self, input: JsonValue) -> Result<ToolResult>;
}
