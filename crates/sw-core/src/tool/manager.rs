//! Tool manager for registering and executing tools

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};

use crate::tool::{Tool, ToolDefinition, ToolResult};
use crate::Result;

/// Manager for registered tools
///
/// Tools keep their registration order, which is the order manifests list them in.
#[derive(Clone)]
pub struct ToolManager {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolManager {
    /// Create a new empty tool manager
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
        }
    }

    /// Register a tool
    ///
    /// If a tool with the same name already exists, it is replaced in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        tracing::debug!(tool = tool.name(), "Registered tool");
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(slot) => *slot = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Definitions of all registered tools
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.input_schema()))
            .collect()
    }

    /// Manifest document `{"tools": [{name, description, input_schema}, ...]}`
    pub fn manifest(&self) -> JsonValue {
        json!({ "tools": self.definitions() })
    }

    /// Execute a tool by name
    ///
    /// # Errors
    /// Returns [`crate::Error::ToolExecution`] if the tool is not registered,
    /// or whatever the tool itself fails with.
    pub async fn execute(&self, name: &str, input: JsonValue) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| crate::Error::ToolExecution(format!("Unknown tool: {}", name)))?;
        tool.execute(input).await
    }

    /// Check if a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registered tool names in order
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}
