//! Tool definitions and schema helpers

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

/// Manifest entry for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: JsonValue,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: JsonValue,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Builder for flat object schemas
///
/// ```ignore
/// let schema = SchemaBuilder::new()
///     .string("start", "Window start (ISO 8601)", true)
///     .integer("duration_minutes", "Meeting length", false)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    properties: Map<String, JsonValue>,
    required: Vec<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property with an arbitrary schema
    pub fn property(mut self, name: &str, schema: JsonValue, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn string(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({"type": "string", "description": description}),
            required,
        )
    }

    /// A timestamp string
    pub fn date_time(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({"type": "string", "format": "date-time", "description": description}),
            required,
        )
    }

    pub fn integer(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({"type": "integer", "minimum": 1, "description": description}),
            required,
        )
    }

    /// A string restricted to the given values
    pub fn string_enum(self, name: &str, description: &str, values: &[&str], required: bool) -> Self {
        self.property(
            name,
            json!({"type": "string", "enum": values, "description": description}),
            required,
        )
    }

    pub fn string_array(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({"type": "array", "items": {"type": "string"}, "description": description}),
            required,
        )
    }

    pub fn build(self) -> JsonValue {
        json!({
            "type": "object",
            "properties": self.properties,
            "required": self.required
        })
    }
}
