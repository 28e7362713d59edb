//! rmcp handler over a [`ToolManager`]

use std::sync::Arc;

use rmcp::{
    ServerHandler,
    model::{
        CallToolRequestParams, CallToolResult, Content, ErrorData, Implementation,
        ListToolsResult, PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool as McpTool,
    },
    service::{RequestContext, RoleServer},
};
use serde_json::{Map, Value};
use sw_core::{ToolDefinition, ToolManager};
use tracing::{debug, warn};

/// Name announced in `serverInfo`
pub const SERVER_NAME: &str = "slotwise";

const INSTRUCTIONS: &str = "Look up free meeting slots and book meetings in the configured Google Calendar.";

/// Tool protocol server
#[derive(Clone)]
pub struct McpServer {
    tools: ToolManager,
}

impl McpServer {
    pub fn new(tools: ToolManager) -> Self {
        Self { tools }
    }

    fn tool_list(&self) -> Vec<McpTool> {
        self.tools.definitions().into_iter().map(to_mcp_tool).collect()
    }
}

fn to_mcp_tool(definition: ToolDefinition) -> McpTool {
    let schema = match definition.input_schema {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    McpTool::new(definition.name, definition.description, Arc::new(schema))
}

fn text_result(output: String, is_error: bool) -> CallToolResult {
    if is_error {
        CallToolResult::error(vec![Content::text(output)])
    } else {
        CallToolResult::success(vec![Content::text(output)])
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_string();
        server_info.version = env!("CARGO_PKG_VERSION").to_string();

        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = server_info;
        info.instructions = Some(INSTRUCTIONS.to_string());
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tool_list()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let name: &str = &request.name;
        if !self.tools.contains(name) {
            return Err(ErrorData::invalid_params(format!("Unknown tool: {}", name), None));
        }

        debug!(tool = name, "Handling tool call");
        let input = Value::Object(request.arguments.clone().unwrap_or_default());

        // Failures go back to the client as error results, not protocol errors
        let result = match self.tools.execute(name, input).await {
            Ok(result) => text_result(result.output, result.is_error),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                text_result(e.to_string(), true)
            }
        };
        Ok(result)
    }
}
