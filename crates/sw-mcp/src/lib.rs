//! sw-mcp: tool protocol server
//!
//! Exposes the registered tools to MCP clients through rmcp. The same
//! [`McpServer`] handler backs the streamable-HTTP endpoint and the stdio
//! transport.

pub mod error;
pub mod server;
pub mod transport;

pub use error::{McpError, Result};
pub use server::McpServer;
pub use transport::{serve_stdio, streamable_http_service};
