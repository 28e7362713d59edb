//! sw-api: HTTP API for slotwise
//!
//! REST endpoints for free-slot lookup and booking, the static tool manifest,
//! and the MCP streamable-HTTP endpoint at `/mcp`. Built with axum.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use routes::router;
pub use server::{AppState, start_server};
