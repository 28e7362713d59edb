//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use sw_mcp::{McpServer, streamable_http_service};

use crate::handlers::{book_meeting, get_available_slots, health, manifest};
use crate::middleware::auth::{ApiToken, require_bearer};
use crate::server::AppState;

/// Tool manifest and the streamable-HTTP tool protocol endpoint
pub fn tool_routes(mcp: McpServer) -> Router<AppState> {
    Router::new()
        .route("/", get(manifest))
        .route("/mcp/tools", get(manifest))
        .route("/sse", get(manifest))
        .route_service("/mcp", streamable_http_service(mcp))
}

/// REST scheduling endpoints
pub fn rest_routes() -> Router<AppState> {
    Router::new()
        .route("/get_available_slots", get(get_available_slots))
        .route("/book_meeting", post(book_meeting))
}

/// Create the API router
///
/// A configured token gates the tool routes, and the REST routes too when
/// `protect_tools` is set. `/health` is always open.
pub fn router(state: AppState) -> Router {
    let mut tools = tool_routes(McpServer::new(state.tools.clone()));
    let mut rest = rest_routes();

    if let Some(token) = state.api.token.as_deref() {
        let gate = middleware::from_fn_with_state(ApiToken::new(token), require_bearer);
        tools = tools.route_layer(gate.clone());
        if state.api.protect_tools {
            rest = rest.route_layer(gate);
        }
    }

    Router::new()
        .route("/health", get(health))
        .merge(tools)
        .merge(rest)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
