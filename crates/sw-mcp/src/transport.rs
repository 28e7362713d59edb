//! Transports for [`McpServer`]
//!
//! stdio for clients that spawn the binary, streamable HTTP for the `/mcp`
//! route of the API server.

use std::sync::Arc;

use rmcp::{
    ServiceExt,
    transport::{
        stdio,
        streamable_http_server::{
            StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
        },
    },
};
use tracing::{debug, info};

use crate::error::{McpError, Result};
use crate::server::McpServer;

/// Serve the protocol on this process's stdin/stdout until the client disconnects
pub async fn serve_stdio(server: McpServer) -> Result<()> {
    info!("Serving tool protocol on stdio");
    let running = server
        .serve(stdio())
        .await
        .map_err(|e| McpError::Initialize(e.to_string()))?;

    let reason = running.waiting().await?;
    debug!(?reason, "stdio session ended");
    Ok(())
}

/// Tower service speaking streamable HTTP, one session per client
pub fn streamable_http_service(
    server: McpServer,
) -> StreamableHttpService<McpServer, LocalSessionManager> {
    StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    )
}
