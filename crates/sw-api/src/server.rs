//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use sw_core::{ApiConfig, SchedulingService, ToolManager};

use crate::routes::router;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SchedulingService>,
    pub tools: ToolManager,
    pub api: ApiConfig,
}

impl AppState {
    pub fn new(service: Arc<SchedulingService>, tools: ToolManager, api: ApiConfig) -> Self {
        Self {
            service,
            tools,
            api,
        }
    }
}

/// Start the HTTP API server and run until Ctrl-C
pub async fn start_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
