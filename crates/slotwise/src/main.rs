//! slotwise: calendar free-slot and booking service
//!
//! Usage:
//!   slotwise             - Start the HTTP server (REST + tool manifest + /mcp)
//!   slotwise --stdio     - Serve the tool protocol over stdin/stdout
//!   slotwise --help      - Show help

use std::sync::Arc;

use sw_api::AppState;
use sw_calendar::GoogleCalendarClient;
use sw_core::{Config, SchedulingService, ServiceSettings, ToolManager};
use sw_mcp::McpServer;
use sw_tools::register_calendar_tools;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// HTTP server mode
    Server,
    /// Tool protocol over stdio
    Stdio,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1));

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("slotwise {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging; stdout belongs to the protocol in stdio mode
    let filter = EnvFilter::from_default_env().add_directive("info".parse()?);
    if mode == RunMode::Stdio {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting slotwise...");
    tracing::info!(
        "Calendar: {}, timezone: {}, policy: {}",
        config.calendar.calendar_id.as_deref().unwrap_or("<unset>"),
        config.calendar.timezone,
        config.slots.policy
    );
    if config.calendar.calendar_id.is_none() {
        tracing::warn!("GOOGLE_CALENDAR_ID is not set; calendar requests will fail");
    }

    let settings = ServiceSettings::from_config(&config)?;
    let gateway = GoogleCalendarClient::from_config(&config.calendar)
        .map_err(|e| anyhow::anyhow!("Failed to create calendar client: {}", e))?;
    let service = Arc::new(SchedulingService::new(Arc::new(gateway), settings));

    let mut tool_manager = ToolManager::new();
    register_calendar_tools(&mut tool_manager, Arc::clone(&service));
    tracing::info!(
        "Registered {} tools: {:?}",
        tool_manager.len(),
        tool_manager.tool_names()
    );

    match mode {
        RunMode::Stdio => {
            let server = McpServer::new(tool_manager);
            sw_mcp::serve_stdio(server).await?;
            tracing::info!("Client disconnected, exiting");
            Ok(())
        }
        _ => {
            let addr = config.server.socket_addr()?;
            if config.api.token.is_none() {
                tracing::info!("API token not configured, tool manifest is open");
            }
            let state = AppState::new(service, tool_manager, config.api.clone());
            tracing::info!("Press Ctrl+C to exit");
            sw_api::start_server(addr, state).await
        }
    }
}

/// Parse command line arguments
fn parse_args(args: impl IntoIterator<Item = String>) -> RunMode {
    for arg in args {
        match arg.as_str() {
            "--stdio" | "-s" => return RunMode::Stdio,
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("slotwise - calendar free-slot and booking service");
    println!();
    println!("Usage:");
    println!("  slotwise             Start the HTTP server");
    println!("  slotwise --stdio     Serve the tool protocol over stdin/stdout");
    println!("  slotwise --help      Show this help message");
    println!("  slotwise --version   Show version");
    println!();
    println!("Environment Variables:");
    println!("  GOOGLE_APPLICATION_CREDENTIALS  Service-account key file or inline JSON");
    println!("  GOOGLE_CALENDAR_ID              Calendar to query and book into");
    println!("  GOOGLE_ACCESS_TOKEN             Pre-issued OAuth token (optional)");
    println!("  DEFAULT_TIMEZONE                Timezone for naive input and output (default: UTC)");
    println!("  HOST / PORT                     Listen address (default: 0.0.0.0:5000)");
    println!("  API_TOKEN                       Bearer token for the tool manifest (optional)");
    println!("  API_PROTECT_TOOLS               Also require the token on REST routes (default: false)");
    println!("  SLOT_POLICY                     gaps or grid (default: gaps)");
    println!("  DEFAULT_DURATION_MINUTES        Slot length when none is given (default: 60)");
    println!();
    println!("Settings may also come from slotwise.toml in the working directory.");
}
