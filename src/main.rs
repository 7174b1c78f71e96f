/// MCP Tool Server Entry Point
///
/// Loads configuration from the environment (see `ServerConfig::from_env`)
/// and the tool configuration file, builds the tool set once, then starts the
/// selected transport(s). Every transport shares the same read-only
/// dispatcher.

mod core;
mod tools;

use std::process::ExitCode;
use std::sync::Arc;

use crate::core::config::{ServerConfig, ToolConfig, TransportMode};
use crate::core::{logging, server};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    let tool_config = ToolConfig::load(&config.tool_config_path)?;
    let dispatcher = Arc::new(tools::initialize_tools(&tool_config)?);
    let ctx = server::build_context(&config, dispatcher);

    match config.transport {
        TransportMode::Stdio => server::run_server_stdio(ctx).await?,
        TransportMode::Http => server::run_server_http(&config, ctx).await?,
        TransportMode::Both => {
            // STDIO runs in the background; the HTTP server owns the process
            let stdio_ctx = ctx.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(stdio_ctx).await {
                    tracing::error!(error = %e, "STDIO server error");
                }
            });

            let http_result = server::run_server_http(&config, ctx).await;
            stdio_handle.abort();
            http_result?;
        }
    }
    Ok(())
}
