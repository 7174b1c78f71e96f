/// MCP Server Transports
///
/// This module hosts the dispatch core behind two transports:
/// - HTTP server with Actix Web (JSON-RPC over POST, plus health, metrics,
///   and SSE tool discovery endpoints)
/// - STDIO server for line-based communication
///
/// Both hand every message to `protocol::handle_message`,
/// so method handling is identical across transports.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use actix_web::{
    App, HttpResponse, HttpServer, Result, web,
    middleware::{Compress, DefaultHeaders, Logger},
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::core::config::ServerConfig;
use crate::core::dispatcher::Dispatcher;
use crate::core::protocol::{self, ServerContext};

/// Health check endpoint handler.
///
/// Used by load balancers and monitoring systems to verify server availability.
async fn health(ctx: web::Data<ServerContext>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": ctx.server_name
    })))
}

/// MCP JSON-RPC request handler.
///
/// Counts the request, routes it, and returns the JSON-RPC response.
/// Malformed bodies get a JSON-RPC error, the same as on stdio.
/// Notifications are acknowledged with 202 and no body.
async fn mcp_handler(
    ctx: web::Data<ServerContext>,
    counter: web::Data<AtomicU64>,
    body: String,
) -> Result<HttpResponse> {
    // Relaxed is enough: the counter only needs atomicity
    counter.fetch_add(1, Ordering::Relaxed);

    match protocol::handle_message(&ctx, &body) {
        Some(response) => Ok(HttpResponse::Ok().json(response)),
        None => Ok(HttpResponse::Accepted().finish()),
    }
}

/// Metrics endpoint handler.
///
/// Returns the total number of MCP requests processed since server start.
async fn metrics_handler(counter: web::Data<AtomicU64>) -> Result<HttpResponse> {
    let count = counter.load(Ordering::Relaxed);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "requests_total": count,
        "status": "ok"
    })))
}

/// Server-Sent Events endpoint for tools discovery.
///
/// Emits one `data:` event carrying the same tool list as `tools/list`,
/// plus the count.
async fn sse_tools_discovery(ctx: web::Data<ServerContext>) -> Result<HttpResponse> {
    use actix_web::http::header;

    let tools = ctx.dispatcher.list_tools();
    let tools_data = serde_json::json!({
        "tools": tools,
        "count": tools.len()
    });
    let sse_data = format!("data: {}\n\n", tools_data);

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        // Clients must always see the current tool set
        .insert_header(header::CacheControl(vec![
            header::CacheDirective::NoCache,
            header::CacheDirective::NoStore,
            header::CacheDirective::MustRevalidate,
        ]))
        // Disable nginx buffering for real-time streaming
        .insert_header(("x-accel-buffering", "no"))
        .body(sse_data))
}

/// Mount all routes. Shared by the real server and the tests.
fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/sse", web::get().to(sse_tools_discovery))
        .route("/mcp", web::post().to(mcp_handler))
        .route("/", web::post().to(mcp_handler))
        .route("/", web::get().to(health));
}

/// Run the MCP server in HTTP mode.
///
/// The server is configured with:
/// - Worker threads: `WORKER_THREADS` or CPU count (max 16)
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive: 30 seconds
/// - Request timeout: 30 seconds
/// - Disconnect timeout: 2 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(config: &ServerConfig, ctx: ServerContext) -> std::io::Result<()> {
    use std::time::Duration;

    let bind_addr = config.bind_addr();
    let workers = config.worker_count();

    let ctx = web::Data::new(ctx);
    let request_count = web::Data::new(AtomicU64::new(0));

    tracing::info!(
        name = %ctx.server_name,
        version = %ctx.server_version,
        bind = %bind_addr,
        workers,
        tools = ctx.dispatcher.list_tools().len(),
        "MCP server starting (HTTP mode)"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(ctx.clone())
            .app_data(request_count.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            // %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(configure)
    })
    .workers(workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Run the MCP server in STDIO mode on the process's stdin and stdout.
///
/// Requests are read line by line and answered in order; all logging goes to
/// stderr so the protocol stream stays clean.
pub async fn run_server_stdio(ctx: ServerContext) -> std::io::Result<()> {
    tracing::info!(
        name = %ctx.server_name,
        version = %ctx.server_version,
        tools = ctx.dispatcher.list_tools().len(),
        "MCP server starting (STDIO mode)"
    );

    let stdin = BufReader::with_capacity(8192, tokio::io::stdin());
    let stdout = BufWriter::with_capacity(8192, tokio::io::stdout());
    serve_lines(&ctx, stdin, stdout).await
}

/// Serve newline-delimited JSON-RPC from `input` to `output` until EOF.
///
/// Each response is written on its own line and flushed immediately.
pub async fn serve_lines<R, W>(ctx: &ServerContext, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = protocol::handle_message(ctx, &line) else {
            continue;
        };

        let response_json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Error serializing response");
                continue;
            }
        };

        output.write_all(response_json.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }

    tracing::info!("STDIO input closed, shutting down");
    Ok(())
}

/// Shared context for both transports.
pub fn build_context(config: &ServerConfig, dispatcher: Arc<Dispatcher>) -> ServerContext {
    ServerContext {
        server_name: config.name.clone(),
        server_version: config.version.clone(),
        dispatcher,
    }
}
