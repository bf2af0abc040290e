//! Demo MCP server - entry point with HTTP and stdio transports.

use anyhow::Result;
use clap::Parser;
use rmcp::ServiceExt;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use mcp_demo::config::ServerConfig;
use mcp_demo::gateway;
use mcp_demo::server::DemoServer;

/// Demo MCP server with an OAuth-style bearer gate over streamable HTTP.
#[derive(Parser, Debug)]
#[command(name = "mcp-demo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 6277)]
    port: u16,

    /// Public base URL advertised in the OAuth metadata (defaults to the
    /// bind address).
    #[arg(long)]
    public_url: Option<String>,

    /// Reject MCP requests that carry no Authorization header.
    #[arg(long)]
    require_auth: bool,

    /// Serve over stdio instead of HTTP.
    #[arg(long)]
    stdio: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Log to stderr; stdout carries MCP traffic in stdio mode.
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if args.stdio {
        tracing::info!("starting MCP demo server with stdio transport");
        let service = DemoServer::new().serve(rmcp::transport::stdio()).await?;
        service.waiting().await?;
        return Ok(());
    }

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        public_url: args.public_url,
        require_auth: args.require_auth,
    };
    let addr = config.bind_addr();
    let issuer = config.issuer();
    let app = gateway::build_router(config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("MCP demo server listening on http://{addr}");
    tracing::info!("  MCP endpoints: {issuer}/mcp and {issuer}/stdio");
    tracing::info!("  health check: {issuer}/health");
    tracing::info!("  OAuth metadata: {issuer}/.well-known/oauth-authorization-server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Resolve when ctrl-c is received.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install ctrl-c handler");
    }
}
