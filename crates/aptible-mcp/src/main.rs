//! aptible-mcp: MCP server for the Aptible platform
//!
//! A standalone MCP server that exposes Aptible environment, app, database
//! and endpoint management as tools for AI systems.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use aptible_core::Config;
use aptible_mcp::{AppState, tools};
use clap::{Parser, ValueEnum};
use tower_mcp::{CapabilityFilter, DenialBehavior, McpRouter, Tool, transport::StdioTransport};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Transport mode for the MCP server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Standard input/output (for CLI integrations)
    #[default]
    Stdio,
    /// HTTP with Server-Sent Events (for shared deployments)
    Http,
}

/// MCP server for the Aptible platform
#[derive(Parser, Debug)]
#[command(name = "aptible-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Transport mode
    #[arg(short, long, value_enum, default_value = "stdio")]
    transport: Transport,

    /// Read-only mode: hide and refuse every tool that changes platform state
    #[arg(long, env = "APTIBLE_MCP_READ_ONLY")]
    read_only: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, env = "APTIBLE_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Platform API base URL (overrides config and APTIBLE_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Auth server base URL (overrides config and APTIBLE_AUTH_URL)
    #[arg(long)]
    auth_url: Option<String>,

    // --- HTTP transport options ---
    /// Host to bind HTTP server
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind HTTP server
    #[arg(long, default_value = "8080")]
    port: u16,

    // --- Rate limiting ---
    /// Maximum concurrent requests
    #[arg(long, default_value = "10")]
    max_concurrent: usize,

    /// Request timeout in seconds (HTTP mode); write tools block until their operation finishes
    #[arg(long, default_value = "1800")]
    request_timeout_secs: u64,

    // --- Logging ---
    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

/// Load configuration: file, then environment, then command-line flags
fn load_config(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    let mut config = config.with_env_overrides();

    if let Some(url) = &args.api_url {
        config.api_url = url.clone();
    }
    if let Some(url) = &args.auth_url {
        config.auth_url = url.clone();
    }
    config.validate()?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_level.clone().into()))
        .init();

    let config = load_config(&args)?;

    info!(
        transport = ?args.transport,
        read_only = args.read_only,
        api_url = %config.api_url,
        "Starting aptible-mcp server"
    );

    let state = Arc::new(AppState::new(config, args.read_only));
    let router = build_router(state, args.read_only);

    match args.transport {
        Transport::Stdio => {
            info!("Running with stdio transport");
            StdioTransport::new(router).run().await?;
        }
        Transport::Http => {
            info!(host = %args.host, port = args.port, "Running with HTTP transport");
            run_http_server(router, &args).await?;
        }
    }

    Ok(())
}

/// Footer instructions for authentication
const AUTH_INSTRUCTIONS: &str = r#"
## Authentication

Credentials come from APTIBLE_TOKEN or the token file written by
`aptible login`. If a tool reports missing or expired credentials, ask
the user to log in again; the aptible://config resource shows which
auth server and token file are in use.
"#;

/// Build the MCP router with instructions and the optional read-only filter
fn build_router(state: Arc<AppState>, read_only: bool) -> McpRouter {
    let mut instructions = String::from(
        r#"Aptible Platform MCP Server

This server manages Aptible environments, apps, databases, services and
endpoints, and reads the history and logs of platform operations.

## Available Tools
"#,
    );
    instructions.push_str(tools::instructions());
    instructions.push_str(AUTH_INSTRUCTIONS);

    let router = aptible_mcp::router(state)
        .server_info("aptible-mcp", env!("CARGO_PKG_VERSION"))
        .instructions(&instructions);

    // Hidden from tools/list and refused if called directly
    if read_only {
        info!("Applying read-only filter - write tools will be hidden");
        router.tool_filter(
            CapabilityFilter::new(|_session, tool: &Tool| {
                tool.annotations
                    .as_ref()
                    .map(|a| a.read_only_hint)
                    .unwrap_or(false)
            })
            .denial_behavior(DenialBehavior::Unauthorized),
        )
    } else {
        router
    }
}

/// Run the HTTP server with middleware
#[cfg(feature = "http")]
async fn run_http_server(router: McpRouter, args: &Args) -> Result<()> {
    use std::time::Duration;
    use tower::limit::ConcurrencyLimitLayer;
    use tower::timeout::TimeoutLayer;
    use tower_mcp::HttpTransport;

    let addr = format!("{}:{}", args.host, args.port);

    let transport = HttpTransport::new(router)
        .layer(TimeoutLayer::new(Duration::from_secs(
            args.request_timeout_secs,
        )))
        .layer(ConcurrencyLimitLayer::new(args.max_concurrent));

    transport.serve(&addr).await?;

    Ok(())
}

#[cfg(not(feature = "http"))]
async fn run_http_server(_router: McpRouter, _args: &Args) -> Result<()> {
    anyhow::bail!("HTTP transport requires the 'http' feature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("aptible-mcp").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);
        assert_eq!(args.transport, Transport::Stdio);
        assert!(!args.read_only);
        assert_eq!(args.port, 8080);
        assert_eq!(args.max_concurrent, 10);
    }

    #[test]
    fn http_transport_flags() {
        let args = parse(&["--transport", "http", "--host", "0.0.0.0", "--port", "9000"]);
        assert_eq!(args.transport, Transport::Http);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 9000);
    }

    #[test]
    fn cli_urls_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_url = \"https://api.from-file.test\"\nauth_url = \"https://auth.from-file.test\"\n",
        )
        .unwrap();

        let args = parse(&[
            "--config",
            path.to_str().unwrap(),
            "--api-url",
            "https://api.from-flag.test",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.api_url, "https://api.from-flag.test");
    }

    #[test]
    fn invalid_cli_url_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");

        let args = parse(&["--config", path.to_str().unwrap(), "--auth-url", "not a url"]);
        assert!(load_config(&args).is_err());
    }
}
