//! Teamwork MCP server binary.

use std::num::NonZeroUsize;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mcp_config::ServerConfig;
use mcp_kernel::{Implementation, McpServer, SchedulerConfig, TaskScheduler, serve_stdio};
use mcp_server::bootstrap;
use mcp_teamwork::{ApiClient, HttpApiClient, HttpClientConfig};
use mcp_telemetry::init_tracing;
use tracing::{info, warn};

/// Teamwork MCP server CLI
#[derive(Parser, Debug)]
#[command(name = "tw-mcp")]
#[command(about = "Model Context Protocol server for Teamwork Desk and Projects")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config;
    config.validate()?;
    init_tracing(&config.log_settings())?;

    info!(
        config = %serde_json::to_string(&config).unwrap_or_default(),
        "starting tw-mcp"
    );

    let mut http = HttpClientConfig::new(&config.api_url)
        .context("invalid api url")?
        .with_timeout(config.request_timeout());
    match &config.bearer_token {
        Some(token) => http = http.with_bearer_token(token),
        None => warn!("no bearer token configured; API calls will be unauthenticated"),
    }
    let client: Arc<dyn ApiClient> = Arc::new(HttpApiClient::new(http));

    let boot = bootstrap(&config, client)?;
    if !boot.has_tools() {
        warn!("no tools are exposed with the current configuration");
    }

    let concurrency = NonZeroUsize::new(config.max_concurrency)
        .context("max concurrency must be at least 1")?;
    let scheduler = TaskScheduler::new(SchedulerConfig::new(concurrency));
    let info = Implementation {
        name: env!("CARGO_PKG_NAME").to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        ..Default::default()
    };

    serve_stdio(McpServer::new(boot.tools(), info, scheduler)).await?;
    Ok(())
}
