//! Cookie rewriting reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────────────────────────────────────┐
//!     ────────────────────┼─▶ trace ─▶ timeout ─▶ proxy handler ─────┼──▶ Upstream
//!                         │                            │             │
//!     Client Response     │                  ┌─────────▼─────────┐   │
//!     ◀───────────────────┼──────────────────│ ProxyCookieLayer  │◀──┼─── Set-Cookie
//!                         │                  │ path/domain rules │   │
//!                         │                  └───────────────────┘   │
//!                         └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cookie_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use cookie_proxy::observability::init_logging;
use cookie_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "cookie-proxy")]
#[command(about = "Reverse proxy that rewrites Set-Cookie paths and domains", long_about = None)]
struct Cli {
    /// Configuration file (TOML, or JSON with a .json extension).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override upstream.address.
    #[arg(long)]
    upstream: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(upstream) = cli.upstream {
        config.upstream.address = upstream;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability.log_level);

    tracing::info!("cookie-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
