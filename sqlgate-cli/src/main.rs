//! sqlgate - HTTP gateway for registering database connections and running
//! queries against them by opaque handle.
//!
//! Usage:
//!   sqlgate                        # listen on 127.0.0.1:8800
//!   sqlgate --port 9000 --debug    # custom port, debug logging
//!   RUST_LOG=sqlgate_core=debug sqlgate   # fine-grained log control

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sqlgate_core::Gateway;
use sqlgate_server::{run_server, PostgresDriver, ServerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "sqlgate",
    version,
    about = "Register database connections over HTTP and query them by handle"
)]
struct Cli {
    /// Bind address
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8800")]
    port: u16,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Allow any CORS origin (development only)
    #[arg(long)]
    cors_permissive: bool,

    /// Enable debug logging (unless RUST_LOG is set)
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    let bind_addr: SocketAddr = format!("{}:{}", cli.bind, cli.port)
        .parse()
        .context("invalid bind address")?;

    let config = ServerConfig {
        bind_addr,
        cors_permissive: cli.cors_permissive,
        timeout_secs: cli.timeout,
    };

    let gateway = Arc::new(Gateway::new(Arc::new(PostgresDriver::new())));
    run_server(gateway, config).await?;

    Ok(())
}
