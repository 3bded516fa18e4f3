//! w3auth-gateway - Web3 signature-authenticated reverse proxy for IPFS

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use w3auth_gateway::{config::Args, logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_format)?;

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  w3auth-gateway");
    info!("======================================");
    info!("Listen: {}", args.listen_addr());
    info!("IPFS endpoint: {}", args.ipfs_endpoint);
    info!(
        "Upstream timeouts: connect {}ms, request {}ms",
        args.connect_timeout_ms, args.request_timeout_ms
    );
    info!("======================================");

    let state = Arc::new(server::AppState::new(args)?);

    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
