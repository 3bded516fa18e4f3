//! Logging setup
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to this
//! crate and everything else logs at `info`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;
use crate::types::{GatewayError, Result};

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(log_level: &str) -> String {
    format!("w3auth_gateway={},info", log_level)
}

/// Install the global tracing subscriber.
pub fn init(log_level: &str, format: LogFormat) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(log_level).into());

    let json = format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .try_init()
        .map_err(|e| GatewayError::Config(format!("Failed to install logger: {}", e)))
}
