//! Configuration for the gateway
//!
//! CLI arguments and environment variable handling using clap.
//! Values are read once at startup; `.env` files are honoured by `main`.

use clap::{Parser, ValueEnum};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Web3 signature-authenticated reverse proxy for IPFS
#[derive(Parser, Debug, Clone)]
#[command(name = "w3auth-gateway")]
#[command(about = "Admits IPFS API requests signed by a Substrate or Ethereum account")]
pub struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "5050")]
    pub port: u16,

    /// Interface to bind
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Upstream IPFS HTTP endpoint that admitted requests are forwarded to
    #[arg(long, env = "IPFS_ENDPOINT", default_value = "http://127.0.0.1:5001")]
    pub ipfs_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Upstream request timeout in milliseconds (covers the whole response)
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "300000")]
    pub request_timeout_ms: u64,

    /// Upstream connect timeout in milliseconds
    #[arg(long, env = "CONNECT_TIMEOUT_MS", default_value = "10000")]
    pub connect_timeout_ms: u64,
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl Args {
    /// Socket address to bind
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let url = reqwest::Url::parse(&self.ipfs_endpoint)
            .map_err(|e| format!("IPFS_ENDPOINT is not a valid URL: {}", e))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "IPFS_ENDPOINT must use http or https, got '{}'",
                url.scheme()
            ));
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err("IPFS_ENDPOINT must not carry a query or fragment".to_string());
        }

        if self.request_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err("Timeouts must be greater than zero".to_string());
        }

        Ok(())
    }
}
