//! Shared error and body types for the gateway

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use thiserror::Error;

/// Boxed error carried by streamed response bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Response body used by every handler (static JSON or streamed upstream bytes)
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// Gateway-level faults.
///
/// Authentication failures are not errors at this level: they are decisions
/// (see [`crate::auth::AuthDecision`]) and never surface as `GatewayError`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Invalid startup configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The admitted request could not be delivered to, or answered by, the upstream
    #[error("{0}")]
    Upstream(String),

    /// Listener / socket failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
