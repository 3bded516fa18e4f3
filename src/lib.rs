//! w3auth-gateway - Web3 signature-authenticated reverse proxy for IPFS
//!
//! Every request must carry `Authorization: Basic base64(address:signature)`
//! where `signature` is the account's signature over its own address string.
//! Admitted requests are forwarded unmodified to the IPFS HTTP endpoint.
//!
//! ## Modules
//!
//! - **auth**: credential extraction and the admit/reject gate
//! - **verify**: ordered chain of account schemes (Substrate, Ethereum)
//! - **proxy**: streaming forwarder to the upstream
//! - **server**: hyper listener binding the gate to HTTP

pub mod auth;
pub mod config;
pub mod logging;
pub mod proxy;
pub mod server;
pub mod types;
pub mod verify;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GatewayError, Result};
