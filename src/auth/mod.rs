//! Authentication for the gateway
//!
//! Provides:
//! - Credential extraction from `Authorization: Basic` headers
//! - The auth gate that turns a header into an admit/reject decision

pub mod credential;
pub mod gate;

pub use credential::{has_basic_scheme, Credential, CredentialError, BASIC_SCHEME};
pub use gate::{AuthDecision, AuthFailure, AuthGate};
