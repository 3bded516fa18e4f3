//! Request-level authentication gate
//!
//! ```text
//! Authorization header ──► Basic? ──no──► EmptyCredential
//!                            │
//!                           yes
//!                            ▼
//!                     Credential::from_header ──err──► MalformedCredential
//!                            │
//!                            ▼
//!                     VerificationChain ──invalid──► InvalidSignature
//!                            │
//!                            ▼
//!                         admitted
//! ```
//!
//! Malformed and invalid credentials produce the same public message; only
//! the logs tell them apart.

use std::fmt;
use tracing::{debug, info, warn};

use super::credential::{has_basic_scheme, Credential};
use crate::verify::{SchemeId, VerificationChain};

/// Why a request was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No usable `Authorization` header
    EmptyCredential,
    /// Header present but not decodable into address + signature
    MalformedCredential,
    /// Every registered scheme rejected the credential
    InvalidSignature,
}

impl AuthFailure {
    /// Message returned to the caller
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthFailure::EmptyCredential => "Empty Signature",
            AuthFailure::MalformedCredential | AuthFailure::InvalidSignature => "Invalid Signature",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::EmptyCredential => write!(f, "empty credential"),
            AuthFailure::MalformedCredential => write!(f, "malformed credential"),
            AuthFailure::InvalidSignature => write!(f, "invalid signature"),
        }
    }
}

/// Gate outcome for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    pub admitted: bool,
    pub failure_reason: Option<AuthFailure>,
    /// Scheme that admitted the request
    pub scheme: Option<SchemeId>,
}

impl AuthDecision {
    pub fn admit(scheme: SchemeId) -> Self {
        Self {
            admitted: true,
            failure_reason: None,
            scheme: Some(scheme),
        }
    }

    pub fn reject(reason: AuthFailure) -> Self {
        Self {
            admitted: false,
            failure_reason: Some(reason),
            scheme: None,
        }
    }
}

/// Stateless authentication gate, shared by all connections
#[derive(Debug)]
pub struct AuthGate {
    chain: VerificationChain,
}

impl AuthGate {
    pub fn new(chain: VerificationChain) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &VerificationChain {
        &self.chain
    }

    /// Decide whether a request carrying `header` may be forwarded.
    pub fn authorize(&self, header: Option<&str>) -> AuthDecision {
        if !has_basic_scheme(header) {
            debug!("No Basic authorization header");
            return AuthDecision::reject(AuthFailure::EmptyCredential);
        }

        let credential = match Credential::from_header(header) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Malformed credential");
                return AuthDecision::reject(AuthFailure::MalformedCredential);
            }
        };

        info!(address = %credential.address, "Got public address");
        debug!(signature = %credential.signature, "Got signature");

        let outcome = self.chain.verify(&credential);
        match outcome.scheme_used {
            Some(scheme) if outcome.valid => {
                info!(address = %credential.address, scheme = %scheme, "Validation success");
                AuthDecision::admit(scheme)
            }
            _ => {
                warn!(
                    address = %credential.address,
                    diagnostic = outcome.diagnostic.as_deref().unwrap_or(""),
                    "Validation failed"
                );
                AuthDecision::reject(AuthFailure::InvalidSignature)
            }
        }
    }
}
