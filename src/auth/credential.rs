//! Credential extraction from the `Authorization` header
//!
//! The gateway expects HTTP Basic-style credentials where the "user" is the
//! account address and the "password" is the hex signature of that address:
//!
//! ```text
//! Authorization: Basic base64(<address>:<signature>)
//! ```

use base64::{engine::general_purpose, Engine as _};
use std::fmt;
use thiserror::Error;

/// Scheme token the header value must start with
pub const BASIC_SCHEME: &str = "Basic ";

/// Reasons an `Authorization` header could not be turned into a [`Credential`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("authorization header missing")]
    Missing,

    #[error("authorization header does not use the Basic scheme")]
    UnsupportedScheme,

    #[error("credential payload is not valid base64")]
    InvalidBase64,

    #[error("credential payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("credential payload has no ':' separator")]
    MissingSeparator,

    #[error("credential payload has an empty {0}")]
    EmptyField(&'static str),
}

/// Address/signature pair claimed by the caller.
///
/// Both fields are non-empty. Nothing is normalised here; each verifier
/// applies its own scheme-specific handling.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub address: String,
    pub signature: String,
}

impl Credential {
    pub fn new(address: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            signature: signature.into(),
        }
    }

    /// Parse the raw `Authorization` header value.
    pub fn from_header(header: Option<&str>) -> Result<Self, CredentialError> {
        let header = header.ok_or(CredentialError::Missing)?;
        let payload = header
            .trim()
            .strip_prefix(BASIC_SCHEME)
            .ok_or(CredentialError::UnsupportedScheme)?;

        let decoded = decode_payload(payload.trim())?;
        let decoded = String::from_utf8(decoded).map_err(|_| CredentialError::InvalidUtf8)?;

        let (address, signature) = decoded
            .split_once(':')
            .ok_or(CredentialError::MissingSeparator)?;

        if address.is_empty() {
            return Err(CredentialError::EmptyField("address"));
        }
        if signature.is_empty() {
            return Err(CredentialError::EmptyField("signature"));
        }

        Ok(Self::new(address, signature))
    }

    /// Encode as an `Authorization` header value (client side / tests)
    pub fn to_header(&self) -> String {
        let payload = format!("{}:{}", self.address, self.signature);
        format!("{}{}", BASIC_SCHEME, general_purpose::STANDARD.encode(payload))
    }
}

// Signatures are kept out of Debug output so credentials can be logged with `?`.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address)
            .field("signature_len", &self.signature.len())
            .finish()
    }
}

/// Whether the header is present and carries the Basic scheme token
pub fn has_basic_scheme(header: Option<&str>) -> bool {
    header
        .map(|h| h.trim().starts_with(BASIC_SCHEME))
        .unwrap_or(false)
}

/// Decode base64 payload (standard first, then URL-safe and unpadded variants)
fn decode_payload(input: &str) -> Result<Vec<u8>, CredentialError> {
    [
        &general_purpose::STANDARD,
        &general_purpose::STANDARD_NO_PAD,
        &general_purpose::URL_SAFE,
        &general_purpose::URL_SAFE_NO_PAD,
    ]
    .iter()
    .find_map(|engine| engine.decode(input).ok())
    .ok_or(CredentialError::InvalidBase64)
}
