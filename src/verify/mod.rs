//! Account signature verification
//!
//! Each supported account scheme (address encoding + signature algorithm) is an
//! [`AccountVerifier`]. The [`VerificationChain`] tries them in priority order.
//!
//! ## Challenge
//!
//! For every scheme the signed message is the caller's own address string.
//! A `0x`-prefixed hex address is signed as its decoded bytes, which is what
//! wallet tooling does for hex messages.
//!
//! ## Schemes
//!
//! - **Substrate**: SS58 address, sr25519 / ed25519 / ecdsa signatures
//! - **Ethereum**: hex address, `personal_sign` secp256k1 recovery

pub mod chain;
pub mod ecdsa;
pub mod ethereum;
pub mod ss58;
pub mod substrate;

pub use chain::{VerificationChain, VerificationOutcome};
pub use ethereum::EthereumVerifier;
pub use substrate::SubstrateVerifier;

use std::fmt;
use thiserror::Error;

/// Identifier of a verification scheme.
///
/// New schemes declare their own constant; existing ones are untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemeId(&'static str);

impl SchemeId {
    pub const SUBSTRATE: SchemeId = SchemeId("substrate");
    pub const ETHEREUM: SchemeId = SchemeId("ethereum");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SchemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Why a scheme could not judge a credential.
///
/// These never cross the chain boundary: the chain records them as
/// diagnostics and treats the scheme as "not valid".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("unsupported signature length: {0} bytes")]
    UnsupportedSignatureLength(usize),

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("public key recovery failed")]
    RecoveryFailed,
}

/// A single account signature scheme.
///
/// `verify` answers "did `address` sign its own address string producing
/// `signature`?". `Ok(false)` means the signature is well-formed but does not
/// match; `Err` means the inputs are not meaningful for this scheme.
pub trait AccountVerifier: Send + Sync {
    fn scheme(&self) -> SchemeId;

    fn verify(&self, address: &str, signature: &str) -> Result<bool, VerifyError>;
}

/// Bytes of the challenge message for an address.
pub fn challenge_bytes(address: &str) -> Vec<u8> {
    decode_strict_hex(address).unwrap_or_else(|| address.as_bytes().to_vec())
}

/// Decode `0x`-prefixed, even-length hex. Anything else is `None`.
pub(crate) fn decode_strict_hex(value: &str) -> Option<Vec<u8>> {
    let digits = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X"))?;
    if digits.len() % 2 != 0 {
        return None;
    }
    hex::decode(digits).ok()
}

/// Decode a hex signature with or without the `0x` prefix
pub(crate) fn decode_signature_hex(signature: &str) -> Result<Vec<u8>, VerifyError> {
    let digits = signature
        .strip_prefix("0x")
        .or_else(|| signature.strip_prefix("0X"))
        .unwrap_or(signature);
    hex::decode(digits).map_err(|e| VerifyError::InvalidSignature(e.to_string()))
}

/// `0x`-prefixed lowercase hex
pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
