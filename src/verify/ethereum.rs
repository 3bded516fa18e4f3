//! Ethereum account verification (`personal_sign`)
//!
//! ```text
//! digest    = keccak256("\x19Ethereum Signed Message:\n" || len(msg) || msg)
//! signer    = ecrecover(digest, r || s || v)
//! address   = keccak256(uncompressed_key[1..])[12..]
//! ```
//!
//! The recovered address is rendered in EIP-55 checksum form and compared to
//! the claimed address with exact, case-sensitive equality. Callers must
//! present the checksummed address they signed.

use k256::ecdsa::VerifyingKey;
use sha3::{Digest, Keccak256};
use std::borrow::Cow;
use tracing::debug;

use super::{challenge_bytes, decode_signature_hex, ecdsa, AccountVerifier, SchemeId, VerifyError};

const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Verifier for Ethereum (EOA) accounts
#[derive(Debug, Clone, Copy, Default)]
pub struct EthereumVerifier;

impl EthereumVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Recover the checksummed address that signed `message`.
    pub fn recover(&self, message: &[u8], signature: &str) -> Result<String, VerifyError> {
        let signature = normalize_signature(signature);
        let signature = decode_signature_hex(&signature)?;

        let key = ecdsa::recover(&hash_message(message), &signature)?;
        Ok(to_checksum_address(&address_from_key(&key)))
    }
}

impl AccountVerifier for EthereumVerifier {
    fn scheme(&self) -> SchemeId {
        SchemeId::ETHEREUM
    }

    fn verify(&self, address: &str, signature: &str) -> Result<bool, VerifyError> {
        let recovered = self.recover(&challenge_bytes(address), signature)?;
        debug!(recovered = %recovered, claimed = %address, "Recovered Ethereum address");
        Ok(recovered == address)
    }
}

/// Ensure the signature carries the `0x` prefix
pub fn normalize_signature(signature: &str) -> Cow<'_, str> {
    if signature.starts_with("0x") || signature.starts_with("0X") {
        Cow::Borrowed(signature)
    } else {
        Cow::Owned(format!("0x{}", signature))
    }
}

/// EIP-191 personal message digest
pub fn hash_message(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// 20-byte account address of a secp256k1 key
pub fn address_from_key(key: &VerifyingKey) -> [u8; 20] {
    let uncompressed = key.to_encoded_point(false);
    // Skip the 0x04 SEC1 tag
    let hash = Keccak256::digest(&uncompressed.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// EIP-55 mixed-case checksum encoding
pub fn to_checksum_address(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }
    checksummed
}
