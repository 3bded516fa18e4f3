//! Substrate account verification
//!
//! Address: SS58 (or raw `0x` hex public key).
//! Signature: hex, one of
//!
//! | bytes | layout                              |
//! |-------|-------------------------------------|
//! | 64    | sr25519 or ed25519                  |
//! | 65    | ecdsa `r \|\| s \|\| v` over blake2b-256 |
//! | 65/66 | MultiSignature: type byte + raw sig |
//!
//! Browser extensions sign raw payloads wrapped as `<Bytes>...</Bytes>`, so
//! both the bare and the wrapped challenge are accepted.

use blake2::{digest::consts::U32, Blake2b, Digest};
use ed25519_dalek::Verifier as _;
use std::fmt;
use tracing::{debug, trace};

use super::{
    challenge_bytes, decode_signature_hex, ecdsa, ss58, to_prefixed_hex, AccountVerifier,
    SchemeId, VerifyError,
};

/// schnorrkel signing context used by Substrate
pub const SIGNING_CONTEXT: &[u8] = b"substrate";

const WRAP_PREFIX: &[u8] = b"<Bytes>";
const WRAP_POSTFIX: &[u8] = b"</Bytes>";

type Blake2b256 = Blake2b<U32>;

/// Substrate key types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Sr25519,
    Ed25519,
    Ecdsa,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Sr25519 => write!(f, "sr25519"),
            KeyType::Ed25519 => write!(f, "ed25519"),
            KeyType::Ecdsa => write!(f, "ecdsa"),
        }
    }
}

/// Verifier for SS58 accounts
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstrateVerifier;

impl SubstrateVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Find the key type that produced `signature` over `address`.
    ///
    /// `Ok(None)` when the inputs decode but no key type verifies.
    pub fn detect(&self, address: &str, signature: &str) -> Result<Option<KeyType>, VerifyError> {
        let account = ss58::decode(address)?;
        let signature = decode_signature_hex(signature)?;
        if !matches!(signature.len(), 64..=66) {
            return Err(VerifyError::UnsupportedSignatureLength(signature.len()));
        }

        let message = challenge_bytes(address);
        let wrapped = wrap_bytes(&message);

        let detected = [message.as_slice(), wrapped.as_slice()]
            .into_iter()
            .find_map(|candidate| verify_any(candidate, &signature, &account.public_key));

        if let Some(key_type) = detected {
            debug!(
                public_key = %to_prefixed_hex(&account.public_key),
                key_type = %key_type,
                "Substrate signature verified"
            );
        }

        Ok(detected)
    }
}

impl AccountVerifier for SubstrateVerifier {
    fn scheme(&self) -> SchemeId {
        SchemeId::SUBSTRATE
    }

    fn verify(&self, address: &str, signature: &str) -> Result<bool, VerifyError> {
        Ok(self.detect(address, signature)?.is_some())
    }
}

/// blake2b-256 digest
pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// Wrap a payload in `<Bytes>` tags unless it already is
pub fn wrap_bytes(message: &[u8]) -> Vec<u8> {
    if message.starts_with(WRAP_PREFIX) && message.ends_with(WRAP_POSTFIX) {
        return message.to_vec();
    }
    [WRAP_PREFIX, message, WRAP_POSTFIX].concat()
}

fn verify_any(message: &[u8], signature: &[u8], public_key: &[u8]) -> Option<KeyType> {
    if let Some(key_type) = verify_multisignature(message, signature, public_key) {
        return Some(key_type);
    }

    match signature.len() {
        64 => [KeyType::Sr25519, KeyType::Ed25519]
            .into_iter()
            .find(|key_type| verify_with(*key_type, message, signature, public_key)),
        65 => verify_with(KeyType::Ecdsa, message, signature, public_key).then_some(KeyType::Ecdsa),
        _ => None,
    }
}

fn verify_multisignature(message: &[u8], signature: &[u8], public_key: &[u8]) -> Option<KeyType> {
    let (tag, raw) = signature.split_first()?;
    let key_type = match (tag, raw.len()) {
        (0, 64) => KeyType::Ed25519,
        (1, 64) => KeyType::Sr25519,
        (2, 65) => KeyType::Ecdsa,
        _ => return None,
    };
    verify_with(key_type, message, raw, public_key).then_some(key_type)
}

fn verify_with(key_type: KeyType, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    let result = match key_type {
        KeyType::Sr25519 => verify_sr25519(message, signature, public_key),
        KeyType::Ed25519 => verify_ed25519(message, signature, public_key),
        KeyType::Ecdsa => verify_ecdsa(message, signature, public_key),
    };

    match result {
        Ok(valid) => valid,
        Err(e) => {
            trace!(key_type = %key_type, error = %e, "Key type not applicable");
            false
        }
    }
}

fn verify_sr25519(message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<bool, VerifyError> {
    let public = schnorrkel::PublicKey::from_bytes(public_key)
        .map_err(|e| VerifyError::InvalidAddress(e.to_string()))?;
    let signature = schnorrkel::Signature::from_bytes(signature)
        .map_err(|e| VerifyError::InvalidSignature(e.to_string()))?;

    Ok(public
        .verify_simple(SIGNING_CONTEXT, message, &signature)
        .is_ok())
}

fn verify_ed25519(message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<bool, VerifyError> {
    let key: [u8; 32] = public_key.try_into().map_err(|_| {
        VerifyError::InvalidAddress(format!("ed25519 key must be 32 bytes, got {}", public_key.len()))
    })?;
    let key = ed25519_dalek::VerifyingKey::from_bytes(&key)
        .map_err(|e| VerifyError::InvalidAddress(e.to_string()))?;

    let signature: [u8; 64] = signature
        .try_into()
        .map_err(|_| VerifyError::UnsupportedSignatureLength(signature.len()))?;
    let signature = ed25519_dalek::Signature::from_bytes(&signature);

    Ok(key.verify(message, &signature).is_ok())
}

fn verify_ecdsa(message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<bool, VerifyError> {
    let recovered = ecdsa::recover(&blake2_256(message), signature)?;
    let compressed = recovered.to_encoded_point(true);
    let compressed = compressed.as_bytes();

    // Accounts hold either the compressed key or its blake2b-256 hash
    Ok(match public_key.len() {
        33 => compressed == public_key,
        32 => blake2_256(compressed) == public_key,
        _ => false,
    })
}
