//! SS58 address codec
//!
//! ```text
//! base58( prefix(1-2 bytes) || public_key || blake2b_512("SS58PRE" || prefix || key)[..n] )
//! ```
//!
//! The checksum is two bytes for 32/33 byte keys and one byte otherwise.
//! Network prefixes below 64 take one byte; 64..16383 take two.

use blake2::{Blake2b512, Digest};

use super::{decode_strict_hex, VerifyError};

const CHECKSUM_PREFIX: &[u8] = b"SS58PRE";

/// Total decoded lengths (prefix + key + checksum) that can be valid
const ALLOWED_DECODED_LENGTHS: [usize; 8] = [3, 4, 6, 10, 35, 36, 37, 38];

/// Key lengths accepted by [`encode`]
const ALLOWED_KEY_LENGTHS: [usize; 6] = [1, 2, 4, 8, 32, 33];

const MAX_NETWORK_PREFIX: u16 = 16_383;

/// Generic Substrate network prefix
pub const SUBSTRATE_PREFIX: u16 = 42;

/// A decoded account address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ss58Address {
    /// Network prefix, `None` when the address was given as raw hex
    pub network: Option<u16>,
    pub public_key: Vec<u8>,
}

/// Decode an SS58 (or `0x` hex) address into its public key.
pub fn decode(address: &str) -> Result<Ss58Address, VerifyError> {
    if let Some(public_key) = decode_strict_hex(address) {
        return Ok(Ss58Address {
            network: None,
            public_key,
        });
    }

    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| VerifyError::InvalidAddress(e.to_string()))?;

    if !ALLOWED_DECODED_LENGTHS.contains(&decoded.len()) {
        return Err(VerifyError::InvalidAddress(format!(
            "unexpected decoded length {}",
            decoded.len()
        )));
    }

    let (prefix_len, network) = if decoded[0] & 0b0100_0000 == 0 {
        (1, decoded[0] as u16)
    } else {
        let network = ((decoded[0] & 0b0011_1111) as u16) << 2
            | (decoded[1] >> 6) as u16
            | ((decoded[1] & 0b0011_1111) as u16) << 8;
        (2, network)
    };

    // Top bit set and 46/47 are reserved
    if decoded[0] & 0b1000_0000 != 0 || matches!(decoded[0], 46 | 47) {
        return Err(VerifyError::InvalidAddress(format!(
            "reserved prefix byte {}",
            decoded[0]
        )));
    }

    let is_public_key = decoded.len() == 34 + prefix_len || decoded.len() == 35 + prefix_len;
    let checksum_len = if is_public_key { 2 } else { 1 };
    let body_len = decoded.len() - checksum_len;

    let hash = checksum_hash(&decoded[..body_len]);
    if decoded[body_len..] != hash[..checksum_len] {
        return Err(VerifyError::InvalidAddress("checksum mismatch".to_string()));
    }

    Ok(Ss58Address {
        network: Some(network),
        public_key: decoded[prefix_len..body_len].to_vec(),
    })
}

/// Encode a public key for the given network prefix.
pub fn encode(public_key: &[u8], network: u16) -> Result<String, VerifyError> {
    if !ALLOWED_KEY_LENGTHS.contains(&public_key.len()) {
        return Err(VerifyError::InvalidAddress(format!(
            "cannot encode {} byte key",
            public_key.len()
        )));
    }
    if network > MAX_NETWORK_PREFIX || matches!(network, 46 | 47) {
        return Err(VerifyError::InvalidAddress(format!(
            "invalid network prefix {}",
            network
        )));
    }

    let mut data = if network < 64 {
        vec![network as u8]
    } else {
        vec![
            ((network & 0b0000_0000_1111_1100) >> 2) as u8 | 0b0100_0000,
            (network >> 8) as u8 | ((network & 0b0000_0000_0000_0011) << 6) as u8,
        ]
    };
    data.extend_from_slice(public_key);

    let checksum_len = if matches!(public_key.len(), 32 | 33) { 2 } else { 1 };
    let hash = checksum_hash(&data);
    data.extend_from_slice(&hash[..checksum_len]);

    Ok(bs58::encode(data).into_string())
}

fn checksum_hash(data: &[u8]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(CHECKSUM_PREFIX);
    hasher.update(data);

    let mut hash = [0u8; 64];
    hash.copy_from_slice(&hasher.finalize());
    hash
}
