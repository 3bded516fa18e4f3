//! secp256k1 public-key recovery shared by the Substrate (ecdsa) and
//! Ethereum schemes.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use super::VerifyError;

/// Length of an `r || s || v` recoverable signature
pub const RECOVERABLE_SIGNATURE_LEN: usize = 65;

/// Map a trailing `v` byte to a recovery id.
///
/// Accepts raw ids (0, 1), legacy Ethereum values (27, 28) and EIP-155
/// chain-encoded values (>= 35).
pub fn recovery_id(v: u8) -> Result<RecoveryId, VerifyError> {
    let id = match v {
        0 | 1 => v,
        27..=u8::MAX => 1 - (v % 2),
        _ => return Err(VerifyError::InvalidRecoveryId(v)),
    };
    RecoveryId::try_from(id).map_err(|_| VerifyError::InvalidRecoveryId(v))
}

/// Recover the signer's key from a 65-byte signature over `prehash`.
pub fn recover(prehash: &[u8; 32], signature: &[u8]) -> Result<VerifyingKey, VerifyError> {
    if signature.len() != RECOVERABLE_SIGNATURE_LEN {
        return Err(VerifyError::UnsupportedSignatureLength(signature.len()));
    }

    let recovery_id = recovery_id(signature[64])?;
    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| VerifyError::InvalidSignature(e.to_string()))?;

    // k256 only recovers from low-S signatures; negating S flips R's y parity
    let (sig, recovery_id) = match sig.normalize_s() {
        Some(normalized) => (
            normalized,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (sig, recovery_id),
    };

    VerifyingKey::recover_from_prehash(prehash, &sig, recovery_id)
        .map_err(|_| VerifyError::RecoveryFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    #[test]
    fn test_recovery_id_values() {
        assert_eq!(recovery_id(0).unwrap().to_byte(), 0);
        assert_eq!(recovery_id(1).unwrap().to_byte(), 1);
        assert_eq!(recovery_id(27).unwrap().to_byte(), 0);
        assert_eq!(recovery_id(28).unwrap().to_byte(), 1);
        // EIP-155, chain id 1
        assert_eq!(recovery_id(37).unwrap().to_byte(), 0);
        assert_eq!(recovery_id(38).unwrap().to_byte(), 1);
    }

    #[test]
    fn test_recovery_id_rejects_gap() {
        assert_eq!(recovery_id(2), Err(VerifyError::InvalidRecoveryId(2)));
        assert_eq!(recovery_id(26), Err(VerifyError::InvalidRecoveryId(26)));
    }

    #[test]
    fn test_recover_signer() {
        let signing_key = SigningKey::from_slice(&[9u8; 32]).unwrap();
        let prehash = [0x42u8; 32];
        let (sig, recid) = signing_key.sign_prehash_recoverable(&prehash).unwrap();

        let mut signature = sig.to_bytes().to_vec();
        signature.push(recid.to_byte());

        let recovered = recover(&prehash, &signature).unwrap();
        assert_eq!(&recovered, signing_key.verifying_key());
    }

    #[test]
    fn test_recover_high_s_signature() {
        let signing_key = SigningKey::from_slice(&[9u8; 32]).unwrap();
        let prehash = [0x17u8; 32];
        let (sig, recid) = signing_key.sign_prehash_recoverable(&prehash).unwrap();

        // Re-encode as the malleable (r, n - s) twin with flipped parity
        let (r, s) = sig.split_scalars();
        let high = Signature::from_scalars(r, -*s).unwrap();
        let mut signature = high.to_bytes().to_vec();
        signature.push(recid.to_byte() ^ 1);

        let recovered = recover(&prehash, &signature).unwrap();
        assert_eq!(&recovered, signing_key.verifying_key());
    }

    #[test]
    fn test_recover_wrong_length() {
        assert_eq!(
            recover(&[0u8; 32], &[0u8; 64]),
            Err(VerifyError::UnsupportedSignatureLength(64))
        );
    }

    #[test]
    fn test_recover_zero_signature() {
        let mut signature = [0u8; 65];
        signature[64] = 27;
        assert!(recover(&[1u8; 32], &signature).is_err());
    }
}
