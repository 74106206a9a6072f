//! Deterministic stealth meta key generation
//!
//! The wallet signs `SIGNING_MESSAGE`; the signature is the only entropy.
//! Any device holding the wallet key reproduces the same signature and
//! therefore the same stealth keys, so nothing secret needs to be stored.
//!
//! Derivation:
//! - viewing_key  = keccak256("viewing"  [|| be32(counter)] || r || s)
//! - spending_key = keccak256("spending" [|| be32(counter)] || r || s)
//!
//! A digest is accepted only if it is already a canonical non-zero scalar,
//! otherwise the counter is bumped. The reduction never wraps.

use k256::{FieldBytes, NonZeroScalar};
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use crate::error::{Result, StealthError};
use crate::keys::{PrivateScalar, StealthKeyPair};

/// Message the wallet signs to produce key-generation entropy
pub const SIGNING_MESSAGE: &str = "Sign this message to generate your Safe stealth keys.\n\n\
Only sign this message for a trusted client. Anyone holding this signature can view \
and spend funds sent to your stealth addresses.";

/// Length of an Ethereum ECDSA signature: r (32) || s (32) || v (1)
pub const SIGNATURE_LEN: usize = 65;

/// Domain tag for the viewing key
const VIEWING_DOMAIN: &[u8] = b"viewing";

/// Domain tag for the spending key
const SPENDING_DOMAIN: &[u8] = b"spending";

/// Upper bound on counter retries per key
const MAX_DERIVATION_ATTEMPTS: u32 = 256;

/// The fixed message handed to the signing collaborator
pub fn signing_message() -> &'static str {
    SIGNING_MESSAGE
}

/// Generate a stealth meta key-pair from a wallet signature over `SIGNING_MESSAGE`
pub fn generate(signature: &[u8]) -> Result<StealthKeyPair> {
    if signature.len() != SIGNATURE_LEN {
        return Err(StealthError::InvalidSignatureLength {
            expected: SIGNATURE_LEN,
            actual: signature.len(),
        });
    }

    // v is recovery metadata; wallets disagree on 0/1 vs 27/28 so it is
    // validated but never hashed
    let v = signature[SIGNATURE_LEN - 1];
    if !matches!(v, 0 | 1 | 27 | 28) {
        return Err(StealthError::InvalidSignatureFormat(format!(
            "recovery byte must be 0, 1, 27 or 28, got {}",
            v
        )));
    }

    let rs = &signature[..SIGNATURE_LEN - 1];
    let viewing_key = derive_scalar(VIEWING_DOMAIN, rs)?;
    let spending_key = derive_scalar(SPENDING_DOMAIN, rs)?;

    Ok(StealthKeyPair::from_private_keys(viewing_key, spending_key))
}

/// Hash `domain [|| counter] || data` until the digest is a valid scalar
fn derive_scalar(domain: &[u8], data: &[u8]) -> Result<PrivateScalar> {
    for counter in 0..MAX_DERIVATION_ATTEMPTS {
        let mut hasher = Keccak256::new();
        hasher.update(domain);
        if counter > 0 {
            hasher.update(counter.to_be_bytes());
        }
        hasher.update(data);

        let mut digest: FieldBytes = hasher.finalize();
        let candidate = Option::<NonZeroScalar>::from(NonZeroScalar::from_repr(digest));
        digest.as_mut_slice().zeroize();

        if let Some(scalar) = candidate {
            return Ok(PrivateScalar::from_nonzero(scalar));
        }
    }

    Err(StealthError::KeyDerivationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature(fill: u8, v: u8) -> [u8; SIGNATURE_LEN] {
        let mut sig = [fill; SIGNATURE_LEN];
        sig[SIGNATURE_LEN - 1] = v;
        sig
    }

    #[test]
    fn test_generate_is_deterministic() {
        let sig = signature(0x42, 27);
        let keys1 = generate(&sig).unwrap();
        let keys2 = generate(&sig).unwrap();

        assert_eq!(keys1, keys2);
        assert_eq!(keys1.viewing_public_key, keys2.viewing_public_key);
        assert_eq!(keys1.spending_public_key, keys2.spending_public_key);
    }

    #[test]
    fn test_viewing_and_spending_keys_are_independent() {
        let keys = generate(&signature(0x42, 27)).unwrap();
        assert_ne!(keys.viewing_key(), keys.spending_key());
        assert_ne!(keys.viewing_public_key, keys.spending_public_key);
    }

    #[test]
    fn test_public_keys_match_private_keys() {
        let keys = generate(&signature(0x07, 28)).unwrap();
        assert_eq!(keys.viewing_key().public_point(), keys.viewing_public_key);
        assert_eq!(keys.spending_key().public_point(), keys.spending_public_key);
    }

    #[test]
    fn test_recovery_byte_encoding_does_not_change_keys() {
        let legacy = generate(&signature(0x42, 27)).unwrap();
        let normalized = generate(&signature(0x42, 0)).unwrap();
        assert_eq!(legacy, normalized);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = generate(&[0u8; 64]).unwrap_err();
        assert_eq!(
            err,
            StealthError::InvalidSignatureLength {
                expected: 65,
                actual: 64
            }
        );
        assert!(matches!(
            generate(&[]),
            Err(StealthError::InvalidSignatureLength { actual: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_recovery_byte() {
        assert!(matches!(
            generate(&signature(0x42, 5)),
            Err(StealthError::InvalidSignatureFormat(_))
        ));
    }

    #[test]
    fn test_derive_scalar_domain_separation() {
        let data = [0x11u8; 64];
        let a = derive_scalar(VIEWING_DOMAIN, &data).unwrap();
        let b = derive_scalar(SPENDING_DOMAIN, &data).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_derive_scalar_matches_plain_keccak() {
        // Counter 0 must be the bare tag with no appended bytes
        let data = [0x5au8; 64];
        let mut hasher = Keccak256::new();
        hasher.update(VIEWING_DOMAIN);
        hasher.update(data);
        let digest = hasher.finalize();
        let mut expected = [0u8; 32];
        expected.copy_from_slice(&digest);

        let derived = derive_scalar(VIEWING_DOMAIN, &data).unwrap();
        assert_eq!(*derived.to_bytes(), expected);
    }
}
