//! Property-based tests for key generation and ECIES
//!
//! Properties tested:
//! - Determinism: the same signature always yields the same keys
//! - Sensitivity: changing any r/s byte changes both keys
//! - ECIES correctness: the recipient always recovers the secret
//! - Tamper rejection: any flipped ciphertext or tag bit fails authentication
//! - Wrong recipient rejection

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use crate::crypto::{decrypt, derive_address, encrypt, generate, RECORD_LEN};
    use crate::error::StealthError;
    use crate::keys::{PrivateScalar, COMPRESSED_POINT_LEN};

    // Strategy for 65-byte signatures with a valid recovery byte
    fn signature() -> impl Strategy<Value = Vec<u8>> {
        (
            prop::collection::vec(any::<u8>(), 64),
            prop::sample::select(vec![0u8, 1, 27, 28]),
        )
            .prop_map(|(mut rs, v)| {
                rs.push(v);
                rs
            })
    }

    // Strategy for valid secp256k1 private scalars
    fn private_scalar() -> impl Strategy<Value = PrivateScalar> {
        prop::array::uniform32(any::<u8>())
            .prop_filter_map("valid scalar", |bytes| PrivateScalar::from_bytes(&bytes).ok())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_generate_is_deterministic(sig in signature()) {
            let first = generate(&sig).expect("valid signature");
            let second = generate(&sig).expect("valid signature");
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_any_rs_byte_changes_keys(sig in signature(), index in 0usize..64) {
            let mut other = sig.clone();
            other[index] ^= 0x01;

            let a = generate(&sig).expect("valid signature");
            let b = generate(&other).expect("valid signature");
            prop_assert_ne!(&a.viewing_public_key, &b.viewing_public_key);
            prop_assert_ne!(&a.spending_public_key, &b.spending_public_key);
        }

        #[test]
        fn prop_recovery_byte_is_ignored(sig in signature()) {
            let mut legacy = sig.clone();
            legacy[64] = 27;
            let mut normalized = sig;
            normalized[64] = 0;
            prop_assert_eq!(generate(&legacy).unwrap(), generate(&normalized).unwrap());
        }

        #[test]
        fn prop_ecies_roundtrip(secret in private_scalar(), recipient in private_scalar()) {
            let record = encrypt(&secret, &recipient.public_point()).unwrap();
            prop_assert_eq!(record.len(), RECORD_LEN);
            prop_assert_eq!(decrypt(&record, &recipient).unwrap(), secret);
        }

        #[test]
        fn prop_flipped_bit_fails_authentication(
            secret in private_scalar(),
            recipient in private_scalar(),
            index in COMPRESSED_POINT_LEN..RECORD_LEN,
            bit in 0u8..8,
        ) {
            let mut record = encrypt(&secret, &recipient.public_point()).unwrap();
            record[index] ^= 1 << bit;
            prop_assert_eq!(
                decrypt(&record, &recipient).unwrap_err(),
                StealthError::AuthenticationFailed
            );
        }

        #[test]
        fn prop_wrong_recipient_rejected(
            secret in private_scalar(),
            recipient in private_scalar(),
            other in private_scalar(),
        ) {
            prop_assume!(recipient != other);
            let record = encrypt(&secret, &recipient.public_point()).unwrap();
            prop_assert!(decrypt(&record, &other).is_err());
        }

        #[test]
        fn prop_address_is_stable(secret in private_scalar()) {
            let point = secret.public_point();
            let address = derive_address(&point);
            prop_assert_eq!(address, derive_address(&point));
            let parsed: crate::keys::Address = address.to_string().parse().unwrap();
            prop_assert_eq!(parsed, address);
        }
    }
}
