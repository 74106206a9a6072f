//! Address derivation
//!
//! address = keccak256(uncompressed_pubkey[1..])[12..], displayed with the
//! EIP-55 mixed-case checksum.

use sha3::{Digest, Keccak256};

use crate::error::Result;
use crate::keys::{Address, PublicPoint, StealthAddress, ADDRESS_LEN};

/// Derive the address controlled by a public key
pub fn derive_address(public_key: &PublicPoint) -> StealthAddress {
    let uncompressed = public_key.to_uncompressed();
    // Drop the 0x04 SEC1 tag, hash x || y
    let hash = Keccak256::digest(&uncompressed[1..]);

    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&hash[32 - ADDRESS_LEN..]);
    Address::new(bytes)
}

/// Derive an address from a SEC1-encoded public key
pub fn derive_address_from_bytes(public_key: &[u8]) -> Result<StealthAddress> {
    let point = PublicPoint::from_bytes(public_key)?;
    Ok(derive_address(&point))
}

/// EIP-55 checksum encoding, `0x`-prefixed
pub fn to_checksum(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StealthError;
    use crate::keys::PrivateScalar;

    #[test]
    fn test_known_address_vector() {
        // Private key 1 -> generator point -> well-known address
        let mut one = [0u8; 32];
        one[31] = 1;
        let key = PrivateScalar::from_bytes(&one).unwrap();
        let address = derive_address(&key.public_point());
        assert_eq!(
            address.to_string(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn test_derive_address_is_stable() {
        let key = PrivateScalar::random();
        let point = key.public_point();
        assert_eq!(derive_address(&point), derive_address(&point));
        assert_eq!(
            derive_address_from_bytes(&point.to_compressed()).unwrap(),
            derive_address_from_bytes(&point.to_uncompressed()).unwrap()
        );
    }

    #[test]
    fn test_derive_address_rejects_malformed_point() {
        assert_eq!(
            derive_address_from_bytes(&[0x04; 65]).unwrap_err(),
            StealthError::InvalidPublicKey
        );
        assert_eq!(
            derive_address_from_bytes(&[]).unwrap_err(),
            StealthError::InvalidPublicKey
        );
    }

    #[test]
    fn test_checksum_vectors() {
        // From EIP-55
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let address: Address = expected.to_lowercase().parse().unwrap();
            assert_eq!(to_checksum(&address), expected);
        }
    }
}
