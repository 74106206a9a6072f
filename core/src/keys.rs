//! Key material for Safe stealth keys
//!
//! Typed wrappers around secp256k1 scalars and points, Ethereum-style
//! addresses, and the records exchanged between owners.
//!
//! Security:
//! - Private scalars are zeroized on drop and never serialized
//! - Private scalar equality is constant time
//! - `Debug` output never contains secret bytes

use std::fmt;
use std::str::FromStr;

use k256::{
    elliptic_curve::sec1::ToEncodedPoint,
    FieldBytes, NonZeroScalar, PublicKey, SecretKey,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::address::{derive_address, to_checksum};
use crate::error::{Result, StealthError};

/// Length of an Ethereum address in bytes
pub const ADDRESS_LEN: usize = 20;

/// SEC1 compressed point length (0x02/0x03 prefix + x)
pub const COMPRESSED_POINT_LEN: usize = 33;

/// SEC1 uncompressed point length (0x04 prefix + x + y)
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

/// Private scalar length in bytes
pub const SCALAR_LEN: usize = 32;

/// Decode hex with or without a `0x` prefix
pub fn parse_hex(input: &str) -> std::result::Result<Vec<u8>, hex::FromHexError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(digits)
}

// ============================================================================
// Private Scalar
// ============================================================================

/// A secp256k1 private scalar in `[1, n)`, zeroized on drop
#[derive(Clone)]
pub struct PrivateScalar(SecretKey);

impl PrivateScalar {
    /// Parse a big-endian scalar, rejecting zero and values >= n
    pub fn from_bytes(bytes: &[u8; SCALAR_LEN]) -> Result<Self> {
        let field_bytes = FieldBytes::from(*bytes);
        SecretKey::from_bytes(&field_bytes)
            .map(Self)
            .map_err(|_| StealthError::InvalidPrivateKey)
    }

    pub(crate) fn from_nonzero(scalar: NonZeroScalar) -> Self {
        Self(SecretKey::from(scalar))
    }

    /// Fresh random scalar from OS entropy
    pub fn random() -> Self {
        Self(SecretKey::random(&mut OsRng))
    }

    /// Big-endian bytes, wiped when the returned buffer drops
    pub fn to_bytes(&self) -> Zeroizing<[u8; SCALAR_LEN]> {
        let mut field_bytes = self.0.to_bytes();
        let mut out = Zeroizing::new([0u8; SCALAR_LEN]);
        out.copy_from_slice(&field_bytes);
        field_bytes.as_mut_slice().zeroize();
        out
    }

    /// `scalar·G`
    pub fn public_point(&self) -> PublicPoint {
        PublicPoint(self.0.public_key())
    }

    pub(crate) fn as_secret_key(&self) -> &SecretKey {
        &self.0
    }
}

impl PartialEq for PrivateScalar {
    fn eq(&self, other: &Self) -> bool {
        let lhs = self.to_bytes();
        let rhs = other.to_bytes();
        bool::from(lhs[..].ct_eq(&rhs[..]))
    }
}

impl Eq for PrivateScalar {}

impl fmt::Debug for PrivateScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateScalar(<redacted>)")
    }
}

// ============================================================================
// Public Point
// ============================================================================

/// A secp256k1 public point
#[derive(Clone, PartialEq, Eq)]
pub struct PublicPoint(PublicKey);

impl PublicPoint {
    /// Parse a SEC1 encoding, compressed (33 bytes) or uncompressed (65 bytes)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COMPRESSED_POINT_LEN && bytes.len() != UNCOMPRESSED_POINT_LEN {
            return Err(StealthError::InvalidPublicKey);
        }
        PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| StealthError::InvalidPublicKey)
    }

    pub fn to_compressed(&self) -> [u8; COMPRESSED_POINT_LEN] {
        let encoded = self.0.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_POINT_LEN];
        out.copy_from_slice(encoded.as_bytes());
        out
    }

    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_POINT_LEN] {
        let encoded = self.0.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_POINT_LEN];
        out.copy_from_slice(encoded.as_bytes());
        out
    }

    /// `0x`-prefixed hex of the compressed encoding
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_compressed()))
    }

    pub(crate) fn as_public_key(&self) -> &PublicKey {
        &self.0
    }
}

impl FromStr for PublicPoint {
    type Err = StealthError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = parse_hex(s).map_err(|_| StealthError::InvalidPublicKey)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for PublicPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicPoint({})", self.to_hex())
    }
}

impl Serialize for PublicPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Address
// ============================================================================

/// A 20-byte Ethereum address, displayed with EIP-55 checksum casing
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

/// Address of a Safe contract
pub type SafeAddress = Address;

/// Address derived from a stealth public key
pub type StealthAddress = Address;

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = StealthError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != ADDRESS_LEN * 2 {
            return Err(StealthError::InvalidAddress(format!(
                "expected {} hex characters, got {}",
                ADDRESS_LEN * 2,
                digits.len()
            )));
        }

        let bytes = hex::decode(digits)
            .map_err(|e| StealthError::InvalidAddress(format!("{}: {}", trimmed, e)))?;
        let mut array = [0u8; ADDRESS_LEN];
        array.copy_from_slice(&bytes);
        let address = Self(array);

        // Mixed case means the caller is asserting an EIP-55 checksum
        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && to_checksum(&address)[2..] != *digits {
            return Err(StealthError::InvalidAddress(format!(
                "{} fails EIP-55 checksum",
                trimmed
            )));
        }

        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_checksum(self))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", to_checksum(self))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_checksum(self))
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Stealth Key Pair
// ============================================================================

/// A stealth meta key-pair: viewing and spending keys
///
/// Not `Clone`; secrets are borrowed, never duplicated.
pub struct StealthKeyPair {
    viewing_key: PrivateScalar,
    spending_key: PrivateScalar,
    /// Viewing public key (v·G)
    pub viewing_public_key: PublicPoint,
    /// Spending public key (s·G)
    pub spending_public_key: PublicPoint,
}

impl StealthKeyPair {
    /// Build a key pair from its private halves
    pub fn from_private_keys(viewing_key: PrivateScalar, spending_key: PrivateScalar) -> Self {
        let viewing_public_key = viewing_key.public_point();
        let spending_public_key = spending_key.public_point();
        Self {
            viewing_key,
            spending_key,
            viewing_public_key,
            spending_public_key,
        }
    }

    pub fn viewing_key(&self) -> &PrivateScalar {
        &self.viewing_key
    }

    pub fn spending_key(&self) -> &PrivateScalar {
        &self.spending_key
    }

    /// The public halves, as published to a stealth key registry
    pub fn meta_keys(&self) -> RegisteredKeys {
        RegisteredKeys {
            viewing_public_key: self.viewing_public_key.clone(),
            spending_public_key: self.spending_public_key.clone(),
        }
    }

    /// Address derived from the viewing public key
    pub fn stealth_address(&self) -> StealthAddress {
        derive_address(&self.viewing_public_key)
    }
}

impl PartialEq for StealthKeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.viewing_key == other.viewing_key && self.spending_key == other.spending_key
    }
}

impl fmt::Debug for StealthKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StealthKeyPair")
            .field("viewing_public_key", &self.viewing_public_key)
            .field("spending_public_key", &self.spending_public_key)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Registry Records
// ============================================================================

/// Public stealth keys published by an address
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredKeys {
    pub viewing_public_key: PublicPoint,
    pub spending_public_key: PublicPoint,
}

/// One Safe owner's registered stealth keys
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OwnerStealthKeys {
    owner: Address,
    viewing_public_key: PublicPoint,
    spending_public_key: PublicPoint,
    address: StealthAddress,
}

impl OwnerStealthKeys {
    /// Attach an owner to its registered keys, deriving the stealth address
    pub fn new(owner: Address, keys: RegisteredKeys) -> Self {
        let address = derive_address(&keys.viewing_public_key);
        Self {
            owner,
            viewing_public_key: keys.viewing_public_key,
            spending_public_key: keys.spending_public_key,
            address,
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn viewing_public_key(&self) -> &PublicPoint {
        &self.viewing_public_key
    }

    pub fn spending_public_key(&self) -> &PublicPoint {
        &self.spending_public_key
    }

    pub fn address(&self) -> &StealthAddress {
        &self.address
    }
}

/// A private key encrypted for one recipient
///
/// Ciphertext layout: `ephemeral_pubkey(33) || aes_ciphertext(32) || tag(16)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedKeyRecord {
    recipient: Address,
    #[serde(with = "hex_bytes")]
    ciphertext: Vec<u8>,
}

impl EncryptedKeyRecord {
    pub fn new(recipient: Address, ciphertext: Vec<u8>) -> Self {
        Self {
            recipient,
            ciphertext,
        }
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

// Hex encoding for byte blobs in JSON
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}
