use thiserror::Error;

use crate::keys::Address;

pub type Result<T> = std::result::Result<T, StealthError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StealthError {
    // Key generation
    #[error("Invalid signature length: expected {expected} bytes, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },

    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("Key derivation failed - no valid scalar found for domain tag")]
    KeyDerivationFailed,

    // Key material
    #[error("Invalid private key - zero or outside the curve order")]
    InvalidPrivateKey,

    #[error("Invalid public key - not a valid secp256k1 point")]
    InvalidPublicKey,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // Encryption
    #[error("Malformed ciphertext: expected {expected} bytes, got {actual}")]
    MalformedCiphertext { expected: usize, actual: usize },

    #[error("Authentication failed - ciphertext tampered or wrong key")]
    AuthenticationFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    // Collaborators
    #[error("No stealth keys registered for {0}")]
    NotRegistered(Address),

    #[error("Safe not found: {0}")]
    SafeNotFound(Address),

    #[error("Registry error: {0}")]
    Registry(String),

    // Aggregation
    #[error("Safe {0} has no owners")]
    NoOwners(Address),

    #[error("Owner {0} has not registered stealth keys")]
    UnregisteredOwner(Address),

    /// Transport failure or timeout while looking up an owner's keys.
    /// Fail-closed exactly like `UnregisteredOwner`; only the cause differs.
    #[error("Stealth key lookup for owner {owner} failed: {reason}")]
    LookupFailed { owner: Address, reason: String },

    #[error("No encrypted key record for owner {0}")]
    RecordNotFound(Address),
}

impl StealthError {
    /// The owner a failed aggregation points at, if any.
    pub fn offending_owner(&self) -> Option<&Address> {
        match self {
            StealthError::UnregisteredOwner(owner)
            | StealthError::LookupFailed { owner, .. }
            | StealthError::RecordNotFound(owner) => Some(owner),
            _ => None,
        }
    }
}
