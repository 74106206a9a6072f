//! Safe stealth keys
//!
//! Lets every owner of a multi-signature Safe recover one shared stealth
//! viewing key without any owner learning another owner's keys.
//!
//! Flow:
//! 1. Each owner signs `SIGNING_MESSAGE`; `crypto::generate` turns the
//!    signature into a deterministic viewing/spending key pair
//! 2. Owners publish the public halves to a stealth key registry
//! 3. `MultiOwnerKeyAggregator::aggregate` collects every owner's keys,
//!    failing closed if any owner is unregistered
//! 4. `encrypt_for` seals the Safe's viewing key once per owner (ECIES)
//! 5. Each owner decrypts their record with their own viewing key

pub mod aggregator;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod registry;


#[cfg(test)]
mod fuzz_tests;

pub use aggregator::{
    encrypt_for, publish, recover_shared_key, AggregatorConfig, MultiOwnerKeyAggregator,
    SafeKeyShare, SafeOwnerKeys,
};
pub use crypto::{derive_address, generate, signing_message, SIGNATURE_LEN, SIGNING_MESSAGE};
pub use error::{Result, StealthError};
pub use keys::{
    Address, EncryptedKeyRecord, OwnerStealthKeys, PrivateScalar, PublicPoint, RegisteredKeys,
    SafeAddress, StealthAddress, StealthKeyPair,
};
pub use registry::{InMemoryRegistry, KeySharePublisher, SafeOwnerResolver, StealthKeyLookup};
