//! Cryptographic primitives
//!
//! - `keygen`: deterministic stealth meta keys from a wallet signature
//! - `address`: Ethereum address derivation from a public key
//! - `ecies`: secp256k1 + HKDF-SHA256 + AES-256-GCM hybrid encryption

pub mod address;
pub mod ecies;
pub mod keygen;

pub use address::{derive_address, derive_address_from_bytes, to_checksum};
pub use ecies::{decrypt, decrypt_record, encrypt, encrypt_record, RECORD_LEN};
pub use keygen::{generate, signing_message, SIGNATURE_LEN, SIGNING_MESSAGE};
