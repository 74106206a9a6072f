//! ECIES over secp256k1
//!
//! Encrypts a private key for one recipient:
//! - Sender generates an ephemeral keypair (r, R = r·G)
//! - Shared secret: x-coordinate of r·P (recipient computes p·R)
//! - HKDF-SHA256(salt = R || P, ikm = shared x) -> AES-256 key || GCM nonce
//! - AES-256-GCM with R as associated data
//!
//! Record format: [ephemeral_pubkey:33][ciphertext:32][tag:16]
//!
//! The nonce is derived rather than random: every record has a fresh
//! ephemeral key, so a (key, nonce) pair is never reused.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use k256::ecdh::diffie_hellman;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Result, StealthError};
use crate::keys::{
    Address, EncryptedKeyRecord, PrivateScalar, PublicPoint, COMPRESSED_POINT_LEN, SCALAR_LEN,
};

/// Size of the ephemeral public key prefix
pub const EPHEMERAL_KEY_LEN: usize = COMPRESSED_POINT_LEN;
/// Size of the AES-GCM authentication tag
pub const TAG_LEN: usize = 16;
/// Total record size for a 32-byte secret
pub const RECORD_LEN: usize = EPHEMERAL_KEY_LEN + SCALAR_LEN + TAG_LEN;

const AES_KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// HKDF info string for key derivation
const HKDF_INFO: &[u8] = b"safe-stealth/ecies/v1";

/// AES key and nonce derived from one shared secret
struct CipherMaterial {
    key: Zeroizing<[u8; AES_KEY_LEN]>,
    nonce: [u8; NONCE_LEN],
}

/// HKDF-SHA256 over the ECDH x-coordinate, salted with both public keys
fn derive_cipher_material(
    shared_x: &[u8],
    ephemeral: &[u8; EPHEMERAL_KEY_LEN],
    recipient: &[u8; COMPRESSED_POINT_LEN],
) -> Result<CipherMaterial> {
    let mut salt = [0u8; EPHEMERAL_KEY_LEN + COMPRESSED_POINT_LEN];
    salt[..EPHEMERAL_KEY_LEN].copy_from_slice(ephemeral);
    salt[EPHEMERAL_KEY_LEN..].copy_from_slice(recipient);

    let hk = Hkdf::<Sha256>::new(Some(&salt), shared_x);
    let mut okm = Zeroizing::new([0u8; AES_KEY_LEN + NONCE_LEN]);
    hk.expand(HKDF_INFO, &mut okm[..])
        .map_err(|e| StealthError::EncryptionFailed(format!("HKDF expand failed: {}", e)))?;

    let mut key = Zeroizing::new([0u8; AES_KEY_LEN]);
    key.copy_from_slice(&okm[..AES_KEY_LEN]);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&okm[AES_KEY_LEN..]);

    Ok(CipherMaterial { key, nonce })
}

/// Encrypt a private scalar for the holder of `recipient`'s private key
///
/// Randomized: each call uses a fresh ephemeral key.
pub fn encrypt(secret: &PrivateScalar, recipient: &PublicPoint) -> Result<Vec<u8>> {
    let ephemeral = PrivateScalar::random();
    let ephemeral_bytes = ephemeral.public_point().to_compressed();
    let recipient_bytes = recipient.to_compressed();

    let shared = diffie_hellman(
        ephemeral.as_secret_key().to_nonzero_scalar(),
        recipient.as_public_key().as_affine(),
    );
    let material =
        derive_cipher_material(shared.raw_secret_bytes(), &ephemeral_bytes, &recipient_bytes)?;

    let cipher = Aes256Gcm::new_from_slice(&material.key[..])
        .map_err(|e| StealthError::EncryptionFailed(e.to_string()))?;

    let plaintext = secret.to_bytes();
    let sealed = cipher
        .encrypt(
            Nonce::from_slice(&material.nonce),
            Payload {
                msg: &plaintext[..],
                aad: &ephemeral_bytes,
            },
        )
        .map_err(|e| StealthError::EncryptionFailed(e.to_string()))?;

    // Build output: ephemeral_pubkey || ciphertext || tag
    let mut output = Vec::with_capacity(RECORD_LEN);
    output.extend_from_slice(&ephemeral_bytes);
    output.extend_from_slice(&sealed);
    debug_assert_eq!(output.len(), RECORD_LEN);

    Ok(output)
}

/// Decrypt a record produced by [`encrypt`] with the recipient's private key
///
/// Any tampering or key mismatch yields `AuthenticationFailed`; no partial
/// plaintext is ever returned.
pub fn decrypt(record: &[u8], recipient_key: &PrivateScalar) -> Result<PrivateScalar> {
    if record.len() != RECORD_LEN {
        return Err(StealthError::MalformedCiphertext {
            expected: RECORD_LEN,
            actual: record.len(),
        });
    }

    let mut ephemeral_bytes = [0u8; EPHEMERAL_KEY_LEN];
    ephemeral_bytes.copy_from_slice(&record[..EPHEMERAL_KEY_LEN]);
    let sealed = &record[EPHEMERAL_KEY_LEN..];

    // A corrupted ephemeral key is tampering, same as a corrupted tag
    let ephemeral = PublicPoint::from_bytes(&ephemeral_bytes)
        .map_err(|_| StealthError::AuthenticationFailed)?;
    let recipient_bytes = recipient_key.public_point().to_compressed();

    let shared = diffie_hellman(
        recipient_key.as_secret_key().to_nonzero_scalar(),
        ephemeral.as_public_key().as_affine(),
    );
    let material =
        derive_cipher_material(shared.raw_secret_bytes(), &ephemeral_bytes, &recipient_bytes)?;

    let cipher = Aes256Gcm::new_from_slice(&material.key[..])
        .map_err(|e| StealthError::EncryptionFailed(e.to_string()))?;

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(
                Nonce::from_slice(&material.nonce),
                Payload {
                    msg: sealed,
                    aad: &ephemeral_bytes,
                },
            )
            .map_err(|_| StealthError::AuthenticationFailed)?,
    );

    if plaintext.len() != SCALAR_LEN {
        return Err(StealthError::AuthenticationFailed);
    }
    let mut scalar_bytes = [0u8; SCALAR_LEN];
    scalar_bytes.copy_from_slice(&plaintext);
    let secret =
        PrivateScalar::from_bytes(&scalar_bytes).map_err(|_| StealthError::AuthenticationFailed);
    scalar_bytes.zeroize();

    secret
}

/// Encrypt `secret` for one Safe owner
pub fn encrypt_record(
    secret: &PrivateScalar,
    recipient_owner: Address,
    recipient_key: &PublicPoint,
) -> Result<EncryptedKeyRecord> {
    let ciphertext = encrypt(secret, recipient_key)?;
    Ok(EncryptedKeyRecord::new(recipient_owner, ciphertext))
}

/// Decrypt an owner's record with their own private key
pub fn decrypt_record(
    record: &EncryptedKeyRecord,
    recipient_key: &PrivateScalar,
) -> Result<PrivateScalar> {
    decrypt(record.ciphertext(), recipient_key)
}
