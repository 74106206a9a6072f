//! Derive the stealth address of a public key

use anyhow::{Context, Result};

use safe_stealth::crypto::derive_address_from_bytes;
use safe_stealth::keys::parse_hex;

pub fn run(public_key: &str) -> Result<()> {
    let bytes = parse_hex(public_key.trim()).context("Public key is not valid hex")?;
    let address = derive_address_from_bytes(&bytes)?;
    println!("{}", address);
    Ok(())
}
