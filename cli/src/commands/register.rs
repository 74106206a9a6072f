//! Publish an owner's stealth public keys to the local registry

use anyhow::Result;
use colored::Colorize;
use safe_stealth::Address;
use tracing::info;

use crate::config::{parse_signature, DataDir, FileRegistry};

pub fn run(data_dir: &DataDir, owner: Address, signature: &str) -> Result<()> {
    let signature = parse_signature(signature)?;
    let keys = safe_stealth::generate(&signature)?;

    let mut registry = FileRegistry::load(data_dir)?;
    let replaced = registry.registered_at(&owner).is_some();
    registry.register(owner, keys.meta_keys());
    registry.save()?;
    info!(%owner, replaced, "registered stealth keys");

    println!("{}", "Stealth keys registered".green());
    println!("  Owner:               {}", owner);
    println!("  Viewing public key:  {}", keys.viewing_public_key);
    println!("  Spending public key: {}", keys.spending_public_key);
    if replaced {
        println!(
            "{}",
            "Replaced an earlier registration. Existing key shares stay encrypted to the old key."
                .yellow()
        );
    }

    Ok(())
}
