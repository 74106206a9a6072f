//! Recover a Safe's shared viewing key as one of its owners

use anyhow::Result;
use colored::Colorize;
use safe_stealth::{Address, SafeAddress};

use crate::config::{parse_signature, DataDir, FileSharePublisher};

pub fn run(data_dir: &DataDir, safe: &SafeAddress, owner: &Address, signature: &str) -> Result<()> {
    let signature = parse_signature(signature)?;
    let owner_keys = safe_stealth::generate(&signature)?;

    let share = FileSharePublisher::new(data_dir.clone()).load(safe)?;
    let viewing_key = share.recover_viewing_key(owner, owner_keys.viewing_key())?;

    println!();
    println!("{}", "Safe viewing key recovered".green().bold());
    println!("  Safe:               {}", safe);
    println!("  Stealth address:    {}", share.stealth_address);
    println!("  Viewing public key: {}", share.viewing_public_key);
    println!(
        "  Viewing key:        0x{}",
        hex::encode(&viewing_key.to_bytes()[..])
    );

    Ok(())
}
