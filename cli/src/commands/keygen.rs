//! Derive stealth keys from a wallet signature

use anyhow::Result;
use colored::Colorize;

use crate::config::parse_signature;

pub fn run(signature: &str, reveal: bool) -> Result<()> {
    let signature = parse_signature(signature)?;
    let keys = safe_stealth::generate(&signature)?;

    println!();
    println!("{}", "Stealth Meta Keys".yellow().bold());
    println!();
    println!("  Viewing public key:  {}", keys.viewing_public_key);
    println!("  Spending public key: {}", keys.spending_public_key);
    println!("  Stealth address:     {}", keys.stealth_address());

    if reveal {
        println!();
        println!("{}", "PRIVATE KEYS - never share these".red().bold());
        println!(
            "  Viewing key:  0x{}",
            hex::encode(&keys.viewing_key().to_bytes()[..])
        );
        println!(
            "  Spending key: 0x{}",
            hex::encode(&keys.spending_key().to_bytes()[..])
        );
    }

    println!();
    println!(
        "{}",
        "The same signature always reproduces these keys; nothing is stored.".dimmed()
    );

    Ok(())
}
