//! List Safes co-owned by a wallet

use anyhow::Result;
use colored::Colorize;
use safe_stealth::{Address, SafeOwnerResolver};

use crate::config::{DataDir, FileRegistry};

pub async fn run(data_dir: &DataDir, owner: &Address) -> Result<()> {
    let registry = FileRegistry::load(data_dir)?;
    let safes = registry.safes_of(owner).await?;

    if safes.is_empty() {
        println!("{}", format!("No Safes list {} as an owner", owner).dimmed());
        return Ok(());
    }

    for safe in safes {
        println!("{}", safe);
    }
    Ok(())
}
