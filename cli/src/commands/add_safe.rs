//! Record a Safe and its owners

use anyhow::{bail, Result};
use colored::Colorize;
use safe_stealth::{Address, SafeAddress};

use crate::config::{DataDir, FileRegistry};

pub fn run(data_dir: &DataDir, safe: SafeAddress, owners: Vec<Address>) -> Result<()> {
    for (i, owner) in owners.iter().enumerate() {
        if owners[..i].contains(owner) {
            bail!("Owner {} is listed twice", owner);
        }
    }

    let registry = FileRegistry::load(data_dir)?;
    let count = owners.len();
    registry.add_safe(safe, owners);
    registry.save()?;

    println!("{} {} ({} owners)", "Recorded Safe".green(), safe, count);
    Ok(())
}
