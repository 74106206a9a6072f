//! Show every owner's stealth keys for a Safe

use anyhow::Result;
use colored::Colorize;
use safe_stealth::{AggregatorConfig, MultiOwnerKeyAggregator, SafeAddress};

use crate::config::{DataDir, FileRegistry};

pub async fn run(data_dir: &DataDir, safe: &SafeAddress, config: AggregatorConfig) -> Result<()> {
    let registry = FileRegistry::load(data_dir)?;
    let aggregator = MultiOwnerKeyAggregator::with_config(&registry, &registry, config);
    let owners = aggregator.aggregate(safe).await?;

    println!();
    println!("{} {}", "Safe".yellow().bold(), safe);
    for (i, owner) in owners.iter().enumerate() {
        println!();
        println!("{} {}", format!("Owner {}:", i + 1).cyan(), owner.owner());
        println!("  Viewing public key:  {}", owner.viewing_public_key());
        println!("  Spending public key: {}", owner.spending_public_key());
        println!("  Stealth address:     {}", owner.address());
    }
    println!();

    Ok(())
}
