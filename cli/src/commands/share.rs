//! Encrypt a Safe's viewing key for every owner and publish it

use anyhow::Result;
use safe_stealth::{AggregatorConfig, MultiOwnerKeyAggregator, SafeAddress};
use tracing::info;

use crate::config::{parse_signature, DataDir, FileRegistry, FileSharePublisher};

pub async fn run(
    data_dir: &DataDir,
    safe: &SafeAddress,
    signature: &str,
    config: AggregatorConfig,
) -> Result<()> {
    let signature = parse_signature(signature)?;
    let safe_keys = safe_stealth::generate(&signature)?;

    let registry = FileRegistry::load(data_dir)?;
    let aggregator = MultiOwnerKeyAggregator::with_config(&registry, &registry, config);
    let share = aggregator.share(safe, &safe_keys).await?;

    let publisher = FileSharePublisher::new(data_dir.clone());
    safe_stealth::publish(&share, &publisher).await?;
    info!(%safe, path = %data_dir.share_file(safe).display(), "key share written");

    println!("{}", serde_json::to_string_pretty(&share)?);
    Ok(())
}
