//! safestealth - share one stealth viewing key between every owner of a Safe

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use safe_stealth::{Address, AggregatorConfig, SafeAddress};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[cfg(test)]
mod tests;

use commands::*;
use config::DataDir;

#[derive(Parser)]
#[command(name = "safestealth")]
#[command(version = "0.1.0")]
#[command(about = "Stealth keys for multi-owner Safes")]
#[command(long_about = r#"
Derives stealth keys from a wallet signature and shares a Safe's viewing
key with every owner, each copy encrypted to that owner's own key.

Quick Start:
  1. safestealth message                       Print the message to sign
  2. safestealth register --owner .. --signature ..
  3. safestealth add-safe --safe .. --owner .. --owner ..
  4. safestealth share --safe .. --signature ..
  5. safestealth recover --safe .. --owner .. --signature ..
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (default: ~/.safe-stealth)
    #[arg(long, global = true, env = "SAFE_STEALTH_HOME")]
    data_dir: Option<PathBuf>,

    /// Per-owner key lookup timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    lookup_timeout_secs: u64,

    /// Maximum owner lookups in flight
    #[arg(long, global = true, default_value_t = 8)]
    max_concurrent: usize,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the message your wallet must sign
    Message,

    /// Derive stealth keys from a wallet signature
    Keygen {
        /// 65-byte signature over the signing message (hex)
        #[arg(short, long)]
        signature: String,

        /// Also print the private keys
        #[arg(long)]
        reveal: bool,
    },

    /// Derive the stealth address of a public key
    Address {
        /// Compressed or uncompressed secp256k1 public key (hex)
        #[arg(short, long)]
        public_key: String,
    },

    /// Publish an owner's stealth public keys to the local registry
    Register {
        /// Owner wallet address
        #[arg(short, long)]
        owner: Address,

        /// Owner's signature over the signing message (hex)
        #[arg(short, long)]
        signature: String,
    },

    /// Record a Safe and its owners (in the Safe's owner order)
    AddSafe {
        #[arg(long)]
        safe: SafeAddress,

        #[arg(short, long = "owner", required = true)]
        owners: Vec<Address>,
    },

    /// List Safes co-owned by a wallet
    Safes {
        #[arg(short, long)]
        owner: Address,
    },

    /// Show every owner's stealth keys for a Safe
    Owners {
        #[arg(long)]
        safe: SafeAddress,
    },

    /// Encrypt a Safe's viewing key for every owner and publish it
    Share {
        #[arg(long)]
        safe: SafeAddress,

        /// Signature the Safe keys are derived from (hex)
        #[arg(short, long)]
        signature: String,
    },

    /// Recover a Safe's viewing key as one of its owners
    Recover {
        #[arg(long)]
        safe: SafeAddress,

        #[arg(short, long)]
        owner: Address,

        /// Owner's own signature over the signing message (hex)
        #[arg(short, long)]
        signature: String,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data_dir = DataDir::resolve(cli.data_dir)?;
    let aggregator_config = AggregatorConfig {
        lookup_timeout: Duration::from_secs(cli.lookup_timeout_secs),
        max_concurrent_lookups: cli.max_concurrent,
    };

    match cli.command {
        Commands::Message => {
            message::run();
        }
        Commands::Keygen { signature, reveal } => {
            keygen::run(&signature, reveal)?;
        }
        Commands::Address { public_key } => {
            address::run(&public_key)?;
        }
        Commands::Register { owner, signature } => {
            register::run(&data_dir, owner, &signature)?;
        }
        Commands::AddSafe { safe, owners } => {
            add_safe::run(&data_dir, safe, owners)?;
        }
        Commands::Safes { owner } => {
            safes::run(&data_dir, &owner).await?;
        }
        Commands::Owners { safe } => {
            owners::run(&data_dir, &safe, aggregator_config).await?;
        }
        Commands::Share { safe, signature } => {
            share::run(&data_dir, &safe, &signature, aggregator_config).await?;
        }
        Commands::Recover {
            safe,
            owner,
            signature,
        } => {
            recover::run(&data_dir, &safe, &owner, &signature)?;
        }
    }

    Ok(())
}
