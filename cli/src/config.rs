//! Data directory, local registry and published shares for the CLI
//!
//! Layout under the data directory:
//! - `registry.json`: Safe owner lists and each owner's registered public keys
//! - `shares/<safe>.json`: published key shares, one per Safe

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use safe_stealth::{
    Address, InMemoryRegistry, KeySharePublisher, RegisteredKeys, SafeAddress, SafeKeyShare,
    SafeOwnerResolver, StealthError, StealthKeyLookup, SIGNATURE_LEN,
};

/// Default directory under $HOME
const DATA_DIR: &str = ".safe-stealth";
const REGISTRY_FILE: &str = "registry.json";
const SHARES_DIR: &str = "shares";

/// Resolved data directory
#[derive(Clone, Debug)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Use `override_dir` if given, otherwise `~/.safe-stealth`
    pub fn resolve(override_dir: Option<PathBuf>) -> Result<Self> {
        let root = match override_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .context("Could not find home directory; pass --data-dir")?
                .join(DATA_DIR),
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry_file(&self) -> PathBuf {
        self.root.join(REGISTRY_FILE)
    }

    pub fn shares_dir(&self) -> PathBuf {
        self.root.join(SHARES_DIR)
    }

    pub fn share_file(&self, safe: &SafeAddress) -> PathBuf {
        self.shares_dir().join(format!("{}.json", safe))
    }
}

/// Write a file readable only by the current user
pub fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Set restrictive permissions on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, contents)?;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents)?;
    }

    Ok(())
}

/// Parse a hex wallet signature (r || s || v)
pub fn parse_signature(input: &str) -> Result<Vec<u8>> {
    let bytes = safe_stealth::keys::parse_hex(input.trim()).context("Signature is not valid hex")?;
    if bytes.len() != SIGNATURE_LEN {
        bail!(
            "Invalid signature length: expected {} bytes, got {}",
            SIGNATURE_LEN,
            bytes.len()
        );
    }
    Ok(bytes)
}

// ============================================================================
// File-backed registry
// ============================================================================

/// One owner's registration as stored on disk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRegistration {
    #[serde(flatten)]
    pub keys: RegisteredKeys,
    pub registered_at: DateTime<Utc>,
}

/// On-disk shape of `registry.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryContents {
    #[serde(default)]
    safes: BTreeMap<SafeAddress, Vec<Address>>,
    #[serde(default)]
    owners: BTreeMap<Address, StoredRegistration>,
}

/// Local registry persisted as JSON
///
/// Lookups go through an in-memory copy; `save` writes it back.
pub struct FileRegistry {
    path: PathBuf,
    registry: InMemoryRegistry,
    registered_at: BTreeMap<Address, DateTime<Utc>>,
}

impl FileRegistry {
    /// Load `registry.json`, or start empty if it does not exist yet
    pub fn load(data_dir: &DataDir) -> Result<Self> {
        let path = data_dir.registry_file();
        let contents = if path.exists() {
            let json = fs::read_to_string(&path).context("Failed to read registry file")?;
            serde_json::from_str::<RegistryContents>(&json)
                .context("Failed to parse registry file")?
        } else {
            RegistryContents::default()
        };

        let registry = InMemoryRegistry::new();
        let mut registered_at = BTreeMap::new();
        for (safe, owners) in contents.safes {
            registry.add_safe(safe, owners);
        }
        for (owner, stored) in contents.owners {
            registry.register(owner, stored.keys);
            registered_at.insert(owner, stored.registered_at);
        }
        debug!(path = %path.display(), "loaded registry");

        Ok(Self {
            path,
            registry,
            registered_at,
        })
    }

    pub fn save(&self) -> Result<()> {
        let registered = self.registry.registered_keys();
        let owners = registered
            .into_iter()
            .map(|(owner, keys)| {
                let registered_at = self
                    .registered_at
                    .get(&owner)
                    .copied()
                    .unwrap_or_else(Utc::now);
                (owner, StoredRegistration { keys, registered_at })
            })
            .collect();

        let contents = RegistryContents {
            safes: self.registry.safes(),
            owners,
        };
        let json = serde_json::to_string_pretty(&contents)?;
        write_private(&self.path, &json).context("Failed to write registry file")?;
        Ok(())
    }

    pub fn add_safe(&self, safe: SafeAddress, owners: Vec<Address>) {
        self.registry.add_safe(safe, owners);
    }

    /// Register keys, replacing any earlier registration for `owner`
    pub fn register(&mut self, owner: Address, keys: RegisteredKeys) {
        self.registry.register(owner, keys);
        self.registered_at.insert(owner, Utc::now());
    }

    pub fn registered_at(&self, owner: &Address) -> Option<DateTime<Utc>> {
        self.registered_at.get(owner).copied()
    }
}

impl SafeOwnerResolver for FileRegistry {
    async fn owners_of(&self, safe: &SafeAddress) -> safe_stealth::Result<Vec<Address>> {
        self.registry.owners_of(safe).await
    }

    async fn safes_of(&self, owner: &Address) -> safe_stealth::Result<Vec<SafeAddress>> {
        self.registry.safes_of(owner).await
    }
}

impl StealthKeyLookup for FileRegistry {
    async fn get(&self, address: &Address) -> safe_stealth::Result<RegisteredKeys> {
        self.registry.get(address).await
    }
}

// ============================================================================
// Published shares
// ============================================================================

/// Publishes key shares as `shares/<safe>.json`
pub struct FileSharePublisher {
    data_dir: DataDir,
}

impl FileSharePublisher {
    pub fn new(data_dir: DataDir) -> Self {
        Self { data_dir }
    }

    /// Read back the share published for `safe`
    pub fn load(&self, safe: &SafeAddress) -> Result<SafeKeyShare> {
        let path = self.data_dir.share_file(safe);
        if !path.exists() {
            bail!(
                "No key share published for Safe {}. Run 'safestealth share' first.",
                safe
            );
        }
        let json = fs::read_to_string(&path).context("Failed to read key share")?;
        serde_json::from_str(&json).context("Failed to parse key share")
    }
}

impl KeySharePublisher for FileSharePublisher {
    async fn publish(&self, share: &SafeKeyShare) -> safe_stealth::Result<()> {
        let path = self.data_dir.share_file(&share.safe);
        let json = serde_json::to_string_pretty(share)
            .map_err(|e| StealthError::Registry(e.to_string()))?;
        write_private(&path, &json).map_err(|e| StealthError::Registry(e.to_string()))?;
        debug!(path = %path.display(), "published key share");
        Ok(())
    }
}
