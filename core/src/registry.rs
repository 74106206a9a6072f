//! External collaborators
//!
//! The core never talks to a network itself. Safe ownership, published
//! stealth keys, and the publishing sink are reached through these traits;
//! callers plug in whatever backs them (an indexer, an RPC client, a file).

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::aggregator::SafeKeyShare;
use crate::error::{Result, StealthError};
use crate::keys::{Address, RegisteredKeys, SafeAddress};

/// Resolves Safe ownership
pub trait SafeOwnerResolver {
    /// Owners of `safe` in the Safe's canonical order; `SafeNotFound` if unknown
    fn owners_of(&self, safe: &SafeAddress) -> impl Future<Output = Result<Vec<Address>>> + Send;

    /// Safes that list `owner` among their owners
    fn safes_of(&self, owner: &Address) -> impl Future<Output = Result<Vec<SafeAddress>>> + Send;
}

/// Resolves an address to its published stealth public keys
pub trait StealthKeyLookup {
    /// `NotRegistered` if the address never published keys
    fn get(&self, address: &Address) -> impl Future<Output = Result<RegisteredKeys>> + Send;
}

/// Receives assembled key shares for persistence or broadcast
pub trait KeySharePublisher {
    fn publish(&self, share: &SafeKeyShare) -> impl Future<Output = Result<()>> + Send;
}

impl<T: SafeOwnerResolver + Sync> SafeOwnerResolver for &T {
    fn owners_of(&self, safe: &SafeAddress) -> impl Future<Output = Result<Vec<Address>>> + Send {
        (**self).owners_of(safe)
    }

    fn safes_of(&self, owner: &Address) -> impl Future<Output = Result<Vec<SafeAddress>>> + Send {
        (**self).safes_of(owner)
    }
}

impl<T: StealthKeyLookup + Sync> StealthKeyLookup for &T {
    fn get(&self, address: &Address) -> impl Future<Output = Result<RegisteredKeys>> + Send {
        (**self).get(address)
    }
}

// ============================================================================
// In-memory registry
// ============================================================================

/// Thread-safe in-memory Safe ownership and stealth key registry
///
/// Locks are only held while cloning data out, never across an await.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    safes: RwLock<BTreeMap<SafeAddress, Vec<Address>>>,
    keys: RwLock<BTreeMap<Address, RegisteredKeys>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the owner list of a Safe
    pub fn add_safe(&self, safe: SafeAddress, owners: Vec<Address>) {
        debug!(%safe, owners = owners.len(), "recording safe owners");
        self.safes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(safe, owners);
    }

    /// Publish stealth keys for an address, replacing any previous keys
    pub fn register(&self, address: Address, keys: RegisteredKeys) {
        debug!(%address, "registering stealth keys");
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address, keys);
    }

    /// Remove an address's stealth keys, returning them if present
    pub fn unregister(&self, address: &Address) -> Option<RegisteredKeys> {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(address)
    }

    /// Snapshot of every Safe and its owners
    pub fn safes(&self) -> BTreeMap<SafeAddress, Vec<Address>> {
        self.safes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of every registered address and its keys
    pub fn registered_keys(&self) -> BTreeMap<Address, RegisteredKeys> {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SafeOwnerResolver for InMemoryRegistry {
    async fn owners_of(&self, safe: &SafeAddress) -> Result<Vec<Address>> {
        let owners = self
            .safes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(safe)
            .cloned();
        owners.ok_or(StealthError::SafeNotFound(*safe))
    }

    async fn safes_of(&self, owner: &Address) -> Result<Vec<SafeAddress>> {
        let safes: Vec<SafeAddress> = self
            .safes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, owners)| owners.contains(owner))
            .map(|(safe, _)| *safe)
            .collect();
        Ok(safes)
    }
}

impl StealthKeyLookup for InMemoryRegistry {
    async fn get(&self, address: &Address) -> Result<RegisteredKeys> {
        let keys = self
            .keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned();
        keys.ok_or(StealthError::NotRegistered(*address))
    }
}
