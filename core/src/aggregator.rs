//! Multi-owner key aggregation
//!
//! Collects every Safe owner's registered stealth keys, then encrypts one
//! shared viewing key once per owner so each can recover it with their own
//! viewing key.
//!
//! Aggregation is fail-closed: if any owner has no registered keys the whole
//! call fails and no partial owner list is returned.
//!
//! States per call:
//! - Start: resolve owners (empty list -> `NoOwners`)
//! - PerOwnerLookup: concurrent lookups, first failure in owner order wins
//! - Complete: `SafeOwnerKeys` in the resolver's order
//!
//! Only a `SafeOwnerKeys` (Complete) can be handed to `encrypt_for`.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::crypto::{address::derive_address, ecies};
use crate::error::{Result, StealthError};
use crate::keys::{
    Address, EncryptedKeyRecord, OwnerStealthKeys, PrivateScalar, PublicPoint, SafeAddress,
    StealthAddress, StealthKeyPair,
};
use crate::registry::{KeySharePublisher, SafeOwnerResolver, StealthKeyLookup};

/// Default per-owner lookup timeout
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of lookups in flight at once
pub const DEFAULT_MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Aggregator tuning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Upper bound for a single owner's key lookup
    pub lookup_timeout: Duration,
    /// Maximum concurrent lookups (at least 1)
    pub max_concurrent_lookups: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            max_concurrent_lookups: DEFAULT_MAX_CONCURRENT_LOOKUPS,
        }
    }
}

/// Every owner of a Safe with registered stealth keys, in canonical owner order
///
/// Only produced by a successful [`MultiOwnerKeyAggregator::aggregate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SafeOwnerKeys {
    safe: SafeAddress,
    owners: Vec<OwnerStealthKeys>,
}

impl SafeOwnerKeys {
    pub fn safe(&self) -> &SafeAddress {
        &self.safe
    }

}

impl Deref for SafeOwnerKeys {
    type Target = [OwnerStealthKeys];

    fn deref(&self) -> &Self::Target {
        &self.owners
    }
}

/// A Safe's shared stealth keys, ready to hand to a publisher
///
/// Holds only public keys and per-owner ciphertexts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeKeyShare {
    pub safe: SafeAddress,
    pub viewing_public_key: PublicPoint,
    pub spending_public_key: PublicPoint,
    /// Address derived from the shared viewing public key
    pub stealth_address: StealthAddress,
    /// One record per owner, in owner order
    pub records: Vec<EncryptedKeyRecord>,
    pub created_at: DateTime<Utc>,
}

impl SafeKeyShare {
    pub fn record_for(&self, owner: &Address) -> Option<&EncryptedKeyRecord> {
        self.records.iter().find(|record| record.recipient() == owner)
    }

    /// Decrypt the shared viewing key with an owner's own viewing key
    ///
    /// The recovered key is checked against the published viewing public key.
    pub fn recover_viewing_key(
        &self,
        owner: &Address,
        owner_viewing_key: &PrivateScalar,
    ) -> Result<PrivateScalar> {
        let record = self
            .record_for(owner)
            .ok_or(StealthError::RecordNotFound(*owner))?;
        let shared = ecies::decrypt_record(record, owner_viewing_key)?;
        if shared.public_point() != self.viewing_public_key {
            return Err(StealthError::AuthenticationFailed);
        }
        Ok(shared)
    }
}

/// Drives owner resolution and key lookups for one Safe at a time
pub struct MultiOwnerKeyAggregator<R, L> {
    resolver: R,
    lookup: L,
    config: AggregatorConfig,
}

impl<R, L> MultiOwnerKeyAggregator<R, L>
where
    R: SafeOwnerResolver,
    L: StealthKeyLookup,
{
    pub fn new(resolver: R, lookup: L) -> Self {
        Self::with_config(resolver, lookup, AggregatorConfig::default())
    }

    pub fn with_config(resolver: R, lookup: L, config: AggregatorConfig) -> Self {
        Self {
            resolver,
            lookup,
            config,
        }
    }

    /// Collect every owner's stealth keys for `safe`, or the first failure
    pub async fn aggregate(&self, safe: &SafeAddress) -> Result<SafeOwnerKeys> {
        let owners = self.resolver.owners_of(safe).await?;
        if owners.is_empty() {
            warn!(%safe, "safe resolved with an empty owner list");
            return Err(StealthError::NoOwners(*safe));
        }
        debug!(%safe, owners = owners.len(), "looking up owner stealth keys");

        let limit = self.config.max_concurrent_lookups.max(1);
        // Lowest failed index so far; owners after it are never looked up
        let first_failure = AtomicUsize::new(usize::MAX);
        let first_failure = &first_failure;
        let mut lookups = stream::iter(owners.iter().copied().enumerate())
            .map(|(index, owner)| async move {
                if index > first_failure.load(Ordering::Acquire) {
                    return (index, None);
                }
                (index, Some(self.lookup_owner(owner).await))
            })
            .buffer_unordered(limit);

        let mut slots: Vec<Option<OwnerStealthKeys>> = vec![None; owners.len()];
        let mut failure: Option<(usize, StealthError)> = None;

        while let Some((index, outcome)) = lookups.next().await {
            // Results for owners after a known failure can no longer matter
            if matches!(&failure, Some((failed, _)) if index > *failed) {
                debug!(owner = %owners[index], "discarding lookup result after failure");
                continue;
            }

            match outcome {
                Some(Ok(keys)) => slots[index] = Some(keys),
                Some(Err(err)) => {
                    debug!(owner = %owners[index], error = %err, "owner lookup failed");
                    first_failure.fetch_min(index, Ordering::AcqRel);
                    failure = Some((index, err));
                }
                // Skipped only after an earlier failure, already handled above
                None => continue,
            }

            // Done once every owner ahead of the failure has resolved
            if let Some((failed, _)) = &failure {
                if slots[..*failed].iter().all(Option::is_some) {
                    break;
                }
            }
        }
        // Dropping the stream cancels lookups still in flight
        drop(lookups);

        if let Some((_, err)) = failure {
            warn!(%safe, error = %err, "stealth key aggregation failed");
            return Err(err);
        }

        let collected = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| StealthError::Registry("lookup stream ended early".to_string()))?;

        info!(%safe, owners = collected.len(), "collected stealth keys for every owner");
        Ok(SafeOwnerKeys {
            safe: *safe,
            owners: collected,
        })
    }

    /// Aggregate, then encrypt the Safe's viewing key for every owner
    pub async fn share(
        &self,
        safe: &SafeAddress,
        safe_keys: &StealthKeyPair,
    ) -> Result<SafeKeyShare> {
        let owners = self.aggregate(safe).await?;
        let records = encrypt_for(safe_keys.viewing_key(), &owners)?;

        info!(%safe, records = records.len(), "assembled safe key share");
        Ok(SafeKeyShare {
            safe: *safe,
            viewing_public_key: safe_keys.viewing_public_key.clone(),
            spending_public_key: safe_keys.spending_public_key.clone(),
            stealth_address: derive_address(&safe_keys.viewing_public_key),
            records,
            created_at: Utc::now(),
        })
    }

    async fn lookup_owner(&self, owner: Address) -> Result<OwnerStealthKeys> {
        let timeout = self.config.lookup_timeout;
        match tokio::time::timeout(timeout, self.lookup.get(&owner)).await {
            Ok(Ok(keys)) => Ok(OwnerStealthKeys::new(owner, keys)),
            Ok(Err(StealthError::NotRegistered(_))) => Err(StealthError::UnregisteredOwner(owner)),
            Ok(Err(err)) => Err(StealthError::LookupFailed {
                owner,
                reason: err.to_string(),
            }),
            Err(_) => Err(StealthError::LookupFailed {
                owner,
                reason: format!("timed out after {:?}", timeout),
            }),
        }
    }
}

/// Encrypt `shared_viewing_key` under every owner's viewing public key
///
/// One record per owner, in owner order.
pub fn encrypt_for(
    shared_viewing_key: &PrivateScalar,
    owners: &SafeOwnerKeys,
) -> Result<Vec<EncryptedKeyRecord>> {
    owners
        .iter()
        .map(|owner| {
            ecies::encrypt_record(shared_viewing_key, *owner.owner(), owner.viewing_public_key())
        })
        .collect()
}

/// Hand a share to its publishing sink
pub async fn publish<P: KeySharePublisher>(share: &SafeKeyShare, publisher: &P) -> Result<()> {
    publisher.publish(share).await?;
    info!(safe = %share.safe, records = share.records.len(), "published safe key share");
    Ok(())
}

/// Find `owner`'s record and decrypt it with their viewing key
pub fn recover_shared_key(
    records: &[EncryptedKeyRecord],
    owner: &Address,
    owner_viewing_key: &PrivateScalar,
) -> Result<PrivateScalar> {
    let record = records
        .iter()
        .find(|record| record.recipient() == owner)
        .ok_or(StealthError::RecordNotFound(*owner))?;
    ecies::decrypt_record(record, owner_viewing_key)
}
