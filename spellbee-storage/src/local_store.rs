//! The device's single profile replica and its sync bookkeeping.

use crate::config::{StoreConfig, keys};
use crate::error::StorageResult;
use crate::kv::{KeyValueStore, WriteOp};
use spellbee_replica::{ReplicatedProfile, decode, encode};
use spellbee_types::{DeviceId, ProfileRecord, StoredProfile, Timestamp};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Durable single-replica store for one device.
///
/// Cloning is cheap and every clone talks to the same backend.
#[derive(Clone)]
pub struct LocalStore {
    kv: Arc<dyn KeyValueStore>,
    device: DeviceId,
    config: StoreConfig,
}

impl LocalStore {
    /// Creates a store with the default legacy-key configuration.
    pub fn new(kv: Arc<dyn KeyValueStore>, device: DeviceId) -> Self {
        Self::with_config(kv, device, StoreConfig::default())
    }

    pub fn with_config(kv: Arc<dyn KeyValueStore>, device: DeviceId, config: StoreConfig) -> Self {
        Self { kv, device, config }
    }

    /// The device this store writes replicas as.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ── Replica ──────────────────────────────────────────────────

    /// Overwrites the stored replica.
    pub fn save(&self, profile: &ReplicatedProfile) -> StorageResult<()> {
        let bytes = encode(profile)?;
        self.kv.set(keys::PROFILE, &bytes)?;
        debug!(
            "Saved profile replica (lastModified={}, device={})",
            profile.last_modified(),
            profile.device_identifier()
        );
        Ok(())
    }

    /// Returns the stored replica, migrating a legacy profile if there is none.
    ///
    /// Bytes under the current key that fail to decode are reported as no
    /// data, and migration is not attempted for them.
    pub fn load(&self) -> StorageResult<Option<ReplicatedProfile>> {
        match self.kv.get(keys::PROFILE)? {
            Some(bytes) => match decode(&bytes) {
                Ok(profile) => Ok(Some(profile)),
                Err(e) => {
                    warn!("Stored profile replica is unreadable, treating as empty: {}", e);
                    Ok(None)
                }
            },
            None => self.migrate_from_legacy(),
        }
    }

    /// Replaces the record of the stored replica and marks it pending.
    ///
    /// Creates the replica if none exists yet (end of onboarding).
    pub fn save_record(&self, record: ProfileRecord) -> StorageResult<ReplicatedProfile> {
        let profile = match self.load()? {
            Some(mut existing) => {
                existing.update_record(record);
                existing
            }
            None => ReplicatedProfile::new(record, self.device.clone()),
        };
        self.kv.apply(&[
            WriteOp::put(keys::PROFILE, encode(&profile)?),
            WriteOp::put(keys::PENDING_SYNC, serde_json::to_vec(&true)?),
        ])?;
        Ok(profile)
    }

    /// The record of the stored replica, if any.
    pub fn load_record(&self) -> StorageResult<Option<ProfileRecord>> {
        Ok(self.load()?.map(ReplicatedProfile::into_record))
    }

    // ── Pending sync ─────────────────────────────────────────────

    pub fn mark_pending_sync(&self) -> StorageResult<()> {
        self.kv.set(keys::PENDING_SYNC, &serde_json::to_vec(&true)?)
    }

    /// Clears the pending flag and stamps the last-sync time as now.
    pub fn clear_pending_sync(&self) -> StorageResult<()> {
        self.kv.apply(&[
            WriteOp::put(keys::PENDING_SYNC, serde_json::to_vec(&false)?),
            WriteOp::put(keys::LAST_SYNC, serde_json::to_vec(&Timestamp::now())?),
        ])
    }

    pub fn has_pending_sync(&self) -> StorageResult<bool> {
        Ok(self.read_value::<bool>(keys::PENDING_SYNC)?.unwrap_or(false))
    }

    pub fn last_sync(&self) -> StorageResult<Option<Timestamp>> {
        self.read_value(keys::LAST_SYNC)
    }

    // ── Remote replica id ────────────────────────────────────────

    /// Remembers (or forgets, with `None`) the cloud record identifier.
    pub fn set_remote_record_id(&self, id: Option<&str>) -> StorageResult<()> {
        match id {
            Some(id) => self.kv.set(keys::REMOTE_RECORD_ID, &serde_json::to_vec(id)?),
            None => self.kv.remove(keys::REMOTE_RECORD_ID),
        }
    }

    pub fn remote_record_id(&self) -> StorageResult<Option<String>> {
        self.read_value(keys::REMOTE_RECORD_ID)
    }

    // ── Reset ────────────────────────────────────────────────────

    /// Deletes the replica and all sync bookkeeping in one atomic batch.
    ///
    /// Nothing is sent to the peer; a peer that still holds the profile will
    /// hand it back on the next pull.
    pub fn reset(&self) -> StorageResult<()> {
        let ops: Vec<WriteOp> = keys::ALL.iter().map(|k| WriteOp::delete(*k)).collect();
        self.kv.apply(&ops)?;
        info!("Local profile store reset");
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────

    fn read_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(bytes) = self.kv.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unreadable value under {}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Upgrades the first decodable legacy profile, in configured order.
    fn migrate_from_legacy(&self) -> StorageResult<Option<ReplicatedProfile>> {
        for key in &self.config.legacy_keys {
            let Some(bytes) = self.kv.get(key)? else {
                continue;
            };
            let stored = match StoredProfile::from_slice(&bytes) {
                Ok(stored) => stored,
                Err(e) => {
                    warn!("Skipping unreadable legacy profile under {}: {}", key, e);
                    continue;
                }
            };

            let profile = ReplicatedProfile::new(stored.into_record(), self.device.clone());
            self.kv.apply(&[
                WriteOp::put(keys::PROFILE, encode(&profile)?),
                WriteOp::delete(key.as_str()),
                WriteOp::put(keys::PENDING_SYNC, serde_json::to_vec(&true)?),
            ])?;
            info!("Migrated legacy profile from {}", key);
            return Ok(Some(profile));
        }
        Ok(None)
    }
}
