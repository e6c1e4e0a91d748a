//! Reconciliation of the local replica with the cloud copy.

use super::record::{RecordId, RemoteReplicaAdapter};
use super::store::CloudStore;
use crate::error::{SyncError, SyncResult};
use spellbee_replica::{ReplicatedProfile, merge};
use spellbee_storage::LocalStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a reconciliation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The local copy won, or the cloud had none, and was uploaded.
    Uploaded,
    /// The cloud copy won and replaced the local one.
    Downloaded,
    /// Both copies were identical.
    InSync,
    /// Neither side has a profile.
    NothingToSync,
}

/// Merges the local replica with the cloud copy.
pub struct CloudReconciler {
    store: LocalStore,
    cloud: Arc<dyn CloudStore>,
    adapter: RemoteReplicaAdapter,
}

impl CloudReconciler {
    pub fn new(store: LocalStore, cloud: Arc<dyn CloudStore>) -> Self {
        Self::with_adapter(store, cloud, RemoteReplicaAdapter::default())
    }

    pub fn with_adapter(
        store: LocalStore,
        cloud: Arc<dyn CloudStore>,
        adapter: RemoteReplicaAdapter,
    ) -> Self {
        Self {
            store,
            cloud,
            adapter,
        }
    }

    /// Runs one reconciliation round.
    ///
    /// The local replica stays usable on every error.
    pub async fn reconcile(&self) -> SyncResult<ReconcileOutcome> {
        if !self.cloud.is_available().await {
            return Err(SyncError::NetworkUnavailable);
        }

        let local = self.store.load()?;
        let record_id = self.store.remote_record_id()?.map(RecordId::new);
        let remote = match &record_id {
            Some(id) => self.fetch_remote(id).await?,
            None => None,
        };

        let outcome = match (local, remote) {
            (None, None) => ReconcileOutcome::NothingToSync,
            (Some(local), None) => {
                self.upload(&local, record_id).await?;
                ReconcileOutcome::Uploaded
            }
            (None, Some(remote)) => {
                self.store.save(&remote)?;
                ReconcileOutcome::Downloaded
            }
            (Some(local), Some(remote)) => {
                if local == remote {
                    ReconcileOutcome::InSync
                } else if merge(&local, &remote) == local {
                    self.upload(&local, record_id).await?;
                    ReconcileOutcome::Uploaded
                } else {
                    self.store.save(&remote)?;
                    ReconcileOutcome::Downloaded
                }
            }
        };

        info!("Cloud reconciliation via {}: {:?}", self.cloud.provider_name(), outcome);
        Ok(outcome)
    }

    /// `None` for a missing or undecodable record.
    async fn fetch_remote(&self, id: &RecordId) -> SyncResult<Option<ReplicatedProfile>> {
        let record = match self.cloud.fetch(id).await {
            Ok(record) => record,
            Err(SyncError::RecordNotFound(_)) => {
                warn!("Cloud record {} no longer exists, will recreate", id);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let profile = self.adapter.from_record(&record);
        if profile.is_none() {
            warn!("Cloud record {} is not a readable profile, overwriting", id);
        }
        Ok(profile)
    }

    async fn upload(&self, profile: &ReplicatedProfile, id: Option<RecordId>) -> SyncResult<()> {
        let record = self.adapter.to_record(profile, id);
        self.cloud.save(&record).await?;
        self.store.set_remote_record_id(Some(record.record_id.as_str()))?;
        debug!("Uploaded profile to cloud record {}", record.record_id);
        Ok(())
    }
}
