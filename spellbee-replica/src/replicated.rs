//! The replicated profile and its merge rule.

use serde::{Deserialize, Serialize};
use spellbee_types::{DeviceId, ProfileRecord, Timestamp};
use std::cmp::Ordering;

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// A profile record plus the metadata needed to reconcile replicas.
///
/// Every mutation goes through [`ReplicatedProfile::update_record`], which
/// stamps a fresh, strictly later `last_modified`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicatedProfile {
    #[serde(rename = "profile")]
    record: ProfileRecord,
    last_modified: Timestamp,
    device_identifier: DeviceId,
    schema_version: u32,
}

impl ReplicatedProfile {
    /// Wraps a record written now by `device`.
    #[must_use]
    pub fn new(record: ProfileRecord, device: DeviceId) -> Self {
        Self {
            record,
            last_modified: Timestamp::now(),
            device_identifier: device,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    /// Creates a replica with explicit metadata (decoding, tests, replay).
    #[must_use]
    pub fn with_timestamp(
        record: ProfileRecord,
        last_modified: Timestamp,
        device: DeviceId,
        schema_version: u32,
    ) -> Self {
        Self {
            record,
            last_modified,
            device_identifier: device,
            schema_version,
        }
    }

    #[must_use]
    pub fn record(&self) -> &ProfileRecord {
        &self.record
    }

    #[must_use]
    pub fn into_record(self) -> ProfileRecord {
        self.record
    }

    #[must_use]
    pub fn last_modified(&self) -> Timestamp {
        self.last_modified
    }

    #[must_use]
    pub fn device_identifier(&self) -> &DeviceId {
        &self.device_identifier
    }

    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Replaces the record and advances `last_modified`.
    ///
    /// The device identifier is left alone: it names the device that created
    /// this replica's lineage on this store.
    pub fn update_record(&mut self, record: ProfileRecord) {
        self.record = record;
        self.last_modified = self.last_modified.tick();
    }

    /// True if written by an older schema than this build understands natively.
    #[must_use]
    pub fn needs_migration(&self) -> bool {
        self.schema_version < CURRENT_SCHEMA_VERSION
    }

    /// True if written by a newer build than this one.
    #[must_use]
    pub fn is_from_newer_schema(&self) -> bool {
        self.schema_version > CURRENT_SCHEMA_VERSION
    }

    /// Whether this replica beats `other` under last-writer-wins.
    #[must_use]
    pub fn wins_over(&self, other: &Self) -> bool {
        self.precedence(other) == Ordering::Greater
    }

    /// Total precedence order used by [`merge`].
    ///
    /// Later timestamp first. Exact ties fall back to the record content and
    /// then the schema version, so both devices pick the same winner. The
    /// device identifier is deliberately absent.
    fn precedence(&self, other: &Self) -> Ordering {
        self.last_modified
            .cmp(&other.last_modified)
            .then_with(|| self.record.cmp(&other.record))
            .then_with(|| self.schema_version.cmp(&other.schema_version))
    }
}

/// Last-writer-wins merge of two replicas of the same profile.
///
/// Returns whichever replica has the strictly later `last_modified`. On an
/// exact tie the replica with the greater record content wins; if the two are
/// identical apart from provenance, `a` is returned.
#[must_use]
pub fn merge(a: &ReplicatedProfile, b: &ReplicatedProfile) -> ReplicatedProfile {
    if b.wins_over(a) { b.clone() } else { a.clone() }
}
