//! Cloud record format and the replica adapter.

use super::PROFILE_RECORD_TYPE;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use spellbee_replica::ReplicatedProfile;
use spellbee_types::{DeviceId, ProfileRecord, Timestamp};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Field names of a profile record.
pub mod fields {
    pub const NAME: &str = "name";
    pub const GRADE: &str = "grade";
    pub const LAST_MODIFIED: &str = "lastModified";
    pub const DEVICE_IDENTIFIER: &str = "deviceIdentifier";
    pub const SCHEMA_VERSION: &str = "schemaVersion";
    pub const COMPLETED_LEVELS_BY_GRADE: &str = "completedLevelsByGrade";
    pub const CURRENT_LEVEL_BY_GRADE: &str = "currentLevelByGrade";
}

/// Opaque identifier of a cloud record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string().to_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    String(String),
    Int64(i64),
    Date(DateTime<Utc>),
    Bytes(Vec<u8>),
}

/// A structured record in the cloud store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudRecord {
    pub record_type: String,
    pub record_id: RecordId,
    pub fields: BTreeMap<String, FieldValue>,
}

impl CloudRecord {
    pub fn new(record_type: impl Into<String>, record_id: RecordId) -> Self {
        Self {
            record_type: record_type.into(),
            record_id,
            fields: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: FieldValue) {
        self.fields.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    fn string(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    fn int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            FieldValue::Int64(n) => Some(*n),
            _ => None,
        }
    }

    fn date(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.get(key)? {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.get(key)? {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// Converts replicas to and from cloud records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReplicaAdapter {
    record_type: String,
}

impl Default for RemoteReplicaAdapter {
    fn default() -> Self {
        Self::new(PROFILE_RECORD_TYPE)
    }
}

impl RemoteReplicaAdapter {
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
        }
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// Builds a record; a fresh id is generated when none is given.
    ///
    /// Scalars map to typed fields, the two per-grade maps to JSON blobs.
    pub fn to_record(&self, profile: &ReplicatedProfile, id: Option<RecordId>) -> CloudRecord {
        let record = profile.record();
        let mut cloud = CloudRecord::new(&self.record_type, id.unwrap_or_else(RecordId::generate));

        cloud.set(fields::NAME, FieldValue::String(record.name().to_string()));
        cloud.set(fields::GRADE, FieldValue::Int64(i64::from(record.grade())));
        cloud.set(
            fields::LAST_MODIFIED,
            FieldValue::Date(timestamp_to_date(profile.last_modified())),
        );
        cloud.set(
            fields::DEVICE_IDENTIFIER,
            FieldValue::String(profile.device_identifier().to_string()),
        );
        cloud.set(
            fields::SCHEMA_VERSION,
            FieldValue::Int64(i64::from(profile.schema_version())),
        );
        match serde_json::to_vec(record.completed_levels_by_grade()) {
            Ok(blob) => cloud.set(fields::COMPLETED_LEVELS_BY_GRADE, FieldValue::Bytes(blob)),
            Err(e) => warn!("Failed to encode completed levels for cloud: {}", e),
        }
        match serde_json::to_vec(record.current_level_by_grade()) {
            Ok(blob) => cloud.set(fields::CURRENT_LEVEL_BY_GRADE, FieldValue::Bytes(blob)),
            Err(e) => warn!("Failed to encode current levels for cloud: {}", e),
        }
        cloud
    }

    /// Decodes a record.
    ///
    /// A missing or mistyped scalar fails the decode. A missing or malformed
    /// blob decodes as an empty map. The result is normalized.
    pub fn from_record(&self, cloud: &CloudRecord) -> Option<ReplicatedProfile> {
        if cloud.record_type != self.record_type {
            return None;
        }
        let name = cloud.string(fields::NAME)?;
        let grade = cloud.int(fields::GRADE)?;
        let last_modified = date_to_timestamp(cloud.date(fields::LAST_MODIFIED)?)?;
        let device = cloud.string(fields::DEVICE_IDENTIFIER)?;
        let schema_version = u32::try_from(cloud.int(fields::SCHEMA_VERSION)?).ok()?;

        let record = ProfileRecord::from_parts(
            name,
            grade,
            blob_or_default(cloud.bytes(fields::COMPLETED_LEVELS_BY_GRADE)),
            blob_or_default(cloud.bytes(fields::CURRENT_LEVEL_BY_GRADE)),
        );
        Some(ReplicatedProfile::with_timestamp(
            record,
            last_modified,
            DeviceId::new(device),
            schema_version,
        ))
    }
}

fn blob_or_default<T: DeserializeOwned + Default>(blob: Option<&[u8]>) -> T {
    blob.and_then(|bytes| serde_json::from_slice(bytes).ok())
        .unwrap_or_default()
}

fn timestamp_to_date(ts: Timestamp) -> DateTime<Utc> {
    i64::try_from(ts.as_millis())
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}

fn date_to_timestamp(date: DateTime<Utc>) -> Option<Timestamp> {
    u64::try_from(date.timestamp_millis()).ok().map(Timestamp::from_millis)
}
