use pretty_assertions::assert_eq;
use spellbee_replica::{ReplicatedProfile, encode};
use spellbee_storage::{
    KeyValueStore, LocalStore, MemoryKeyValueStore, SqliteKeyValueStore, StoreConfig, keys,
};
use spellbee_types::{DeviceId, ProfileRecord, Timestamp};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;

fn memory_store() -> (Arc<MemoryKeyValueStore>, LocalStore) {
    let kv = Arc::new(MemoryKeyValueStore::new());
    let store = LocalStore::new(kv.clone(), DeviceId::new("watch"));
    (kv, store)
}

fn sample_profile(millis: u64) -> ReplicatedProfile {
    let mut record = ProfileRecord::new("Ada", 2);
    record.complete_level(1);
    ReplicatedProfile::with_timestamp(record, Timestamp::from_millis(millis), DeviceId::new("phone"), 1)
}

const LEGACY_JSON: &[u8] =
    br#"{"name":"Sam","grade":3,"completedLevels":[1,2],"currentLevel":3}"#;

// ── Save / load ──────────────────────────────────────────────────

#[test]
fn load_empty_is_none() {
    let (_, store) = memory_store();
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn save_then_load_roundtrip() {
    let (_, store) = memory_store();
    let profile = sample_profile(1_000);
    store.save(&profile).unwrap();
    assert_eq!(store.load().unwrap(), Some(profile));
}

#[test]
fn save_overwrites() {
    let (_, store) = memory_store();
    store.save(&sample_profile(1)).unwrap();
    store.save(&sample_profile(2)).unwrap();
    assert_eq!(store.load().unwrap().unwrap().last_modified(), Timestamp::from_millis(2));
}

#[test]
fn corrupt_profile_reads_as_none_without_migration() {
    let (kv, store) = memory_store();
    kv.set(keys::PROFILE, b"garbage").unwrap();
    kv.set(keys::LEGACY_PHONE, LEGACY_JSON).unwrap();

    assert_eq!(store.load().unwrap(), None);
    assert!(kv.get(keys::LEGACY_PHONE).unwrap().is_some());
}

#[test]
fn sqlite_backed_store_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("phone.db");
    let profile = sample_profile(5);

    {
        let kv = Arc::new(SqliteKeyValueStore::open(&path).unwrap());
        let store = LocalStore::new(kv, DeviceId::new("phone"));
        store.save(&profile).unwrap();
        store.mark_pending_sync().unwrap();
    }

    let kv = Arc::new(SqliteKeyValueStore::open(&path).unwrap());
    let store = LocalStore::new(kv, DeviceId::new("phone"));
    assert_eq!(store.load().unwrap(), Some(profile));
    assert!(store.has_pending_sync().unwrap());
}

// ── save_record ──────────────────────────────────────────────────

#[test]
fn save_record_creates_replica_and_marks_pending() {
    let (_, store) = memory_store();
    let replica = store.save_record(ProfileRecord::new("Ada", 1)).unwrap();

    assert_eq!(replica.device_identifier().as_str(), "watch");
    assert!(store.has_pending_sync().unwrap());
    assert_eq!(store.load_record().unwrap().unwrap().name(), "Ada");
}

#[test]
fn save_record_updates_existing_timestamp() {
    let (_, store) = memory_store();
    store.save(&sample_profile(10)).unwrap();

    let mut record = store.load_record().unwrap().unwrap();
    record.complete_level(2);
    let updated = store.save_record(record).unwrap();

    assert!(updated.last_modified() > Timestamp::from_millis(10));
    assert_eq!(updated.device_identifier().as_str(), "phone");
    assert!(store.load_record().unwrap().unwrap().is_level_completed(2));
}

// ── Pending sync ─────────────────────────────────────────────────

#[test]
fn pending_flag_defaults_false() {
    let (_, store) = memory_store();
    assert!(!store.has_pending_sync().unwrap());
    assert_eq!(store.last_sync().unwrap(), None);
}

#[test]
fn clear_pending_stamps_last_sync() {
    let (_, store) = memory_store();
    store.mark_pending_sync().unwrap();
    assert!(store.has_pending_sync().unwrap());

    let before = Timestamp::now();
    store.clear_pending_sync().unwrap();

    assert!(!store.has_pending_sync().unwrap());
    assert!(store.last_sync().unwrap().unwrap() >= before);
}

// ── Remote record id ─────────────────────────────────────────────

#[test]
fn remote_record_id_roundtrip() {
    let (_, store) = memory_store();
    assert_eq!(store.remote_record_id().unwrap(), None);
    store.set_remote_record_id(Some("rec-1")).unwrap();
    assert_eq!(store.remote_record_id().unwrap().as_deref(), Some("rec-1"));
    store.set_remote_record_id(None).unwrap();
    assert_eq!(store.remote_record_id().unwrap(), None);
}

// ── Migration ────────────────────────────────────────────────────

#[test]
fn migrates_single_grade_legacy_profile() {
    let (kv, store) = memory_store();
    kv.set(keys::LEGACY_WATCH, LEGACY_JSON).unwrap();

    let before = Timestamp::now();
    let migrated = store.load().unwrap().expect("legacy profile migrated");

    let record = migrated.record();
    assert_eq!(record.grade(), 3);
    assert_eq!(record.completed_levels(3), [1, 2].into_iter().collect::<BTreeSet<u16>>());
    assert_eq!(record.current_level(3), 3);
    for grade in [1, 2, 4, 5, 6, 7] {
        assert!(record.completed_levels(grade).is_empty());
        assert_eq!(record.current_level(grade), 1);
    }

    assert!(migrated.last_modified() >= before);
    assert_eq!(migrated.device_identifier().as_str(), "watch");
    assert_eq!(kv.get(keys::LEGACY_WATCH).unwrap(), None);
    assert!(kv.get(keys::PROFILE).unwrap().is_some());
    assert!(store.has_pending_sync().unwrap());
}

#[test]
fn migration_happens_once() {
    let (kv, store) = memory_store();
    kv.set(keys::LEGACY_PHONE, LEGACY_JSON).unwrap();

    let first = store.load().unwrap().unwrap();
    let second = store.load().unwrap().unwrap();
    assert_eq!(first, second);
}

#[test]
fn phone_key_takes_priority_over_watch_key() {
    let (kv, store) = memory_store();
    kv.set(keys::LEGACY_PHONE, br#"{"name":"Phone","grade":1,"completedLevels":[],"currentLevel":1}"#)
        .unwrap();
    kv.set(keys::LEGACY_WATCH, br#"{"name":"Watch","grade":2,"completedLevels":[],"currentLevel":1}"#)
        .unwrap();

    let migrated = store.load().unwrap().unwrap();

    assert_eq!(migrated.record().name(), "Phone");
    assert_eq!(kv.get(keys::LEGACY_PHONE).unwrap(), None);
    assert!(kv.get(keys::LEGACY_WATCH).unwrap().is_some());
}

#[test]
fn unreadable_legacy_entry_falls_through_to_next_key() {
    let (kv, store) = memory_store();
    kv.set(keys::LEGACY_PHONE, b"{broken").unwrap();
    kv.set(keys::LEGACY_WATCH, LEGACY_JSON).unwrap();

    let migrated = store.load().unwrap().unwrap();
    assert_eq!(migrated.record().name(), "Sam");
}

#[test]
fn migrates_per_grade_legacy_record() {
    let (kv, store) = memory_store();
    kv.set(
        keys::LEGACY_PHONE,
        br#"{"name":"Kim","grade":4,"completedLevelsByGrade":{"4":[1]},"currentLevelByGrade":{"4":2}}"#,
    )
    .unwrap();

    let migrated = store.load().unwrap().unwrap();
    assert_eq!(migrated.record().current_level(4), 2);
    assert_eq!(migrated.record().current_level(1), 1);
}

#[test]
fn custom_legacy_keys() {
    let kv = Arc::new(MemoryKeyValueStore::new());
    let config = StoreConfig {
        legacy_keys: vec!["old_profile".into()],
    };
    let store = LocalStore::with_config(kv.clone(), DeviceId::new("d"), config);
    kv.set(keys::LEGACY_PHONE, LEGACY_JSON).unwrap();
    assert_eq!(store.load().unwrap(), None);

    kv.set("old_profile", LEGACY_JSON).unwrap();
    assert!(store.load().unwrap().is_some());
}

// ── Reset ────────────────────────────────────────────────────────

#[test]
fn reset_clears_everything() {
    let (kv, store) = memory_store();
    store.save(&sample_profile(3)).unwrap();
    store.mark_pending_sync().unwrap();
    store.clear_pending_sync().unwrap();
    store.set_remote_record_id(Some("rec")).unwrap();

    store.reset().unwrap();

    assert_eq!(store.load().unwrap(), None);
    assert!(!store.has_pending_sync().unwrap());
    assert_eq!(store.last_sync().unwrap(), None);
    assert_eq!(store.remote_record_id().unwrap(), None);
    assert!(kv.is_empty().unwrap());
}

#[test]
fn reset_does_not_trigger_spurious_migration() {
    let (kv, store) = memory_store();
    kv.set(keys::LEGACY_WATCH, LEGACY_JSON).unwrap();
    assert!(store.load().unwrap().is_some());

    store.reset().unwrap();

    assert_eq!(store.load().unwrap(), None);
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn stored_bytes_are_the_replica_codec() {
    let (kv, store) = memory_store();
    let profile = sample_profile(9);
    store.save(&profile).unwrap();
    assert_eq!(kv.get(keys::PROFILE).unwrap(), Some(encode(&profile).unwrap()));
}
