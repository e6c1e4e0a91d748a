use pretty_assertions::assert_eq;
use spellbee_replica::{CURRENT_SCHEMA_VERSION, ReplicatedProfile, merge};
use spellbee_types::{DeviceId, ProfileRecord, Timestamp};

fn replica(name: &str, millis: u64, device: &str) -> ReplicatedProfile {
    ReplicatedProfile::with_timestamp(
        ProfileRecord::new(name, 2),
        Timestamp::from_millis(millis),
        DeviceId::new(device),
        CURRENT_SCHEMA_VERSION,
    )
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn new_uses_current_schema_and_now() {
    let before = Timestamp::now();
    let p = ReplicatedProfile::new(ProfileRecord::new("Ada", 1), DeviceId::new("phone"));
    assert!(p.last_modified() >= before);
    assert_eq!(p.schema_version(), CURRENT_SCHEMA_VERSION);
    assert_eq!(p.device_identifier().as_str(), "phone");
}

#[test]
fn update_record_advances_timestamp() {
    let mut p = replica("Ada", 1_000, "phone");
    let before = p.last_modified();
    let mut record = p.record().clone();
    record.complete_level(1);
    p.update_record(record.clone());
    assert!(p.last_modified() > before);
    assert_eq!(p.record(), &record);
    assert_eq!(p.device_identifier().as_str(), "phone");
}

#[test]
fn update_record_from_future_stamp_still_advances() {
    let mut p = replica("Ada", u64::MAX / 2, "phone");
    p.update_record(ProfileRecord::new("Ada", 3));
    assert_eq!(p.last_modified().as_millis(), u64::MAX / 2 + 1);
}

#[test]
fn schema_version_gates() {
    let record = ProfileRecord::new("Ada", 1);
    let device = DeviceId::new("d");
    let old = ReplicatedProfile::with_timestamp(record.clone(), Timestamp::from_millis(1), device.clone(), 0);
    let new = ReplicatedProfile::with_timestamp(record, Timestamp::from_millis(1), device, 2);
    assert!(old.needs_migration());
    assert!(!old.is_from_newer_schema());
    assert!(new.is_from_newer_schema());
    assert!(!replica("Ada", 1, "d").needs_migration());
}

// ── Last-writer-wins ─────────────────────────────────────────────

#[test]
fn later_timestamp_wins_either_order() {
    let older = replica("Old", 100, "watch");
    let newer = replica("New", 200, "phone");
    assert_eq!(merge(&older, &newer), newer);
    assert_eq!(merge(&newer, &older), newer);
}

#[test]
fn loser_progress_is_discarded() {
    let mut local = ProfileRecord::new("Ada", 1);
    local.complete_level(1);
    local.complete_level(2);
    let a = ReplicatedProfile::with_timestamp(local, Timestamp::from_millis(500), DeviceId::new("watch"), 1);

    let b = replica("Ada", 600, "phone");
    let merged = merge(&a, &b);

    assert!(merged.record().completed_levels(1).is_empty());
    assert_eq!(merged.record().current_level(1), 1);
}

#[test]
fn merge_with_self_is_identity() {
    let a = replica("Ada", 42, "watch");
    assert_eq!(merge(&a, &a), a);
}

#[test]
fn tie_is_resolved_by_content_not_device() {
    let a = replica("Alpha", 100, "zzz-device");
    let b = replica("Beta", 100, "aaa-device");
    let ab = merge(&a, &b);
    let ba = merge(&b, &a);
    assert_eq!(ab, ba);
    assert_eq!(ab.record().name(), "Beta");
}

#[test]
fn tie_with_identical_content_keeps_first_argument() {
    let a = replica("Same", 100, "watch");
    let b = replica("Same", 100, "phone");
    assert_eq!(merge(&a, &b).device_identifier().as_str(), "watch");
    assert_eq!(merge(&b, &a).device_identifier().as_str(), "phone");
}

#[test]
fn wins_over_is_strict() {
    let a = replica("Same", 100, "watch");
    let b = replica("Same", 100, "phone");
    assert!(!a.wins_over(&b));
    assert!(!b.wins_over(&a));
    assert!(replica("Same", 101, "x").wins_over(&a));
}

#[test]
fn three_way_merge_picks_latest() {
    let a = replica("A", 10, "a");
    let b = replica("B", 30, "b");
    let c = replica("C", 20, "c");
    assert_eq!(merge(&merge(&a, &b), &c), b);
    assert_eq!(merge(&a, &merge(&b, &c)), b);
}
