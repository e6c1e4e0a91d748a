use pretty_assertions::assert_eq;
use proptest::prelude::*;
use spellbee_types::{
    LegacyProfile, ProfileRecord, StoredProfile, MAX_GRADE, MAX_LEVEL, MIN_GRADE, grades,
};
use std::collections::{BTreeMap, BTreeSet};

fn set(levels: &[u16]) -> BTreeSet<u16> {
    levels.iter().copied().collect()
}

// ── Grade clamping ───────────────────────────────────────────────

#[test]
fn grade_zero_clamps_to_one() {
    assert_eq!(ProfileRecord::new("Ada", 0).grade(), 1);
}

#[test]
fn grade_ninety_nine_clamps_to_seven() {
    assert_eq!(ProfileRecord::new("Ada", 99).grade(), 7);
}

#[test]
fn negative_grade_clamps_to_one() {
    assert_eq!(ProfileRecord::new("Ada", -5).grade(), 1);
}

#[test]
fn set_grade_clamps() {
    let mut record = ProfileRecord::new("Ada", 3);
    record.set_grade(12);
    assert_eq!(record.grade(), MAX_GRADE);
    record.set_grade(i64::MIN);
    assert_eq!(record.grade(), MIN_GRADE);
    record.set_grade(4);
    assert_eq!(record.grade(), 4);
}

// ── Normalization ────────────────────────────────────────────────

#[test]
fn new_record_has_every_grade() {
    let record = ProfileRecord::new("Ada", 2);
    for grade in grades() {
        assert_eq!(record.completed_levels(grade), BTreeSet::new());
        assert_eq!(record.current_level(grade), 1);
    }
    assert_eq!(record.completed_levels_by_grade().len(), 7);
    assert_eq!(record.current_level_by_grade().len(), 7);
}

#[test]
fn from_parts_drops_out_of_range_entries() {
    let mut completed = BTreeMap::new();
    completed.insert(0, set(&[1]));
    completed.insert(2, set(&[0, 3, 51]));
    completed.insert(9, set(&[4]));
    let mut current = BTreeMap::new();
    current.insert(2, 99);
    current.insert(8, 3);

    let record = ProfileRecord::from_parts("Ada", 2, completed, current);

    assert_eq!(record.completed_levels(2), set(&[3]));
    assert_eq!(record.current_level(2), MAX_LEVEL);
    assert!(!record.completed_levels_by_grade().contains_key(&0));
    assert!(!record.current_level_by_grade().contains_key(&8));
}

// ── Level progress ───────────────────────────────────────────────

#[test]
fn completing_current_level_unlocks_next() {
    let mut record = ProfileRecord::new("Ada", 3);
    assert!(record.complete_level(1));
    assert!(record.is_level_completed(1));
    assert_eq!(record.current_level(3), 2);
    assert!(record.is_level_unlocked(2));
    assert!(!record.is_level_unlocked(3));
}

#[test]
fn completing_an_older_level_does_not_unlock() {
    let mut record = ProfileRecord::new("Ada", 1);
    record.complete_level(1);
    record.complete_level(2);
    record.complete_level(1);
    assert_eq!(record.current_level(1), 3);
}

#[test]
fn completing_last_level_stays_at_max() {
    let mut record = ProfileRecord::new("Ada", 1);
    record.unlock_level(1, MAX_LEVEL);
    record.complete_level(MAX_LEVEL);
    assert_eq!(record.current_level(1), MAX_LEVEL);
    assert!(record.is_level_completed(MAX_LEVEL));
}

#[test]
fn out_of_range_level_is_rejected() {
    let mut record = ProfileRecord::new("Ada", 1);
    let before = record.clone();
    assert!(!record.complete_level(0));
    assert!(!record.complete_level(51));
    assert_eq!(record, before);
}

#[test]
fn progress_is_per_grade() {
    let mut record = ProfileRecord::new("Ada", 2);
    record.complete_level(1);
    record.set_grade(5);
    assert!(!record.is_level_completed(1));
    assert_eq!(record.current_level(5), 1);
    assert_eq!(record.current_level(2), 2);
}

#[test]
fn unlock_never_relocks() {
    let mut record = ProfileRecord::new("Ada", 4);
    record.unlock_level(4, 10);
    record.unlock_level(4, 3);
    assert_eq!(record.current_level(4), 10);
}

#[test]
fn unlock_ignores_unknown_grade() {
    let mut record = ProfileRecord::new("Ada", 4);
    record.unlock_level(0, 10);
    record.unlock_level(8, 10);
    assert_eq!(record.current_level_by_grade().len(), 7);
}

// ── Legacy upgrade ───────────────────────────────────────────────

#[test]
fn legacy_single_grade_upgrade() {
    let legacy = LegacyProfile {
        name: "Sam".into(),
        grade: 3,
        completed_levels: [1, 2].into_iter().collect(),
        current_level: 3,
    };

    let record = legacy.into_record();

    assert_eq!(record.name(), "Sam");
    assert_eq!(record.grade(), 3);
    assert_eq!(record.completed_levels(3), set(&[1, 2]));
    assert_eq!(record.current_level(3), 3);
    for grade in [1, 2, 4, 5, 6, 7] {
        assert_eq!(record.completed_levels(grade), BTreeSet::new());
        assert_eq!(record.current_level(grade), 1);
    }
}

#[test]
fn legacy_upgrade_clamps_grade() {
    let legacy = LegacyProfile {
        name: "Sam".into(),
        grade: 40,
        completed_levels: [5].into_iter().collect(),
        current_level: 6,
    };
    let record = legacy.into_record();
    assert_eq!(record.grade(), 7);
    assert_eq!(record.completed_levels(7), set(&[5]));
}

#[test]
fn stored_profile_parses_single_grade_json() {
    let json = br#"{"name":"Sam","grade":3,"completedLevels":[2,1],"currentLevel":3}"#;
    let stored = StoredProfile::from_slice(json).unwrap();
    assert!(matches!(stored, StoredProfile::SingleGrade(_)));
    assert_eq!(stored.into_record().completed_levels(3), set(&[1, 2]));
}

#[test]
fn stored_profile_parses_per_grade_json() {
    let json = br#"{"name":"Sam","grade":2,"completedLevelsByGrade":{"2":[1]},"currentLevelByGrade":{"2":2}}"#;
    let stored = StoredProfile::from_slice(json).unwrap();
    assert!(matches!(stored, StoredProfile::PerGrade(_)));
    let record = stored.into_record();
    assert_eq!(record.current_level(2), 2);
    assert_eq!(record.current_level(6), 1);
}

#[test]
fn stored_profile_rejects_garbage() {
    assert!(StoredProfile::from_slice(b"not json").is_err());
    assert!(StoredProfile::from_slice(br#"{"grade":3}"#).is_err());
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn serializes_camel_case_maps() {
    let record = ProfileRecord::new("Ada", 1);
    let value = serde_json::to_value(&record).unwrap();
    assert!(value.get("completedLevelsByGrade").is_some());
    assert!(value.get("currentLevelByGrade").is_some());
    assert_eq!(value["currentLevelByGrade"]["1"], 1);
}

#[test]
fn decode_normalizes_missing_maps() {
    let record: ProfileRecord = serde_json::from_str(r#"{"name":"Ada","grade":99}"#).unwrap();
    assert_eq!(record.grade(), 7);
    assert_eq!(record.current_level_by_grade().len(), 7);
}

proptest! {
    #[test]
    fn json_roundtrip(
        name in "[a-zA-Z ]{0,20}",
        grade in -10i64..20,
        levels in prop::collection::vec((1u8..=7, 1u16..=50), 0..30),
    ) {
        let mut record = ProfileRecord::new(name, grade);
        for (g, level) in levels {
            record.set_grade(i64::from(g));
            record.complete_level(level);
        }
        let json = serde_json::to_vec(&record).unwrap();
        let back: ProfileRecord = serde_json::from_slice(&json).unwrap();
        prop_assert_eq!(back, record);
    }

    #[test]
    fn grade_always_in_range(grade in any::<i64>()) {
        let record = ProfileRecord::new("x", grade);
        prop_assert!((MIN_GRADE..=MAX_GRADE).contains(&record.grade()));
    }
}
