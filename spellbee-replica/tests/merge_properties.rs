//! Property-based tests for the merge rule and codec.
//!
//! - Commutativity: merge(A, B) == merge(B, A)
//! - Associativity: merge(merge(A, B), C) == merge(A, merge(B, C))
//! - Idempotence: merge(A, A) == A
//! - Round trip: decode(encode(A)) == A

use proptest::prelude::*;
use spellbee_replica::{ReplicatedProfile, decode, encode, merge};
use spellbee_types::{DeviceId, ProfileRecord, Timestamp};

fn record_strategy() -> impl Strategy<Value = ProfileRecord> {
    (
        "[a-zA-Z]{1,12}",
        1i64..=7,
        prop::collection::vec((1u8..=7, 1u16..=50), 0..20),
    )
        .prop_map(|(name, grade, levels)| {
            let mut record = ProfileRecord::new(name, grade);
            for (g, level) in levels {
                record.set_grade(i64::from(g));
                record.complete_level(level);
            }
            record.set_grade(grade);
            record
        })
}

fn replica_strategy() -> impl Strategy<Value = ReplicatedProfile> {
    (record_strategy(), 0u64..50, "[a-f0-9]{8}", 0u32..3).prop_map(
        |(record, millis, device, schema)| {
            ReplicatedProfile::with_timestamp(
                record,
                Timestamp::from_millis(millis),
                DeviceId::new(device),
                schema,
            )
        },
    )
}

/// Equality ignoring provenance, which merge never consults.
fn same_state(a: &ReplicatedProfile, b: &ReplicatedProfile) -> bool {
    a.record() == b.record()
        && a.last_modified() == b.last_modified()
        && a.schema_version() == b.schema_version()
}

proptest! {
    #[test]
    fn merge_is_commutative(a in replica_strategy(), b in replica_strategy()) {
        prop_assert!(same_state(&merge(&a, &b), &merge(&b, &a)));
    }

    #[test]
    fn merge_is_associative(
        a in replica_strategy(),
        b in replica_strategy(),
        c in replica_strategy(),
    ) {
        let left = merge(&merge(&a, &b), &c);
        let right = merge(&a, &merge(&b, &c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn merge_is_idempotent(a in replica_strategy()) {
        prop_assert_eq!(merge(&a, &a), a);
    }

    #[test]
    fn merge_returns_one_of_its_inputs(a in replica_strategy(), b in replica_strategy()) {
        let m = merge(&a, &b);
        prop_assert!(m == a || m == b);
    }

    #[test]
    fn later_timestamp_always_wins(
        a in replica_strategy(),
        b in replica_strategy(),
    ) {
        prop_assume!(a.last_modified() != b.last_modified());
        let expected = if a.last_modified() > b.last_modified() { &a } else { &b };
        prop_assert_eq!(&merge(&a, &b), expected);
        prop_assert_eq!(&merge(&b, &a), expected);
    }

    #[test]
    fn repeated_merge_is_stable(a in replica_strategy(), b in replica_strategy()) {
        let once = merge(&a, &b);
        let twice = merge(&once, &b);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn codec_roundtrip(a in replica_strategy()) {
        let bytes = encode(&a).unwrap();
        prop_assert_eq!(decode(&bytes).unwrap(), a);
    }
}
