//! Property tests for change-set application: batches either apply fully
//! with all set invariants intact, or fail leaving the set untouched.

use proptest::prelude::*;
use stakeset_consensus::{
    Validator, ValidatorSet, MAX_TOTAL_STAKING_POWER, PRIORITY_WINDOW_SIZE_FACTOR,
};
use stakeset_types::{Address, Hash, KeyPair, KeyType};
use std::collections::{BTreeMap, BTreeSet};

fn indexed_validator(index: u8, power: i64) -> Validator {
    let seed = Hash::of(&[index]).to_bytes();
    Validator {
        address: Address([index; 20]),
        pub_key: KeyPair::from_seed(KeyType::Ed25519, &seed).public_key(),
        staking_power: power,
        proposer_priority: 0,
    }
}

fn assert_well_formed(set: &ValidatorSet) {
    let total: i64 = set.validators().iter().map(|v| v.staking_power).sum();
    assert_eq!(set.total_staking_power(), total);
    assert!(total <= MAX_TOTAL_STAKING_POWER);
    assert!(set.validators().iter().all(|v| v.staking_power >= 1));

    assert!(set
        .validators()
        .windows(2)
        .all(|pair| pair[0].address < pair[1].address));

    let n = set.size() as i64;
    let priority_sum: i128 = set
        .validators()
        .iter()
        .map(|v| v.proposer_priority as i128)
        .sum();
    assert!(priority_sum.abs() < n as i128);
    assert!(set.compute_max_min_priority_diff() <= PRIORITY_WINDOW_SIZE_FACTOR * total);
}

/// What a valid batch would do to the membership, or None if the batch must
/// be rejected.
fn expected_membership(
    base: &BTreeMap<u8, i64>,
    changes: &[(u8, i64)],
) -> Option<BTreeMap<u8, i64>> {
    let mut seen = BTreeSet::new();
    for (index, _) in changes {
        if !seen.insert(*index) {
            return None; // duplicate in batch
        }
    }

    let mut result = base.clone();
    for (index, power) in changes {
        if *power == 0 {
            if result.remove(index).is_none() {
                return None; // removal of an absent member
            }
        } else {
            result.insert(*index, *power);
        }
    }
    if result.is_empty() {
        return None; // would empty the set
    }
    Some(result)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn changesets_apply_atomically(
        base in prop::collection::btree_map(0u8..8, 1i64..1000, 1..6),
        changes in prop::collection::vec((0u8..12, 0i64..1500), 0..6),
    ) {
        let mut set = ValidatorSet::new(
            base.iter().map(|(i, p)| indexed_validator(*i, *p)).collect(),
        );
        let snapshot = set.clone();

        let change_list: Vec<Validator> = changes
            .iter()
            .map(|(i, p)| indexed_validator(*i, *p))
            .collect();
        let change_snapshot = change_list.clone();

        let result = set.update_with_change_set(&change_list);
        prop_assert_eq!(&change_list, &change_snapshot, "caller slice mutated");

        match expected_membership(&base, &changes) {
            Some(expected) => {
                prop_assert!(result.is_ok(), "valid batch rejected: {:?}", result);
                let got: BTreeMap<u8, i64> = set
                    .validators()
                    .iter()
                    .map(|v| (v.address.as_bytes()[0], v.staking_power))
                    .collect();
                prop_assert_eq!(got, expected);
                assert_well_formed(&set);

                // The hash tracks membership, and a wire round-trip is exact.
                let decoded = ValidatorSet::from_bytes(&set.to_bytes()).unwrap();
                prop_assert!(decoded == set);
                prop_assert_eq!(decoded.hash(), set.hash());
            }
            None => {
                prop_assert!(result.is_err(), "invalid batch accepted");
                prop_assert!(set == snapshot, "set mutated on error");
            }
        }
    }
}
