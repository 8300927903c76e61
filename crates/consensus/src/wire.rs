//! Deterministic wire encoding of validator sets.
//!
//! The wire records are the crate's canonical exchange form: SBOR-encoded,
//! byte-reproducible, and round-trip exact including proposer priorities.
//! `WireSimpleValidator` is the priority-free record whose encoding is
//! hashed into the set hash, so two sets agree on their hash iff they agree
//! on members, keys and staking powers.

use crate::{Validator, ValidatorSet, ValidatorSetError};
use sbor::prelude::*;
use stakeset_types::{Address, Hash, PublicKey};

/// Priority-free validator record; its encoding is the set-hash leaf.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct WireSimpleValidator {
    /// Signature verification key.
    pub pub_key: PublicKey,
    /// Stake weight.
    pub staking_power: i64,
}

/// Full validator record as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct WireValidator {
    /// 20-byte address.
    pub address: Address,
    /// Signature verification key.
    pub pub_key: PublicKey,
    /// Stake weight.
    pub staking_power: i64,
    /// Transient scheduling state, carried for cross-node reproducibility.
    pub proposer_priority: i64,
}

/// Wire form of a whole validator set.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct WireValidatorSet {
    /// Members in canonical (address-ascending) order.
    pub validators: Vec<WireValidator>,
    /// Sum of member staking powers, restated for cheap consistency checks.
    pub total_staking_power: i64,
}

/// Hash leaf for one validator: SHA-256 of the priority-free encoding.
pub(crate) fn validator_leaf_hash(val: &Validator) -> Hash {
    let simple = WireSimpleValidator {
        pub_key: val.pub_key.clone(),
        staking_power: val.staking_power,
    };
    let bytes = basic_encode(&simple).expect("validator serialization should never fail");
    Hash::of(&bytes)
}

impl From<&Validator> for WireValidator {
    fn from(val: &Validator) -> Self {
        Self {
            address: val.address,
            pub_key: val.pub_key.clone(),
            staking_power: val.staking_power,
            proposer_priority: val.proposer_priority,
        }
    }
}

impl ValidatorSet {
    /// Convert to the wire form.
    pub fn to_wire(&self) -> WireValidatorSet {
        WireValidatorSet {
            validators: self.validators().iter().map(WireValidator::from).collect(),
            total_staking_power: self.total_staking_power(),
        }
    }

    /// Rebuild a set from its wire form, revalidating its invariants.
    ///
    /// The member list must be address-ascending and duplicate-free, every
    /// member must carry positive power, and the restated total must match
    /// the recomputed sum. The cached hash is always recomputed locally.
    pub fn from_wire(wire: WireValidatorSet) -> Result<Self, ValidatorSetError> {
        let mut validators = Vec::with_capacity(wire.validators.len());
        let mut total = 0i64;
        let mut prev: Option<Address> = None;

        for wv in wire.validators {
            if wv.staking_power <= 0 {
                return Err(ValidatorSetError::InvalidWire(format!(
                    "validator {} carries staking power {}",
                    wv.address, wv.staking_power
                )));
            }
            if let Some(prev) = prev {
                if prev >= wv.address {
                    return Err(ValidatorSetError::InvalidWire(
                        "validators not in ascending address order".into(),
                    ));
                }
            }
            prev = Some(wv.address);

            total = total
                .checked_add(wv.staking_power)
                .filter(|t| *t <= crate::MAX_TOTAL_STAKING_POWER)
                .ok_or_else(|| {
                    ValidatorSetError::InvalidWire("total staking power out of range".into())
                })?;

            validators.push(Validator {
                address: wv.address,
                pub_key: wv.pub_key,
                staking_power: wv.staking_power,
                proposer_priority: wv.proposer_priority,
            });
        }

        if total != wire.total_staking_power {
            return Err(ValidatorSetError::InvalidWire(format!(
                "restated total {} does not match recomputed {total}",
                wire.total_staking_power
            )));
        }

        Ok(ValidatorSet::from_parts(validators, total))
    }

    /// Encode to canonical bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        basic_encode(&self.to_wire()).expect("validator set serialization should never fail")
    }

    /// Decode from canonical bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValidatorSetError> {
        let wire: WireValidatorSet = basic_decode(bytes)
            .map_err(|err| ValidatorSetError::InvalidWire(format!("{err:?}")))?;
        Self::from_wire(wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakeset_types::{KeyPair, KeyType};

    fn seeded_set(powers: &[i64]) -> ValidatorSet {
        let validators = powers
            .iter()
            .enumerate()
            .map(|(i, power)| {
                let kp = KeyPair::from_seed(KeyType::Ed25519, &[i as u8 + 1; 32]);
                Validator::new(kp.public_key(), *power)
            })
            .collect();
        ValidatorSet::new(validators)
    }

    #[test]
    fn test_round_trip_identity() {
        let mut set = seeded_set(&[100, 200, 300]);
        set.increment_proposer_priority(7);

        let decoded = ValidatorSet::from_bytes(&set.to_bytes()).unwrap();
        assert_eq!(decoded, set);
        assert_eq!(decoded.hash(), set.hash());
    }

    #[test]
    fn test_round_trip_empty_set() {
        let set = ValidatorSet::new(vec![]);
        let decoded = ValidatorSet::from_bytes(&set.to_bytes()).unwrap();
        assert_eq!(decoded, set);
        assert_eq!(
            decoded.hash().to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_from_wire_rejects_bad_total() {
        let set = seeded_set(&[10, 20]);
        let mut wire = set.to_wire();
        wire.total_staking_power += 1;
        assert!(matches!(
            ValidatorSet::from_wire(wire),
            Err(ValidatorSetError::InvalidWire(_))
        ));
    }

    #[test]
    fn test_from_wire_rejects_unsorted_or_duplicate() {
        let set = seeded_set(&[10, 20]);

        let mut unsorted = set.to_wire();
        unsorted.validators.reverse();
        assert!(ValidatorSet::from_wire(unsorted).is_err());

        let mut duplicated = set.to_wire();
        duplicated.validators[1] = duplicated.validators[0].clone();
        assert!(ValidatorSet::from_wire(duplicated).is_err());
    }

    #[test]
    fn test_from_wire_rejects_non_positive_power() {
        let set = seeded_set(&[10, 20]);
        let mut wire = set.to_wire();
        wire.validators[0].staking_power = 0;
        wire.total_staking_power = 20;
        assert!(ValidatorSet::from_wire(wire).is_err());
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(ValidatorSet::from_bytes(b"not a validator set").is_err());
    }

    #[test]
    fn test_leaf_excludes_priority() {
        let kp = KeyPair::from_seed(KeyType::Ed25519, &[9u8; 32]);
        let mut val = Validator::new(kp.public_key(), 10);
        let leaf = validator_leaf_hash(&val);
        val.proposer_priority = 12345;
        assert_eq!(validator_leaf_hash(&val), leaf);
    }
}
