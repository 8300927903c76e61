//! A single stake-weighted consensus participant.

use crate::ValidatorSetError;
use sbor::prelude::*;
use stakeset_types::{Address, KeyPair, PublicKey};
use std::fmt;

/// A validator: address, public key, staking power and proposer priority.
///
/// The address is derived from the public key. Staking power is at least 1
/// while the validator is a member of a set; a power of 0 inside a change-set
/// is a removal request. Proposer priority is transient scheduling state and
/// may be negative; it is excluded from the set hash.
#[derive(Clone, PartialEq, Eq, BasicSbor)]
pub struct Validator {
    /// 20-byte address derived from `pub_key`.
    pub address: Address,

    /// Signature verification key.
    pub pub_key: PublicKey,

    /// Stake weight contributing to the 2/3 threshold.
    pub staking_power: i64,

    /// Scheduling state advanced by the priority engine.
    pub proposer_priority: i64,
}

impl Validator {
    /// Create a validator from a public key, deriving the address.
    ///
    /// # Panics
    ///
    /// Panics on negative staking power. Zero is allowed so that the record
    /// can express a removal request inside a change-set.
    pub fn new(pub_key: PublicKey, staking_power: i64) -> Self {
        assert!(
            staking_power >= 0,
            "validator staking power must not be negative, got {staking_power}"
        );
        Self {
            address: pub_key.address(),
            pub_key,
            staking_power,
            proposer_priority: 0,
        }
    }

    /// Structural validation: non-negative power and a consistent address.
    pub fn validate_basic(&self) -> Result<(), ValidatorSetError> {
        if self.staking_power < 0 {
            return Err(ValidatorSetError::InvalidPower {
                address: self.address.to_string(),
                power: self.staking_power,
            });
        }
        if self.address != self.pub_key.address() {
            return Err(ValidatorSetError::InvalidWire(format!(
                "validator address {} does not match its public key",
                self.address
            )));
        }
        Ok(())
    }

    /// Pick the scheduling winner between two validators: the higher
    /// proposer priority wins, ties go to the smaller address.
    pub fn compare_proposer_priority<'a>(&'a self, other: &'a Validator) -> &'a Validator {
        use std::cmp::Ordering;
        match self
            .proposer_priority
            .cmp(&other.proposer_priority)
            .then_with(|| other.address.cmp(&self.address))
        {
            Ordering::Less => other,
            _ => self,
        }
    }
}

/// Derive a validator from a signing capability.
pub trait ExtractValidator {
    /// Build a [`Validator`] for this key with the given staking power.
    fn extract_validator(&self, staking_power: i64) -> Validator;
}

impl ExtractValidator for KeyPair {
    fn extract_validator(&self, staking_power: i64) -> Validator {
        Validator::new(self.public_key(), staking_power)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Validator({} power={} priority={})",
            self.address, self.staking_power, self.proposer_priority
        )
    }
}
