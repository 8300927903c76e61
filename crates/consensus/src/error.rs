//! Error types for validator set operations.

use thiserror::Error;

/// Errors surfaced by validator set mutation and commit verification.
///
/// These are the only non-panic failure mode of the crate. Programmer-error
/// conditions (priority operations on an empty set, non-positive `times`,
/// duplicate addresses passed to a constructor) panic instead, because they
/// indicate broken call sites rather than bad input data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorSetError {
    /// A change-set entry carries negative staking power.
    #[error("invalid staking power {power} for validator {address}")]
    InvalidPower {
        /// Hex-encoded validator address.
        address: String,
        /// The offending power.
        power: i64,
    },

    /// The same address appears more than once in a change-set.
    #[error("duplicate validator {address} in change-set")]
    DuplicateValidator {
        /// Hex-encoded validator address.
        address: String,
    },

    /// Removal or update of a validator that is not in the set.
    #[error("validator {address} is not in the set")]
    ValidatorNotPresent {
        /// Hex-encoded validator address.
        address: String,
    },

    /// The operation would leave (or was applied to) an empty set.
    #[error("validator set is empty after applying the changes")]
    EmptyValidatorSet,

    /// The batch would exceed the total staking power bound, or an
    /// intermediate sum overflowed.
    #[error("total staking power would exceed the maximum {max}")]
    TotalVotingPowerOverflow {
        /// The bound that was exceeded.
        max: i64,
    },

    /// Structural commit mismatch (height, block id, length, address).
    #[error("invalid commit: {0}")]
    InvalidCommit(String),

    /// A commit signature failed cryptographic verification.
    #[error("invalid signature from validator {address}")]
    InvalidSignature {
        /// Hex-encoded validator address.
        address: String,
    },

    /// The tallied stake did not reach the required threshold.
    #[error("tallied staking power {tallied} is not more than required {needed}")]
    NotEnoughVotingPower {
        /// Stake accumulated from valid signatures.
        tallied: i64,
        /// Threshold the tally must exceed.
        needed: i64,
    },

    /// int64 overflow while computing the trust-fraction threshold.
    #[error("int64 overflow while calculating the required staking power")]
    Overflow,

    /// Wire decoding produced an inconsistent or undecodable set.
    #[error("invalid wire data: {0}")]
    InvalidWire(String),
}
