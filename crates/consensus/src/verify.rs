//! Commit verification against a validator set.

use crate::{BlockId, Commit, ValidatorSet, ValidatorSetError};
use stakeset_types::{safe_add, safe_mul};
use std::collections::BTreeSet;
use tracing::debug;

/// The fraction of trusted stake a light client requires from overlapping
/// signers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustFraction {
    /// Fraction numerator.
    pub numerator: u32,
    /// Fraction denominator.
    pub denominator: u32,
}

impl TrustFraction {
    /// The standard light-client trust level of one third.
    pub const ONE_THIRD: Self = Self {
        numerator: 1,
        denominator: 3,
    };
}

impl ValidatorSet {
    /// Verify that `commit` commits the block `block_id` at `height` on
    /// `chain_id` with more than 2/3 of this set's staking power.
    ///
    /// The commit's signature list must be positionally aligned with this
    /// set. Only `Commit`-flagged slots contribute stake, and every one of
    /// them must carry a valid signature from the validator holding the
    /// slot.
    pub fn verify_commit(
        &self,
        chain_id: &str,
        block_id: &BlockId,
        height: i64,
        commit: &Commit,
    ) -> Result<(), ValidatorSetError> {
        if commit.height != height {
            return Err(ValidatorSetError::InvalidCommit(format!(
                "commit height {} does not match expected {height}",
                commit.height
            )));
        }
        if commit.block_id != *block_id {
            return Err(ValidatorSetError::InvalidCommit(format!(
                "commit block id {} does not match expected {}",
                commit.block_id.hash, block_id.hash
            )));
        }
        if commit.signatures.len() != self.size() {
            return Err(ValidatorSetError::InvalidCommit(format!(
                "commit carries {} signatures for a set of {}",
                commit.signatures.len(),
                self.size()
            )));
        }

        let mut tallied = 0i64;
        for (idx, commit_sig) in commit.signatures.iter().enumerate() {
            if !commit_sig.is_for_block() {
                continue;
            }

            let val = &self.validators()[idx];
            if commit_sig.validator_address != val.address {
                return Err(ValidatorSetError::InvalidCommit(format!(
                    "signature {idx} is from {}, expected {}",
                    commit_sig.validator_address, val.address
                )));
            }

            let signature = commit_sig.signature.as_ref().ok_or_else(|| {
                ValidatorSetError::InvalidSignature {
                    address: val.address.to_string(),
                }
            })?;
            let sign_bytes = commit.vote_sign_bytes(chain_id, idx);
            if !val.pub_key.verify(&sign_bytes, signature) {
                return Err(ValidatorSetError::InvalidSignature {
                    address: val.address.to_string(),
                });
            }

            tallied = safe_add(tallied, val.staking_power).ok_or(
                ValidatorSetError::TotalVotingPowerOverflow {
                    max: crate::MAX_TOTAL_STAKING_POWER,
                },
            )?;
        }

        let needed = self.total_staking_power() * 2 / 3;
        if tallied > needed {
            debug!(height, tallied, needed, "commit verified");
            Ok(())
        } else {
            Err(ValidatorSetError::NotEnoughVotingPower { tallied, needed })
        }
    }

    /// Light-client verification against a trusted (possibly older) set.
    ///
    /// Walks the commit's `Commit`-flagged signatures and tallies the stake
    /// of signers that appear in this set, skipping unknown signers and
    /// rejecting duplicates. Succeeds as soon as the tally exceeds
    /// `trust_level` of this set's total staking power.
    pub fn verify_commit_light_trusting(
        &self,
        chain_id: &str,
        commit: &Commit,
        trust_level: TrustFraction,
    ) -> Result<(), ValidatorSetError> {
        if trust_level.denominator == 0 {
            return Err(ValidatorSetError::InvalidCommit(
                "trust level has a zero denominator".into(),
            ));
        }

        let needed = safe_mul(self.total_staking_power(), trust_level.numerator as i64)
            .ok_or(ValidatorSetError::Overflow)?
            / trust_level.denominator as i64;

        let mut tallied = 0i64;
        let mut seen: BTreeSet<usize> = BTreeSet::new();

        for (idx, commit_sig) in commit.signatures.iter().enumerate() {
            if !commit_sig.is_for_block() {
                continue;
            }

            // Unknown signers are fine against a trusted older set; they
            // just contribute nothing.
            let Some((val_idx, val)) = self.get_by_address(&commit_sig.validator_address) else {
                continue;
            };
            if !seen.insert(val_idx) {
                return Err(ValidatorSetError::InvalidCommit(format!(
                    "double vote from validator {}",
                    val.address
                )));
            }

            let signature = commit_sig.signature.as_ref().ok_or_else(|| {
                ValidatorSetError::InvalidSignature {
                    address: val.address.to_string(),
                }
            })?;
            let sign_bytes = commit.vote_sign_bytes(chain_id, idx);
            if !val.pub_key.verify(&sign_bytes, signature) {
                return Err(ValidatorSetError::InvalidSignature {
                    address: val.address.to_string(),
                });
            }

            tallied = safe_add(tallied, val.staking_power).ok_or(
                ValidatorSetError::TotalVotingPowerOverflow {
                    max: crate::MAX_TOTAL_STAKING_POWER,
                },
            )?;
            if tallied > needed {
                return Ok(());
            }
        }

        Err(ValidatorSetError::NotEnoughVotingPower {
            tallied,
            needed,
        })
    }
}
