//! The weighted, ordered set of block producers.
//!
//! A `ValidatorSet` owns the canonical (address-ascending) list of
//! validators, their cached total staking power and the cached member-list
//! hash. It is mutated only through [`ValidatorSet::update_with_change_set`]
//! and [`ValidatorSet::increment_proposer_priority`]; both either succeed
//! completely or leave the set untouched.
//!
//! Proposer selection for an external block is stateless and stake-weighted
//! ([`ValidatorSet::select_proposer`]); proposer priority is maintained for
//! wire compatibility with peers that still schedule by it.

use crate::wire::validator_leaf_hash;
use crate::{Validator, ValidatorSetError};
use stakeset_types::{merkle_root, safe_add, safe_add_clip, safe_sub_clip, Address, Hash};
use std::collections::BTreeSet;
use tracing::debug;

/// Upper bound on the sum of all staking powers: `i64::MAX / 8`.
///
/// The `/ 8` margin reserves headroom so a voting power derived from stake
/// through a float64 cast cannot overflow.
pub const MAX_TOTAL_STAKING_POWER: i64 = i64::MAX / 8;

/// Upper bound on derived total voting power. The `+ 8` absorbs the largest
/// float64 rounding drift over the staking power range.
pub const MAX_TOTAL_VOTING_POWER: i64 = MAX_TOTAL_STAKING_POWER + 8;

/// The proposer priority spread is kept within this multiple of the total
/// staking power.
pub const PRIORITY_WINDOW_SIZE_FACTOR: i64 = 2;

/// An ordered set of validators, unique by address.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatorSet {
    /// Members in address-ascending order.
    validators: Vec<Validator>,
    /// Cached sum of member staking powers.
    total_staking_power: i64,
    /// Cached Merkle root over the priority-free member encodings.
    hash: Hash,
}

impl ValidatorSet {
    /// Create a set from a list of validators.
    ///
    /// An empty list yields an empty set (useful as a base for change-sets);
    /// priority operations on it panic until members are added. A non-empty
    /// list is applied as an add-only change-set, and the new set receives
    /// one proposer priority round.
    ///
    /// # Panics
    ///
    /// Panics on duplicate addresses, non-positive staking power, or a total
    /// beyond [`MAX_TOTAL_STAKING_POWER`]. These are broken call sites, not
    /// input errors.
    pub fn new(validators: Vec<Validator>) -> Self {
        let mut set = Self {
            validators: Vec::new(),
            total_staking_power: 0,
            hash: merkle_root(&[]),
        };
        if !validators.is_empty() {
            if let Err(err) = set.update_with_change_set(&validators) {
                panic!("cannot create validator set: {err}");
            }
            set.increment_proposer_priority(1);
        }
        set
    }

    /// Assemble a set from already-validated parts, recomputing the hash.
    /// Used by wire decoding, which revalidates ordering and totals itself.
    pub(crate) fn from_parts(validators: Vec<Validator>, total_staking_power: i64) -> Self {
        let mut set = Self {
            validators,
            total_staking_power,
            hash: merkle_root(&[]),
        };
        set.hash = set.compute_hash();
        set
    }

    /// Structural validation of the whole set.
    pub fn validate_basic(&self) -> Result<(), ValidatorSetError> {
        if self.is_empty() {
            return Err(ValidatorSetError::EmptyValidatorSet);
        }
        for val in &self.validators {
            val.validate_basic()?;
            if val.staking_power == 0 {
                return Err(ValidatorSetError::InvalidPower {
                    address: val.address.to_string(),
                    power: 0,
                });
            }
        }
        Ok(())
    }

    /// Number of members.
    pub fn size(&self) -> usize {
        self.validators.len()
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Members in canonical (address-ascending) order.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Iterate members in canonical order.
    pub fn iter(&self) -> std::slice::Iter<'_, Validator> {
        self.validators.iter()
    }

    /// Sum of member staking powers.
    pub fn total_staking_power(&self) -> i64 {
        self.total_staking_power
    }

    /// The cached hash over the canonical member list (priorities excluded).
    ///
    /// The empty set hashes to `SHA256("")`.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Whether a validator with this address is a member.
    pub fn has_address(&self, address: &Address) -> bool {
        self.index_of(address).is_some()
    }

    /// Look up a member by address, returning its index as well.
    pub fn get_by_address(&self, address: &Address) -> Option<(usize, &Validator)> {
        let idx = self.index_of(address)?;
        Some((idx, &self.validators[idx]))
    }

    /// Look up a member by its position in canonical order.
    pub fn get_by_index(&self, index: usize) -> Option<&Validator> {
        self.validators.get(index)
    }

    fn index_of(&self, address: &Address) -> Option<usize> {
        self.validators
            .binary_search_by(|v| v.address.cmp(address))
            .ok()
    }

    // ---------------------------------------------------------------------
    // Change-set engine
    // ---------------------------------------------------------------------

    /// Apply a batch of adds, updates and removals atomically.
    ///
    /// Classification is by membership and power: power 0 removes the
    /// address, a positive power updates a member or adds a newcomer, and a
    /// negative power is rejected. All validation runs before any mutation;
    /// on any error the set is byte-identical to its prior state and the
    /// caller's slice is never touched.
    pub fn update_with_change_set(
        &mut self,
        changes: &[Validator],
    ) -> Result<(), ValidatorSetError> {
        if changes.is_empty() {
            return Ok(());
        }

        let (mut updates, removals) = process_changes(changes)?;
        let removed_power = self.verify_removals(&removals)?;

        let num_new = updates
            .iter()
            .filter(|u| !self.has_address(&u.address))
            .count();
        if self.size() + num_new == removals.len() {
            return Err(ValidatorSetError::EmptyValidatorSet);
        }

        let new_total = self.verify_updates(&updates, removed_power)?;
        self.compute_new_priorities(&mut updates, new_total);

        // All checks passed; mutation starts here.
        self.apply_removals(&removals);
        self.apply_updates(updates);

        self.total_staking_power = new_total;
        self.rescale_priorities(PRIORITY_WINDOW_SIZE_FACTOR * new_total);
        self.shift_by_avg_proposer_priority();
        self.hash = self.compute_hash();

        debug!(
            members = self.size(),
            total_staking_power = self.total_staking_power,
            "applied validator change-set"
        );
        Ok(())
    }

    /// Compute the member-list hash from scratch.
    fn compute_hash(&self) -> Hash {
        let leaves: Vec<Hash> = self.validators.iter().map(validator_leaf_hash).collect();
        merkle_root(&leaves)
    }

    /// Check removals refer to members, and sum the removed stake.
    fn verify_removals(&self, removals: &[Validator]) -> Result<i64, ValidatorSetError> {
        let mut removed_power = 0i64;
        for val in removals {
            match self.get_by_address(&val.address) {
                Some((_, member)) => removed_power += member.staking_power,
                None => {
                    return Err(ValidatorSetError::ValidatorNotPresent {
                        address: val.address.to_string(),
                    })
                }
            }
        }
        Ok(removed_power)
    }

    /// Compute the tentative total staking power after the batch.
    ///
    /// Deltas are applied in ascending order so intermediate sums stay as
    /// small as possible; every partial sum is overflow-checked and bounded.
    fn verify_updates(
        &self,
        updates: &[Validator],
        removed_power: i64,
    ) -> Result<i64, ValidatorSetError> {
        let overflow = || ValidatorSetError::TotalVotingPowerOverflow {
            max: MAX_TOTAL_STAKING_POWER,
        };

        let mut deltas: Vec<i64> = updates
            .iter()
            .map(|u| match self.get_by_address(&u.address) {
                Some((_, member)) => u.staking_power - member.staking_power,
                None => u.staking_power,
            })
            .collect();
        deltas.sort_unstable();

        let mut total = self.total_staking_power - removed_power;
        for delta in deltas {
            total = safe_add(total, delta).ok_or_else(overflow)?;
            if total > MAX_TOTAL_STAKING_POWER {
                return Err(overflow());
            }
        }
        Ok(total)
    }

    /// Fill in proposer priorities on the merge list: members keep their
    /// current priority through updates, newcomers enter at the bottom of
    /// the priority window so they cannot win the round right away.
    fn compute_new_priorities(&self, updates: &mut [Validator], new_total: i64) {
        for update in updates.iter_mut() {
            match self.get_by_address(&update.address) {
                Some((_, member)) => update.proposer_priority = member.proposer_priority,
                None => update.proposer_priority = -(new_total + new_total / 8),
            }
        }
    }

    /// Drop the removed members, preserving the order of survivors.
    fn apply_removals(&mut self, removals: &[Validator]) {
        if removals.is_empty() {
            return;
        }
        let removed: BTreeSet<Address> = removals.iter().map(|v| v.address).collect();
        self.validators.retain(|v| !removed.contains(&v.address));
    }

    /// Merge the address-sorted update list into the address-sorted member
    /// list, replacing on address match.
    fn apply_updates(&mut self, updates: Vec<Validator>) {
        if updates.is_empty() {
            return;
        }
        let existing = std::mem::take(&mut self.validators);
        let mut merged = Vec::with_capacity(existing.len() + updates.len());

        let mut existing = existing.into_iter().peekable();
        let mut updates = updates.into_iter().peekable();

        loop {
            match (existing.peek(), updates.peek()) {
                (Some(cur), Some(upd)) => match cur.address.cmp(&upd.address) {
                    std::cmp::Ordering::Less => merged.push(existing.next().unwrap()),
                    std::cmp::Ordering::Greater => merged.push(updates.next().unwrap()),
                    std::cmp::Ordering::Equal => {
                        existing.next();
                        merged.push(updates.next().unwrap());
                    }
                },
                (Some(_), None) => merged.push(existing.next().unwrap()),
                (None, Some(_)) => merged.push(updates.next().unwrap()),
                (None, None) => break,
            }
        }
        self.validators = merged;
    }

    // ---------------------------------------------------------------------
    // Priority engine
    // ---------------------------------------------------------------------

    /// Advance proposer priorities by `times` rounds.
    ///
    /// Each round re-normalizes the priority window, centers priorities on
    /// zero, credits every member its staking power, and debits the round
    /// winner (highest priority, ties to the smaller address) the total
    /// staking power.
    ///
    /// # Panics
    ///
    /// Panics on an empty set or `times < 1`; both are programmer errors.
    pub fn increment_proposer_priority(&mut self, times: i32) {
        assert!(!self.is_empty(), "empty validator set");
        assert!(
            times > 0,
            "cannot call increment_proposer_priority with non-positive times"
        );

        let diff_max = PRIORITY_WINDOW_SIZE_FACTOR * self.total_staking_power;
        for _ in 0..times {
            self.rescale_priorities(diff_max);
            self.shift_by_avg_proposer_priority();

            for val in &mut self.validators {
                val.proposer_priority = safe_add_clip(val.proposer_priority, val.staking_power);
            }

            let winner = self.index_with_most_priority();
            let val = &mut self.validators[winner];
            val.proposer_priority = safe_sub_clip(val.proposer_priority, self.total_staking_power);
        }
    }

    /// Index of the member with the highest priority; ties go to the
    /// smaller address, which is the earlier member in canonical order.
    fn index_with_most_priority(&self) -> usize {
        debug_assert!(!self.is_empty());
        let mut winner = 0;
        for idx in 1..self.validators.len() {
            if self.validators[idx].proposer_priority > self.validators[winner].proposer_priority {
                winner = idx;
            }
        }
        winner
    }

    /// Squeeze the priority spread back inside `diff_max` by integer
    /// division (rounding toward zero), if it exceeds it.
    ///
    /// # Panics
    ///
    /// Panics on an empty set.
    pub fn rescale_priorities(&mut self, diff_max: i64) {
        assert!(!self.is_empty(), "empty validator set");
        if diff_max <= 0 {
            return;
        }

        let diff = self.compute_max_min_priority_diff();
        if diff > diff_max {
            let ratio = (diff + diff_max - 1) / diff_max;
            for val in &mut self.validators {
                val.proposer_priority /= ratio;
            }
        }
    }

    /// `max(priority) - min(priority)`, computed with clipping arithmetic.
    ///
    /// # Panics
    ///
    /// Panics on an empty set.
    pub fn compute_max_min_priority_diff(&self) -> i64 {
        assert!(!self.is_empty(), "empty validator set");
        let mut max = i64::MIN;
        let mut min = i64::MAX;
        for val in &self.validators {
            max = max.max(val.proposer_priority);
            min = min.min(val.proposer_priority);
        }
        safe_sub_clip(max, min)
    }

    /// Floor of the mean proposer priority. The sum is accumulated in i128
    /// so extreme priorities cannot overflow it.
    ///
    /// # Panics
    ///
    /// Panics on an empty set.
    pub fn compute_avg_proposer_priority(&self) -> i64 {
        assert!(!self.is_empty(), "empty validator set");
        let sum: i128 = self
            .validators
            .iter()
            .map(|v| v.proposer_priority as i128)
            .sum();
        sum.div_euclid(self.validators.len() as i128) as i64
    }

    /// Center priorities by subtracting the floor average.
    ///
    /// # Panics
    ///
    /// Panics on an empty set.
    fn shift_by_avg_proposer_priority(&mut self) {
        let avg = self.compute_avg_proposer_priority();
        for val in &mut self.validators {
            val.proposer_priority = safe_sub_clip(val.proposer_priority, avg);
        }
    }

    // ---------------------------------------------------------------------
    // Proposer selection
    // ---------------------------------------------------------------------

    /// Select the proposer for `(height, round)` under `seed`.
    ///
    /// Stateless and deterministic: hashes `seed ‖ height ‖ round` (both
    /// integers big-endian), takes the first 8 digest bytes as a big-endian
    /// u64, reduces it modulo the total staking power, and walks the
    /// canonical member order accumulating stake until the running sum
    /// exceeds the target. Selection is stake-proportional in expectation
    /// and independent of proposer priority.
    ///
    /// # Panics
    ///
    /// Panics on an empty set or non-positive total staking power.
    pub fn select_proposer(&self, seed: &[u8], height: i64, round: i32) -> &Validator {
        assert!(!self.is_empty(), "empty validator set");
        assert!(
            self.total_staking_power > 0,
            "total staking power must be positive"
        );

        let mix = Hash::of_parts(&[seed, &height.to_be_bytes(), &round.to_be_bytes()]);
        let r = u64::from_be_bytes(mix.as_bytes()[..8].try_into().unwrap());
        let target = (r % self.total_staking_power as u64) as i64;

        let mut accumulated = 0i64;
        for val in &self.validators {
            accumulated += val.staking_power;
            if accumulated > target {
                return val;
            }
        }
        unreachable!("target below total staking power")
    }
}

impl std::fmt::Debug for ValidatorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorSet")
            .field("validators", &self.validators)
            .field("total_staking_power", &self.total_staking_power)
            .field("hash", &self.hash)
            .finish()
    }
}

/// Sort the changes by address, reject duplicates and negative powers, and
/// split them into the update/add list and the removal list.
fn process_changes(
    changes: &[Validator],
) -> Result<(Vec<Validator>, Vec<Validator>), ValidatorSetError> {
    let mut sorted = changes.to_vec();
    sorted.sort_by(|a, b| a.address.cmp(&b.address));

    let mut updates = Vec::new();
    let mut removals = Vec::new();
    let mut prev: Option<Address> = None;

    for val in sorted {
        if val.staking_power < 0 {
            return Err(ValidatorSetError::InvalidPower {
                address: val.address.to_string(),
                power: val.staking_power,
            });
        }
        if prev == Some(val.address) {
            return Err(ValidatorSetError::DuplicateValidator {
                address: val.address.to_string(),
            });
        }
        prev = Some(val.address);

        if val.staking_power == 0 {
            removals.push(val);
        } else {
            updates.push(val);
        }
    }
    Ok((updates, removals))
}
