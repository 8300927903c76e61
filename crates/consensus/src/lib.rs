//! Validator set management and proposer selection for BFT consensus.
//!
//! This crate maintains the weighted, ordered set of block producers:
//!
//! - [`Validator`]: a single participant (address, key, stake, priority)
//! - [`ValidatorSet`]: atomic change-set application, proposer priority
//!   bookkeeping and stake-weighted proposer selection
//! - [`Commit`]/[`CommitSig`]: aggregated precommit signatures for a block,
//!   verified against a set with [`ValidatorSet::verify_commit`] and
//!   [`ValidatorSet::verify_commit_light_trusting`]
//! - [`wire`]: the deterministic wire encoding and the set hash leaf form
//!
//! Everything here is deterministic and byte-reproducible across nodes: any
//! divergence in set contents, ordering, priorities or hashes forks the
//! chain. Mutating operations take `&mut self` and are all-or-nothing; on
//! error the set is untouched.

mod error;
mod validator;
mod validator_set;
mod verify;
mod vote;
pub mod wire;

pub use error::ValidatorSetError;
pub use validator::{ExtractValidator, Validator};
pub use validator_set::{
    ValidatorSet, MAX_TOTAL_STAKING_POWER, MAX_TOTAL_VOTING_POWER, PRIORITY_WINDOW_SIZE_FACTOR,
};
pub use verify::TrustFraction;
pub use vote::{
    vote_sign_bytes, BlockId, BlockIdFlag, Commit, CommitSig, PartSetHeader, SignedMsgType, Vote,
};
