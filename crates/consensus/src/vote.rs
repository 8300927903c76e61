//! Vote and commit types, and the canonical sign-bytes construction.
//!
//! A `Commit` is the set of 2/3+ precommit signatures certifying a block at
//! a given height. Each validator's contribution is a `CommitSig`, positionally
//! aligned with the validator set the commit is verified against.
//!
//! Every signed message is the SBOR encoding of a canonical record that
//! includes the chain id, so signatures cannot be replayed across chains or
//! vote types.

use sbor::prelude::*;
use stakeset_types::{Address, Hash, Signature};

/// Identifies the part-set a block was gossiped as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BasicSbor)]
pub struct PartSetHeader {
    /// Number of parts.
    pub total: u32,
    /// Merkle root of the parts.
    pub hash: Hash,
}

/// Identifies a specific block proposal: block hash plus part-set header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BasicSbor)]
pub struct BlockId {
    /// Hash of the block header.
    pub hash: Hash,
    /// Part-set the block was broadcast as.
    pub part_set_header: PartSetHeader,
}

impl BlockId {
    /// The zero block id, signed by validators precommitting nil.
    pub fn zero() -> Self {
        Self {
            hash: Hash::ZERO,
            part_set_header: PartSetHeader {
                total: 0,
                hash: Hash::ZERO,
            },
        }
    }

    /// Whether this is the zero block id.
    pub fn is_zero(&self) -> bool {
        self.hash.is_zero() && self.part_set_header.total == 0 && self.part_set_header.hash.is_zero()
    }
}

/// Vote types carried in canonical sign bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BasicSbor)]
pub enum SignedMsgType {
    /// First-phase consensus vote.
    Prevote,
    /// Second-phase consensus vote; commits are built from these.
    Precommit,
}

impl SignedMsgType {
    /// Wire value of this vote type.
    pub fn as_u8(self) -> u8 {
        match self {
            SignedMsgType::Prevote => 1,
            SignedMsgType::Precommit => 2,
        }
    }
}

/// How a validator's slot in a commit was filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BasicSbor)]
pub enum BlockIdFlag {
    /// The validator's vote was not received.
    Absent,
    /// The validator precommitted the committed block. Only this flag
    /// contributes stake to the commit.
    Commit,
    /// The validator precommitted nil.
    Nil,
}

impl BlockIdFlag {
    /// Wire value of this flag (Absent = 1, Commit = 2, Nil = 3).
    pub fn as_u8(self) -> u8 {
        match self {
            BlockIdFlag::Absent => 1,
            BlockIdFlag::Commit => 2,
            BlockIdFlag::Nil => 3,
        }
    }

    /// Parse a wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(BlockIdFlag::Absent),
            2 => Some(BlockIdFlag::Commit),
            3 => Some(BlockIdFlag::Nil),
            _ => None,
        }
    }
}

/// A single precommit vote, as cast by a validator.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Vote {
    /// Vote phase; commits carry precommits.
    pub vote_type: SignedMsgType,
    /// Block height voted on.
    pub height: i64,
    /// Consensus round the vote was cast in.
    pub round: i32,
    /// Block voted for; zero when precommitting nil.
    pub block_id: BlockId,
    /// Unix timestamp (milliseconds) when the vote was cast.
    pub timestamp: u64,
    /// Address of the voting validator.
    pub validator_address: Address,
    /// Index of the validator in the set at `height`.
    pub validator_index: u32,
    /// Signature over the canonical vote bytes.
    pub signature: Signature,
}

impl Vote {
    /// Convert this vote into its commit slot entry.
    pub fn commit_sig(&self) -> CommitSig {
        let flag = if self.block_id.is_zero() {
            BlockIdFlag::Nil
        } else {
            BlockIdFlag::Commit
        };
        CommitSig {
            flag,
            validator_address: self.validator_address,
            timestamp: self.timestamp,
            signature: Some(self.signature.clone()),
        }
    }
}

/// The canonical record a vote signature covers. The chain id rides inside
/// it, giving cross-chain domain separation.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
struct CanonicalVote {
    vote_type: SignedMsgType,
    height: i64,
    round: i32,
    block_id: BlockId,
    timestamp: u64,
    chain_id: String,
}

/// Build the canonical bytes a validator signs for a vote.
pub fn vote_sign_bytes(chain_id: &str, vote: &Vote) -> Vec<u8> {
    let canonical = CanonicalVote {
        vote_type: vote.vote_type,
        height: vote.height,
        round: vote.round,
        block_id: vote.block_id,
        timestamp: vote.timestamp,
        chain_id: chain_id.to_owned(),
    };
    basic_encode(&canonical).expect("canonical vote serialization should never fail")
}

/// A validator's contribution to a commit.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct CommitSig {
    /// What this slot certifies.
    pub flag: BlockIdFlag,
    /// Address of the validator holding this slot; zero when absent.
    pub validator_address: Address,
    /// Unix timestamp (milliseconds) of the vote; zero when absent.
    pub timestamp: u64,
    /// The precommit signature; `None` when absent.
    pub signature: Option<Signature>,
}

impl CommitSig {
    /// The slot entry for a validator whose vote was not received.
    pub fn absent() -> Self {
        Self {
            flag: BlockIdFlag::Absent,
            validator_address: Address([0u8; 20]),
            timestamp: 0,
            signature: None,
        }
    }

    /// Whether this slot contributes stake toward the commit.
    pub fn is_for_block(&self) -> bool {
        self.flag == BlockIdFlag::Commit
    }

    /// Structural validation.
    pub fn validate_basic(&self) -> Result<(), crate::ValidatorSetError> {
        let invalid = |msg: String| crate::ValidatorSetError::InvalidCommit(msg);
        match self.flag {
            BlockIdFlag::Absent => {
                if self.signature.is_some() {
                    return Err(invalid("absent commit sig carries a signature".into()));
                }
                if self.validator_address != Address([0u8; 20]) {
                    return Err(invalid("absent commit sig carries an address".into()));
                }
            }
            BlockIdFlag::Commit | BlockIdFlag::Nil => {
                if self.signature.is_none() {
                    return Err(invalid(format!(
                        "commit sig for {} is missing its signature",
                        self.validator_address
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The set of precommit signatures certifying a block.
///
/// `signatures` is positionally aligned with the validator set at `height`:
/// slot `i` belongs to validator `i` in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Commit {
    /// Height of the committed block.
    pub height: i64,
    /// Round the block was committed in.
    pub round: i32,
    /// The committed block.
    pub block_id: BlockId,
    /// One slot per validator in the set at `height`.
    pub signatures: Vec<CommitSig>,
}

impl Commit {
    /// Create a new commit.
    pub fn new(height: i64, round: i32, block_id: BlockId, signatures: Vec<CommitSig>) -> Self {
        Self {
            height,
            round,
            block_id,
            signatures,
        }
    }

    /// Rebuild the canonical bytes signed by the validator in slot `idx`.
    ///
    /// The block id in the signed record follows the slot's flag: the
    /// commit's block id for `Commit`, the zero block id for `Nil`. Absent
    /// slots signed nothing; callers must not ask for their bytes.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range or the slot is absent.
    pub fn vote_sign_bytes(&self, chain_id: &str, idx: usize) -> Vec<u8> {
        let sig = &self.signatures[idx];
        let block_id = match sig.flag {
            BlockIdFlag::Commit => self.block_id,
            BlockIdFlag::Nil => BlockId::zero(),
            BlockIdFlag::Absent => panic!("absent commit sig has no sign bytes"),
        };
        let canonical = CanonicalVote {
            vote_type: SignedMsgType::Precommit,
            height: self.height,
            round: self.round,
            block_id,
            timestamp: sig.timestamp,
            chain_id: chain_id.to_owned(),
        };
        basic_encode(&canonical).expect("canonical vote serialization should never fail")
    }

    /// Structural validation of every slot.
    pub fn validate_basic(&self) -> Result<(), crate::ValidatorSetError> {
        if self.height < 0 {
            return Err(crate::ValidatorSetError::InvalidCommit(
                "negative height".into(),
            ));
        }
        for sig in &self.signatures {
            sig.validate_basic()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakeset_types::{KeyPair, KeyType};

    fn block_id(tag: &[u8]) -> BlockId {
        BlockId {
            hash: Hash::of(tag),
            part_set_header: PartSetHeader {
                total: 1,
                hash: Hash::of_parts(&[tag, b"/parts"]),
            },
        }
    }

    #[test]
    fn test_block_id_flag_wire_values() {
        assert_eq!(BlockIdFlag::Absent.as_u8(), 1);
        assert_eq!(BlockIdFlag::Commit.as_u8(), 2);
        assert_eq!(BlockIdFlag::Nil.as_u8(), 3);
        for flag in [BlockIdFlag::Absent, BlockIdFlag::Commit, BlockIdFlag::Nil] {
            assert_eq!(BlockIdFlag::from_u8(flag.as_u8()), Some(flag));
        }
        assert_eq!(BlockIdFlag::from_u8(0), None);
        assert_eq!(BlockIdFlag::from_u8(4), None);
    }

    #[test]
    fn test_sign_bytes_deterministic_and_domain_separated() {
        let kp = KeyPair::from_seed(KeyType::Ed25519, &[1u8; 32]);
        let vote = Vote {
            vote_type: SignedMsgType::Precommit,
            height: 5,
            round: 0,
            block_id: block_id(b"block"),
            timestamp: 1_700_000_000_000,
            validator_address: kp.address(),
            validator_index: 0,
            signature: Signature::zero(),
        };

        assert_eq!(vote_sign_bytes("chain-a", &vote), vote_sign_bytes("chain-a", &vote));
        assert_ne!(vote_sign_bytes("chain-a", &vote), vote_sign_bytes("chain-b", &vote));

        let mut prevote = vote.clone();
        prevote.vote_type = SignedMsgType::Prevote;
        assert_ne!(vote_sign_bytes("chain-a", &vote), vote_sign_bytes("chain-a", &prevote));
    }

    #[test]
    fn test_commit_sig_from_vote() {
        let kp = KeyPair::from_seed(KeyType::Ed25519, &[2u8; 32]);
        let mut vote = Vote {
            vote_type: SignedMsgType::Precommit,
            height: 5,
            round: 0,
            block_id: block_id(b"block"),
            timestamp: 42,
            validator_address: kp.address(),
            validator_index: 0,
            signature: Signature::zero(),
        };

        assert_eq!(vote.commit_sig().flag, BlockIdFlag::Commit);

        vote.block_id = BlockId::zero();
        assert_eq!(vote.commit_sig().flag, BlockIdFlag::Nil);
    }

    #[test]
    fn test_commit_sign_bytes_match_vote_sign_bytes() {
        let kp = KeyPair::from_seed(KeyType::Ed25519, &[3u8; 32]);
        let vote = Vote {
            vote_type: SignedMsgType::Precommit,
            height: 9,
            round: 2,
            block_id: block_id(b"commit-block"),
            timestamp: 1234,
            validator_address: kp.address(),
            validator_index: 0,
            signature: Signature::zero(),
        };
        let commit = Commit::new(9, 2, vote.block_id, vec![vote.commit_sig()]);

        assert_eq!(commit.vote_sign_bytes("c", 0), vote_sign_bytes("c", &vote));
    }

    #[test]
    fn test_commit_sig_validate_basic() {
        assert!(CommitSig::absent().validate_basic().is_ok());

        let mut absent_with_sig = CommitSig::absent();
        absent_with_sig.signature = Some(Signature::zero());
        assert!(absent_with_sig.validate_basic().is_err());

        let missing_sig = CommitSig {
            flag: BlockIdFlag::Commit,
            validator_address: Address([1u8; 20]),
            timestamp: 1,
            signature: None,
        };
        assert!(missing_sig.validate_basic().is_err());
    }
}
