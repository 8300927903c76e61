//! Cryptographic hash type using SHA-256.

use sbor::prelude::*;
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte cryptographic hash using SHA-256.
///
/// Safe to use as a HashMap key. All hashing operations are deterministic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BasicSbor)]
#[sbor(transparent)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Size of hash in bytes.
    pub const BYTES: usize = 32;

    /// Zero hash (all bytes are 0x00).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Hash bytes with SHA-256.
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(digest.into())
    }

    /// Hash multiple byte slices as one message.
    pub fn of_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    /// Create a Hash from raw digest bytes (without hashing).
    ///
    /// # Panics
    ///
    /// Panics if bytes length is not exactly 32.
    pub fn from_digest_bytes(bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), 32, "Hash must be exactly 32 bytes");
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Self(arr)
    }

    /// Parse hash from hex string.
    pub fn from_hex(hex: &str) -> Result<Self, HexError> {
        if hex.len() != 64 {
            return Err(HexError::InvalidLength {
                expected: 64,
                actual: hex.len(),
            });
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| HexError::InvalidHex)?;

        Ok(Self(bytes))
    }

    /// Convert hash to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get bytes as slice reference.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to bytes array.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Hash({}..{})", &hex[..8], &hex[56..])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash two child nodes to produce parent hash.
#[inline]
fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(left.as_bytes());
    data[32..].copy_from_slice(right.as_bytes());
    Hash::of(&data)
}

/// Compute the Merkle root of a list of leaf hashes.
///
/// An empty input yields `SHA256("")`, the canonical empty-collection hash.
/// A single leaf is its own root. Larger trees are built bottom-up over the
/// leaf level padded to the next power of two with zero hashes.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    match leaves.len() {
        0 => Hash::of(&[]),
        1 => leaves[0],
        n => {
            let width = n.next_power_of_two();
            let mut level = vec![Hash::ZERO; width];
            level[..n].copy_from_slice(leaves);

            while level.len() > 1 {
                level = level
                    .chunks_exact(2)
                    .map(|pair| hash_pair(&pair[0], &pair[1]))
                    .collect();
            }
            level[0]
        }
    }
}

/// Errors that can occur when parsing hex strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    /// Invalid hex string length.
    #[error("Invalid hex length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Invalid hex characters.
    #[error("Invalid hex string")]
    InvalidHex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"hello world";
        let hash1 = Hash::of(data);
        let hash2 = Hash::of(data);
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_matches_sha256_vector() {
        // SHA256("abc")
        let expected =
            Hash::from_hex("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
                .unwrap();
        assert_eq!(Hash::of(b"abc"), expected);
    }

    #[test]
    fn test_empty_input_hash() {
        let expected =
            Hash::from_hex("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(Hash::of(&[]), expected);
        assert_eq!(merkle_root(&[]), expected);
    }

    #[test]
    fn test_hex_roundtrip() {
        let original = Hash::of(b"test data");
        let hex = original.to_hex();
        assert_eq!(hex.len(), 64);

        let parsed = Hash::from_hex(&hex).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_of_parts_equals_concatenation() {
        let joined = Hash::of(b"abcdef");
        let parts = Hash::of_parts(&[b"abc", b"def"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_merkle_single_leaf_is_root() {
        let leaf = Hash::of(b"single leaf");
        assert_eq!(merkle_root(&[leaf]), leaf);
    }

    #[test]
    fn test_merkle_two_leaves() {
        let leaf0 = Hash::of(b"leaf 0");
        let leaf1 = Hash::of(b"leaf 1");
        assert_eq!(merkle_root(&[leaf0, leaf1]), hash_pair(&leaf0, &leaf1));
    }

    #[test]
    fn test_merkle_non_power_of_two_pads_with_zero() {
        let leaves: Vec<Hash> = (0u8..3).map(|i| Hash::of(&[i])).collect();
        let expected = hash_pair(
            &hash_pair(&leaves[0], &leaves[1]),
            &hash_pair(&leaves[2], &Hash::ZERO),
        );
        assert_eq!(merkle_root(&leaves), expected);
    }

    #[test]
    fn test_merkle_order_sensitive() {
        let a = Hash::of(b"a");
        let b = Hash::of(b"b");
        assert_ne!(merkle_root(&[a, b]), merkle_root(&[b, a]));
    }
}
