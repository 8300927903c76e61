//! Foundation types for the stakeset validator core.
//!
//! This crate provides the primitives the consensus layer is built on:
//!
//! - **Hashing**: SHA-256 [`Hash`] and the Merkle root used for set hashes
//! - **Arithmetic**: overflow-checked and clipping i64 helpers
//! - **Crypto**: key pairs, public keys, signatures and 20-byte [`Address`]es
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend
//! on any other workspace crates, making it the foundation layer.

mod arith;
mod crypto;
mod hash;

pub use arith::{safe_add, safe_add_clip, safe_mul, safe_sub_clip};
pub use crypto::{Address, KeyPair, KeyType, PublicKey, Signature};
pub use hash::{merkle_root, Hash, HexError};
