//! Cryptographic key pairs, signatures and validator addresses.
//!
//! Supports:
//! - ED25519: Fast signing for general use
//! - SECP256K1: ECDSA for ecosystems standardized on that curve
//! - Composite: a BLS12-381 block-signing key paired with an ED25519 key
//!
//! New schemes are added by extending the enums, not by subclassing. A
//! mismatched key/signature pair never errors, it just fails verification.

use crate::Hash;
use sbor::prelude::*;
use std::fmt;

/// A 20-byte validator address, derived from the public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BasicSbor)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Size of an address in bytes.
    pub const BYTES: usize = 20;

    /// Create an Address from bytes.
    ///
    /// # Panics
    ///
    /// Panics if bytes length is not exactly 20.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), 20, "Address must be exactly 20 bytes");
        let mut arr = [0u8; 20];
        arr.copy_from_slice(bytes);
        Self(arr)
    }

    /// Get the bytes as a slice.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Supported key types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BasicSbor)]
pub enum KeyType {
    /// ED25519 - Fast, widely supported.
    Ed25519,
    /// SECP256K1 - ECDSA over the Bitcoin curve.
    Secp256k1,
    /// Composite - BLS12-381 block signing plus an ED25519 key.
    Composite,
}

impl KeyType {
    /// Domain tag prefixed to key bytes before address derivation.
    fn tag(self) -> u8 {
        match self {
            KeyType::Ed25519 => 0x01,
            KeyType::Secp256k1 => 0x02,
            KeyType::Composite => 0x03,
        }
    }
}

/// A cryptographic key pair for signing.
#[derive(Clone)]
pub enum KeyPair {
    /// ED25519 key pair.
    Ed25519(ed25519_dalek::SigningKey),
    /// SECP256K1 key pair.
    Secp256k1(k256::ecdsa::SigningKey),
    /// Composite key pair: BLS12-381 signing key plus an ED25519 key.
    Composite {
        /// BLS12-381 key used for block vote signatures.
        bls: blst::min_pk::SecretKey,
        /// ED25519 companion key.
        ed25519: ed25519_dalek::SigningKey,
    },
}

impl KeyPair {
    /// Generate a new random Ed25519 keypair.
    pub fn generate_ed25519() -> Self {
        let mut csprng = rand::rngs::OsRng;
        let signing_key = ed25519_dalek::SigningKey::generate(&mut csprng);
        KeyPair::Ed25519(signing_key)
    }

    /// Generate a new random secp256k1 keypair.
    pub fn generate_secp256k1() -> Self {
        let signing_key = k256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng);
        KeyPair::Secp256k1(signing_key)
    }

    /// Generate a new random composite keypair.
    pub fn generate_composite() -> Self {
        let mut ikm = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut ikm);
        let bls = blst::min_pk::SecretKey::key_gen(&ikm, &[]).unwrap();
        let mut csprng = rand::rngs::OsRng;
        let ed25519 = ed25519_dalek::SigningKey::generate(&mut csprng);
        KeyPair::Composite { bls, ed25519 }
    }

    /// Generate a keypair from a seed (for testing/simulation).
    ///
    /// # Panics
    ///
    /// Panics for the secp256k1 scheme if the seed is outside the scalar
    /// field, and for the composite scheme if BLS key generation rejects the
    /// seed material.
    pub fn from_seed(key_type: KeyType, seed: &[u8; 32]) -> Self {
        match key_type {
            KeyType::Ed25519 => {
                let signing_key = ed25519_dalek::SigningKey::from_bytes(seed);
                KeyPair::Ed25519(signing_key)
            }
            KeyType::Secp256k1 => {
                let signing_key = k256::ecdsa::SigningKey::from_slice(seed)
                    .expect("seed outside the secp256k1 scalar range");
                KeyPair::Secp256k1(signing_key)
            }
            KeyType::Composite => {
                let bls = blst::min_pk::SecretKey::key_gen(seed, &[])
                    .expect("seed rejected by BLS key generation");
                let ed_seed = Hash::of(seed).to_bytes();
                let ed25519 = ed25519_dalek::SigningKey::from_bytes(&ed_seed);
                KeyPair::Composite { bls, ed25519 }
            }
        }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        match self {
            KeyPair::Ed25519(signing_key) => {
                use ed25519_dalek::Signer;
                let sig = signing_key.sign(message);
                Signature::Ed25519(sig.to_bytes().to_vec())
            }
            KeyPair::Secp256k1(signing_key) => {
                use k256::ecdsa::signature::Signer;
                let sig: k256::ecdsa::Signature = signing_key.sign(message);
                Signature::Secp256k1(sig.to_bytes().to_vec())
            }
            KeyPair::Composite { bls, .. } => {
                let sig = bls.sign(message, &[], &[]);
                Signature::Bls12381(sig.to_bytes().to_vec())
            }
        }
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Ed25519(signing_key) => {
                PublicKey::Ed25519(signing_key.verifying_key().to_bytes())
            }
            KeyPair::Secp256k1(signing_key) => {
                let point = signing_key.verifying_key().to_encoded_point(true);
                PublicKey::Secp256k1(point.as_bytes().to_vec())
            }
            KeyPair::Composite { bls, ed25519 } => PublicKey::Composite {
                bls: bls.sk_to_pk().to_bytes().to_vec(),
                ed25519: ed25519.verifying_key().to_bytes(),
            },
        }
    }

    /// Get the address of this keypair's public key.
    pub fn address(&self) -> Address {
        self.public_key().address()
    }
}

/// A public key for signature verification.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, BasicSbor)]
pub enum PublicKey {
    /// ED25519 public key (32 bytes).
    Ed25519([u8; 32]),
    /// SECP256K1 public key (33 bytes, SEC1 compressed).
    Secp256k1(Vec<u8>),
    /// Composite public key.
    Composite {
        /// BLS12-381 public key (48 bytes compressed).
        bls: Vec<u8>,
        /// ED25519 companion public key (32 bytes).
        ed25519: [u8; 32],
    },
}

impl PublicKey {
    /// Get the key type of this public key.
    pub fn key_type(&self) -> KeyType {
        match self {
            PublicKey::Ed25519(_) => KeyType::Ed25519,
            PublicKey::Secp256k1(_) => KeyType::Secp256k1,
            PublicKey::Composite { .. } => KeyType::Composite,
        }
    }

    /// Canonical scheme-tagged key bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![self.key_type().tag()];
        match self {
            PublicKey::Ed25519(pk) => bytes.extend_from_slice(pk),
            PublicKey::Secp256k1(pk) => bytes.extend_from_slice(pk),
            PublicKey::Composite { bls, ed25519 } => {
                bytes.extend_from_slice(bls);
                bytes.extend_from_slice(ed25519);
            }
        }
        bytes
    }

    /// Derive the 20-byte address: the first 20 bytes of the SHA-256 of the
    /// canonical scheme-tagged key bytes.
    pub fn address(&self) -> Address {
        let digest = Hash::of(&self.to_bytes());
        Address::from_bytes(&digest.as_bytes()[..20])
    }

    /// Verify a signature.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        match (self, signature) {
            (PublicKey::Ed25519(pk_bytes), Signature::Ed25519(sig_bytes)) => {
                use ed25519_dalek::Verifier;
                let pk = match ed25519_dalek::VerifyingKey::from_bytes(pk_bytes) {
                    Ok(pk) => pk,
                    Err(_) => return false,
                };
                let sig_array: [u8; 64] = match sig_bytes.as_slice().try_into() {
                    Ok(arr) => arr,
                    Err(_) => return false,
                };
                let sig = ed25519_dalek::Signature::from_bytes(&sig_array);
                pk.verify(message, &sig).is_ok()
            }
            (PublicKey::Secp256k1(pk_bytes), Signature::Secp256k1(sig_bytes)) => {
                use k256::ecdsa::signature::Verifier;
                let pk = match k256::ecdsa::VerifyingKey::from_sec1_bytes(pk_bytes) {
                    Ok(pk) => pk,
                    Err(_) => return false,
                };
                let sig = match k256::ecdsa::Signature::from_slice(sig_bytes) {
                    Ok(sig) => sig,
                    Err(_) => return false,
                };
                pk.verify(message, &sig).is_ok()
            }
            (PublicKey::Composite { bls, .. }, Signature::Bls12381(sig_bytes)) => {
                let pk = match blst::min_pk::PublicKey::from_bytes(bls) {
                    Ok(pk) => pk,
                    Err(_) => return false,
                };
                let sig = match blst::min_pk::Signature::from_bytes(sig_bytes) {
                    Ok(sig) => sig,
                    Err(_) => return false,
                };
                sig.verify(true, message, &[], &[], &pk, true) == blst::BLST_ERROR::BLST_SUCCESS
            }
            _ => false, // Mismatched types
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicKey::Ed25519(bytes) => {
                write!(f, "PublicKey::Ed25519({})", hex::encode(bytes))
            }
            PublicKey::Secp256k1(bytes) => {
                write!(f, "PublicKey::Secp256k1({})", hex::encode(bytes))
            }
            PublicKey::Composite { bls, ed25519 } => {
                let hex = hex::encode(bls);
                write!(
                    f,
                    "PublicKey::Composite({}..{}, {})",
                    &hex[..8],
                    &hex[hex.len() - 8..],
                    hex::encode(ed25519)
                )
            }
        }
    }
}

/// A cryptographic signature.
#[derive(Clone, PartialEq, Eq, BasicSbor)]
pub enum Signature {
    /// ED25519 signature (64 bytes).
    Ed25519(Vec<u8>),
    /// SECP256K1 ECDSA signature (64 bytes, fixed-size r||s).
    Secp256k1(Vec<u8>),
    /// BLS12-381 signature (96 bytes compressed), produced by composite keys.
    Bls12381(Vec<u8>),
}

impl Signature {
    /// Create a zero/placeholder signature for testing.
    pub fn zero() -> Self {
        Signature::Ed25519(vec![0u8; 64])
    }

    /// Get signature as bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Signature::Ed25519(bytes) => bytes.clone(),
            Signature::Secp256k1(bytes) => bytes.clone(),
            Signature::Bls12381(bytes) => bytes.clone(),
        }
    }

    /// Get signature as byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Signature::Ed25519(bytes) => bytes.as_slice(),
            Signature::Secp256k1(bytes) => bytes.as_slice(),
            Signature::Bls12381(bytes) => bytes.as_slice(),
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (scheme, bytes) = match self {
            Signature::Ed25519(bytes) => ("Ed25519", bytes),
            Signature::Secp256k1(bytes) => ("Secp256k1", bytes),
            Signature::Bls12381(bytes) => ("Bls12381", bytes),
        };
        write!(f, "Signature::{}({}..)", scheme, &hex::encode(bytes)[..16])
    }
}
