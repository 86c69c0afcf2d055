//! # Cryptographic Primitives
//!
//! The network fixes its algorithms, so there is nothing to negotiate:
//!
//! - **Ed25519** for every signature.
//! - **SHA-512/256** for every digest (checksums, ids, derived addresses).
//!
//! Everything here is a thin, type-safe wrapper around `ed25519-dalek` and
//! `sha2`. Domain separation is applied by the callers, which know what kind
//! of object they are signing.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{domain_separated_bytes, domain_separated_hash, sha512_256};
pub use keys::{KeyError, Keypair, PublicKey, Signature};
pub use signatures::{batch_verify, sign, verify, verify_checked, SignatureError};
