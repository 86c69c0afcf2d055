//! # Hashing Utilities
//!
//! The network uses exactly one digest: **SHA-512/256** (SHA-512 with the
//! distinct initial values from FIPS 180-4, truncated to 32 bytes). It backs
//! address checksums, transaction ids, group ids, multisig addresses and
//! program addresses.
//!
//! ## Domain separation
//!
//! Unlike hashes that take a keyed context, domain separation here is done by
//! prepending a short ASCII tag (`TX`, `TG`, `Program`, ...) to the hashed
//! bytes. The tags live in [`crate::config`]. Every relying party re-derives
//! the same digest, so the tag and its placement are part of the consensus
//! format and must not change.

use sha2::{Digest, Sha512_256};

use crate::config::HASH_LENGTH;

/// Compute the SHA-512/256 digest of `data`.
///
/// # Example
///
/// ```
/// use algosig::crypto::sha512_256;
///
/// let digest = sha512_256(b"");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha512_256(data: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha512_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple byte slices as if they were concatenated.
///
/// Feeds each part to the hasher in order, so callers can hash
/// `prefix || body` without building the joined buffer first.
pub fn sha512_256_multi(parts: &[&[u8]]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha512_256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Compute `SHA-512/256(domain || data)`.
///
/// This is the one construction every identifier in the crate goes through.
pub fn domain_separated_hash(domain: &[u8], data: &[u8]) -> [u8; HASH_LENGTH] {
    sha512_256_multi(&[domain, data])
}

/// Build the buffer `domain || data`.
///
/// Signatures are computed over this exact buffer, never over `data` alone.
pub fn domain_separated_bytes(domain: &[u8], data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(domain.len() + data.len());
    buf.extend_from_slice(domain);
    buf.extend_from_slice(data);
    buf
}
