//! # Digital Signatures
//!
//! Ed25519 signing and verification. Every authorization form the network
//! accepts (plain signatures, multisig subsignatures, logic-signature
//! delegations) bottoms out in these functions.
//!
//! Nothing here knows about domain prefixes. The caller passes the exact
//! buffer to be signed, which for ledger objects is always
//! `prefix || canonical bytes` (see [`crate::crypto::hash::domain_separated_bytes`]).

use thiserror::Error;

use super::keys::{Keypair, PublicKey, Signature};

/// Errors during signature operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,

    /// A batch failed; the index of the first bad item is reported so that
    /// callers auditing a multisig can point at the offending member.
    #[error("signature verification failed for batch item {index}")]
    BatchItemFailed { index: usize },
}

/// Sign a message with a keypair.
///
/// Deterministic (RFC 8032): the same key and message always produce the
/// same signature.
///
/// # Example
///
/// ```
/// use algosig::crypto::{sign, verify, Keypair};
///
/// let keypair = Keypair::generate();
/// let signature = sign(&keypair, b"TX...");
/// assert!(verify(&keypair.public_key(), b"TX...", &signature));
/// ```
pub fn sign(keypair: &Keypair, message: &[u8]) -> Signature {
    keypair.sign(message)
}

/// Verify a signature against a public key and message.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    public_key.verify(message, signature)
}

/// Verify a signature, returning a `Result` for `?`-style call sites.
pub fn verify_checked(
    public_key: &PublicKey,
    message: &[u8],
    signature: &Signature,
) -> Result<(), SignatureError> {
    if verify(public_key, message, signature) {
        Ok(())
    } else {
        Err(SignatureError::VerificationFailed)
    }
}

/// Verify several (key, signature) pairs over one shared message.
///
/// Multisig subsignatures all cover the same signing bytes, so the message
/// is passed once. Verification is sequential; the first failure is reported
/// with its position.
pub fn batch_verify(
    message: &[u8],
    items: &[(PublicKey, Signature)],
) -> Result<(), SignatureError> {
    for (index, (public_key, signature)) in items.iter().enumerate() {
        if !verify(public_key, message, signature) {
            return Err(SignatureError::BatchItemFailed { index });
        }
    }
    Ok(())
}
