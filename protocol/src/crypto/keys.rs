//! # Key Management
//!
//! Ed25519 keypairs, public keys and signatures for ledger accounts.
//!
//! Every account is an Ed25519 public key. Its display form is the
//! checksummed [`Address`](crate::identity::Address); on the wire it is the
//! raw 32 bytes. This module handles creation, serialization and the basic
//! sign/verify operations everything else builds on.
//!
//! ## Secret key formats
//!
//! Two formats are in circulation and both are accepted:
//!
//! - the 32-byte Ed25519 **seed** (RFC 8032 private key), and
//! - the 64-byte **secret key** the SDKs export: `seed || public_key`.
//!   The embedded public key is checked against the one re-derived from the
//!   seed; a mismatch means the blob is corrupt and is rejected.
//!
//! ## Security considerations
//!
//! - Key bytes are never logged and never printed by `Debug`.
//! - Keys are generated with `OsRng`.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, SEED_LENGTH, SIGNATURE_LENGTH};
use crate::identity::Address;

/// Errors that can occur during key operations. Messages never echo key
/// material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key bytes: expected a 32-byte seed or 64-byte secret key")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignature,

    #[error("keypair validation failed: public key does not match secret key")]
    KeypairMismatch,
}

/// An account keypair wrapping an Ed25519 signing key.
///
/// Not serializable. Export goes through
/// [`secret_key_bytes`](Self::secret_key_bytes) or
/// [`seed_bytes`](Self::seed_bytes).
///
/// # Examples
///
/// ```
/// use algosig::crypto::Keypair;
///
/// let kp = Keypair::generate();
/// let msg = b"pay 5 units to bob";
/// let sig = kp.sign(msg);
/// assert!(kp.public_key().verify(msg, &sig));
/// ```
pub struct Keypair {
    signing_key: SigningKey,
}

/// The public half of an account keypair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    bytes: [u8; SIGNATURE_LENGTH],
}

impl Keypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a 64-byte `seed || public_key` secret key.
    ///
    /// The trailing public key must match the one derived from the seed.
    pub fn from_secret_key_bytes(bytes: &[u8; SECRET_KEY_LENGTH]) -> Result<Self, KeyError> {
        let mut seed = [0u8; SEED_LENGTH];
        seed.copy_from_slice(&bytes[..SEED_LENGTH]);
        let keypair = Self::from_seed(&seed);
        if keypair.public_key().as_bytes()[..] != bytes[SEED_LENGTH..] {
            return Err(KeyError::KeypairMismatch);
        }
        Ok(keypair)
    }

    /// Reconstruct a keypair from either secret key format given as a slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        match bytes.len() {
            SEED_LENGTH => {
                let mut seed = [0u8; SEED_LENGTH];
                seed.copy_from_slice(bytes);
                Ok(Self::from_seed(&seed))
            }
            SECRET_KEY_LENGTH => {
                let mut sk = [0u8; SECRET_KEY_LENGTH];
                sk.copy_from_slice(bytes);
                Self::from_secret_key_bytes(&sk)
            }
            _ => Err(KeyError::InvalidSecretKey),
        }
    }

    /// Reconstruct a keypair from a hex-encoded seed or secret key.
    ///
    /// Convenient for devnet tooling. Don't keep raw hex keys in config files
    /// anywhere that matters.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_slice(&bytes)
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// The account address controlled by this keypair.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    /// Sign raw bytes. Callers are responsible for domain separation; the
    /// transaction, program and multisig modules do it for you.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }

    /// Exports the 32-byte seed.
    ///
    /// **Handle with extreme care.**
    pub fn seed_bytes(&self) -> [u8; SEED_LENGTH] {
        self.signing_key.to_bytes()
    }

    /// Exports the 64-byte `seed || public_key` secret key.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        let mut out = [0u8; SECRET_KEY_LENGTH];
        out[..SEED_LENGTH].copy_from_slice(&self.seed_bytes());
        out[SEED_LENGTH..].copy_from_slice(self.public_key().as_bytes());
        out
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Public half only. Never print secret key material, not even a prefix.
        write!(f, "Keypair(addr={})", self.address())
    }
}

impl PartialEq for Keypair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for Keypair {}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Wrap raw public key bytes without curve validation.
    ///
    /// Addresses are arbitrary 32-byte strings (the zero address, program
    /// addresses and multisig addresses are not curve points), so this
    /// constructor is total. Verification against a non-point simply fails.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Try to create a `PublicKey` from a slice, validating length and that
    /// the bytes decode to an Ed25519 point.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// Verify a signature against this public key.
    ///
    /// Returns a plain boolean; failures carry no reason.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let dalek_sig = DalekSignature::from_bytes(&signature.bytes);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    /// Hex-encoded representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a hex-encoded public key.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|_| KeyError::InvalidPublicKey)?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }
}

impl From<[u8; PUBLIC_KEY_LENGTH]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

impl Signature {
    /// Create a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Create a signature from a slice, checking the length.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; SIGNATURE_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self { bytes })
    }

    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.bytes
    }

    /// Hex-encoded signature. 128 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|_| KeyError::InvalidSignature)?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8032 section 7.1, test 1.
    const RFC_SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const RFC_PUBLIC: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    #[test]
    fn test_rfc8032_public_key_derivation() {
        let kp = Keypair::from_hex(RFC_SEED).unwrap();
        assert_eq!(kp.public_key().to_hex(), RFC_PUBLIC);
    }

    #[test]
    fn test_rfc8032_empty_message_signature() {
        let kp = Keypair::from_hex(RFC_SEED).unwrap();
        let sig = kp.sign(b"");
        assert_eq!(
            sig.to_hex(),
            "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e06522490155\
             5fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b"
        );
    }

    #[test]
    fn keypair_sign_verify_roundtrip() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"transfer");
        assert!(kp.public_key().verify(b"transfer", &sig));
        assert!(!kp.public_key().verify(b"transfer!", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.public_key().verify(b"message", &sig));
    }

    #[test]
    fn test_secret_key_roundtrip() {
        let kp = Keypair::generate();
        let sk = kp.secret_key_bytes();
        let restored = Keypair::from_secret_key_bytes(&sk).unwrap();
        assert_eq!(kp, restored);
        assert_eq!(&sk[..32], &kp.seed_bytes());
    }

    #[test]
    fn test_secret_key_with_foreign_public_key_rejected() {
        let kp = Keypair::generate();
        let other = Keypair::generate();
        let mut sk = kp.secret_key_bytes();
        sk[32..].copy_from_slice(other.public_key().as_bytes());
        assert_eq!(
            Keypair::from_secret_key_bytes(&sk).unwrap_err(),
            KeyError::KeypairMismatch
        );
    }

    #[test]
    fn test_from_slice_accepts_both_formats() {
        let kp = Keypair::generate();
        assert_eq!(Keypair::from_slice(&kp.seed_bytes()).unwrap(), kp);
        assert_eq!(Keypair::from_slice(&kp.secret_key_bytes()).unwrap(), kp);
        assert_eq!(
            Keypair::from_slice(&[0u8; 16]).unwrap_err(),
            KeyError::InvalidSecretKey
        );
    }

    #[test]
    fn test_invalid_hex_rejected() {
        assert!(Keypair::from_hex("deadbeef").is_err());
        assert!(Keypair::from_hex("not-hex-at-all").is_err());
    }

    #[test]
    fn test_public_key_try_from_slice() {
        let kp = Keypair::generate();
        let pk = PublicKey::try_from_slice(kp.public_key().as_bytes()).unwrap();
        assert_eq!(pk, kp.public_key());
        assert!(PublicKey::try_from_slice(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"test");
        assert_eq!(Signature::from_hex(&sig.to_hex()).unwrap(), sig);
        assert!(Signature::try_from_slice(&[0u8; 63]).is_err());
    }

    #[test]
    fn test_deterministic_signatures() {
        let kp = Keypair::from_seed(&[42u8; 32]);
        assert_eq!(kp.sign(b"same"), kp.sign(b"same"));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::generate();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("Keypair(addr="));
        assert!(!debug_str.contains(&hex::encode(kp.seed_bytes())));
    }
}
