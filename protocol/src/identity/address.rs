//! # Account Addresses
//!
//! An address is the display form of a 32-byte account key:
//!
//! ```text
//! public_key (32 bytes)
//!     -> SHA-512/256(public_key)[28..32]       4-byte checksum
//!     -> base32_nopad(public_key || checksum)  58 characters
//! ```
//!
//! The 32 bytes are not always an Ed25519 point. Multisig accounts and
//! logic-signature accounts use a domain-separated digest in the same slot,
//! and the all-zero value is a legitimate "no address" marker in several
//! transaction fields. All of them go through the same codec.
//!
//! On the wire an address is always the raw 32 bytes, never the string.

use data_encoding::{DecodeKind, BASE32_NOPAD};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ADDRESS_STRING_LENGTH, CHECKSUM_LENGTH, HASH_LENGTH, PUBLIC_KEY_LENGTH};
use crate::crypto::{domain_separated_hash, sha512_256, PublicKey};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from parsing an address string or raw address bytes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must be 58 characters, got {got}")]
    WrongLength { got: usize },

    #[error("address must be 32 bytes, got {got}")]
    WrongByteLength { got: usize },

    #[error("invalid base32 character at position {position}")]
    InvalidCharacter { position: usize },

    /// The string decoded but its embedded checksum does not match the key.
    #[error("address checksum mismatch")]
    ChecksumMismatch,
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 32-byte account address.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; PUBLIC_KEY_LENGTH]);

impl Address {
    /// The all-zero address. Encodes to `AAAA…Y5HFKQ` and is omitted from
    /// canonical encodings wherever it appears as a field value.
    pub const ZERO: Address = Address([0u8; PUBLIC_KEY_LENGTH]);

    pub const fn new(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(*public_key.as_bytes())
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        let arr: [u8; PUBLIC_KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| AddressError::WrongByteLength { got: bytes.len() })?;
        Ok(Self(arr))
    }

    /// The address whose bytes are `SHA-512/256(domain || data)`.
    ///
    /// Program and multisig accounts are derived this way; see
    /// [`crate::logicsig::program_address`] and
    /// [`crate::multisig::MultisigMetadata::address`].
    pub fn from_domain_hash(domain: &[u8], data: &[u8]) -> Self {
        Self(domain_separated_hash(domain, data))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; PUBLIC_KEY_LENGTH]
    }

    /// Interpret the address as an Ed25519 public key.
    ///
    /// No curve check: verification against a non-point simply fails.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_bytes(self.0)
    }

    fn checksum(&self) -> [u8; CHECKSUM_LENGTH] {
        let digest = sha512_256(&self.0);
        let mut out = [0u8; CHECKSUM_LENGTH];
        out.copy_from_slice(&digest[HASH_LENGTH - CHECKSUM_LENGTH..]);
        out
    }

    /// Encode as the 58-character checksummed string.
    pub fn encode(&self) -> String {
        let mut buf = [0u8; PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH];
        buf[..PUBLIC_KEY_LENGTH].copy_from_slice(&self.0);
        buf[PUBLIC_KEY_LENGTH..].copy_from_slice(&self.checksum());
        BASE32_NOPAD.encode(&buf)
    }

    /// Parse and checksum-verify an address string.
    pub fn decode(s: &str) -> Result<Self, AddressError> {
        if s.len() != ADDRESS_STRING_LENGTH {
            return Err(AddressError::WrongLength { got: s.len() });
        }
        let raw = BASE32_NOPAD.decode(s.as_bytes()).map_err(|err| match err.kind {
            // Nonzero padding bits in the final character can only come
            // from corruption of an otherwise well-formed string.
            DecodeKind::Trailing => AddressError::ChecksumMismatch,
            _ => AddressError::InvalidCharacter {
                position: err.position,
            },
        })?;
        if raw.len() != PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH {
            return Err(AddressError::WrongLength { got: s.len() });
        }

        let address = Self::from_slice(&raw[..PUBLIC_KEY_LENGTH])?;
        if address.checksum()[..] != raw[PUBLIC_KEY_LENGTH..] {
            return Err(AddressError::ChecksumMismatch);
        }
        Ok(address)
    }
}

impl From<[u8; PUBLIC_KEY_LENGTH]> for Address {
    fn from(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl From<PublicKey> for Address {
    fn from(public_key: PublicKey) -> Self {
        Self::from_public_key(&public_key)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    const RFC8032_SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const RFC8032_ADDR: &str = "25NJQAMCWEFLPVKL73J4SZAHHIHOC4XT3KTCGJNPAINGR5YHKENMEF5QTE";

    #[test]
    fn test_known_address() {
        let kp = Keypair::from_hex(RFC8032_SEED).unwrap();
        assert_eq!(kp.address().to_string(), RFC8032_ADDR);
    }

    #[test]
    fn test_zero_address_roundtrip() {
        let encoded = Address::ZERO.encode();
        assert_eq!(
            encoded,
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ"
        );
        assert_eq!(Address::decode(&encoded).unwrap(), Address::ZERO);
        assert!(Address::ZERO.is_zero());
    }

    #[test]
    fn test_roundtrip_random_keys() {
        for _ in 0..32 {
            let addr = Keypair::generate().address();
            let s = addr.encode();
            assert_eq!(s.len(), ADDRESS_STRING_LENGTH);
            assert_eq!(s.parse::<Address>().unwrap(), addr);
        }
    }

    #[test]
    fn test_single_character_corruption_is_checksum_error() {
        let original = RFC8032_ADDR.as_bytes();
        for pos in 0..original.len() {
            let mut corrupted = original.to_vec();
            // Swap within the base32 alphabet so the string stays decodable.
            corrupted[pos] = if corrupted[pos] == b'A' { b'B' } else { b'A' };
            let s = String::from_utf8(corrupted).unwrap();
            assert_eq!(
                Address::decode(&s),
                Err(AddressError::ChecksumMismatch),
                "position {pos}"
            );
        }
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert_eq!(
            Address::decode(&RFC8032_ADDR[..57]),
            Err(AddressError::WrongLength { got: 57 })
        );
        assert_eq!(Address::decode(""), Err(AddressError::WrongLength { got: 0 }));
    }

    #[test]
    fn test_lowercase_rejected() {
        let lower = RFC8032_ADDR.to_lowercase();
        assert!(matches!(
            Address::decode(&lower),
            Err(AddressError::InvalidCharacter { .. })
        ));
    }

    #[test]
    fn test_from_slice_length_checked() {
        assert_eq!(
            Address::from_slice(&[1u8; 31]),
            Err(AddressError::WrongByteLength { got: 31 })
        );
        assert!(Address::from_slice(&[1u8; 32]).is_ok());
    }

    #[test]
    fn test_serde_as_string() {
        let addr: Address = RFC8032_ADDR.parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{RFC8032_ADDR}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
