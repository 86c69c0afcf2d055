//! # Multisignature Aggregation
//!
//! A multisig account is an ordered list of member keys plus a threshold.
//! Its address commits to the version, the threshold and the member list in
//! order, so the same keys in a different order are a different account.
//!
//! Signatures are collected into a [`MultisigSignatureSet`], one slot per
//! member:
//!
//! ```text
//! Empty ──add──▶ Partial ──add──▶ Complete ──finalize──▶ MultisigAuthorization
//!                  ▲   │
//!                  └───┘ add / merge
//! ```
//!
//! Sets are values. `add_signature` and `merge` return a new set and leave
//! their inputs alone, so partially signed blobs can be passed between
//! signers and combined in any order.
//!
//! ## Invalid slots
//!
//! `finalize` verifies every populated slot. A slot holding a signature that
//! does not verify is counted as absent toward the threshold, logged, and
//! emitted empty in the final authorization. Finalize fails only if the
//! remaining valid count is below the threshold, and the error reports both
//! counts. [`MultisigSignatureSet::audit`] exposes the per-slot picture.
//!
//! ## Wire form
//!
//! ```text
//! msig: { subsig: [ { pk: <32>, s: <64>? }, ... ], thr: <u>, v: <u> }
//! ```

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{MULTISIG_ADDR_DOMAIN, MULTISIG_VERSION, SIGNATURE_LENGTH};
use crate::crypto::{batch_verify, Keypair, PublicKey, Signature, SignatureError};
use crate::encoding::{CanonicalMap, EncodingError, MapReader, Value};
use crate::error::ErrorKind;
use crate::identity::Address;

/// The largest member list a one-byte threshold can address.
const MAX_MEMBERS: usize = u8::MAX as usize;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MultisigError {
    #[error("unsupported multisig version {version}")]
    UnsupportedVersion { version: u8 },

    #[error("threshold {threshold} is invalid for {members} members")]
    InvalidThreshold { threshold: u8, members: usize },

    #[error("too many multisig members: {count}")]
    TooManyMembers { count: usize },

    #[error("member index {index} out of range for {members} members")]
    IndexOutOfRange { index: usize, members: usize },

    #[error("key is not a member of this multisig account")]
    NotAMember,

    #[error("a different signature is already present for member {index}")]
    ConflictingSignature { index: usize },

    #[error("multisig metadata does not match")]
    MetadataMismatch,

    #[error("threshold not met: {valid} valid signatures ({invalid} invalid), {threshold} required")]
    ThresholdNotMet {
        valid: usize,
        invalid: usize,
        threshold: u8,
    },

    #[error("signature for member {index} does not verify")]
    InvalidSignature { index: usize },

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl MultisigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MultisigError::InvalidSignature { .. } => ErrorKind::Verification,
            MultisigError::ConflictingSignature { .. }
            | MultisigError::MetadataMismatch
            | MultisigError::ThresholdNotMet { .. } => ErrorKind::Policy,
            _ => ErrorKind::Malformed,
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Version, threshold and ordered member keys of a multisig account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MultisigMetadata {
    version: u8,
    threshold: u8,
    members: Vec<PublicKey>,
}

impl MultisigMetadata {
    pub fn new(version: u8, threshold: u8, members: Vec<PublicKey>) -> Result<Self, MultisigError> {
        if version != MULTISIG_VERSION {
            return Err(MultisigError::UnsupportedVersion { version });
        }
        if members.len() > MAX_MEMBERS {
            return Err(MultisigError::TooManyMembers {
                count: members.len(),
            });
        }
        if threshold == 0 || usize::from(threshold) > members.len() {
            return Err(MultisigError::InvalidThreshold {
                threshold,
                members: members.len(),
            });
        }
        Ok(Self {
            version,
            threshold,
            members,
        })
    }

    /// Build from member addresses, the form users usually have at hand.
    pub fn from_addresses(
        version: u8,
        threshold: u8,
        members: &[Address],
    ) -> Result<Self, MultisigError> {
        Self::new(
            version,
            threshold,
            members.iter().map(Address::public_key).collect(),
        )
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn members(&self) -> &[PublicKey] {
        &self.members
    }

    /// `SHA-512/256("MultisigAddr" || version || threshold || pk_1 || .. || pk_n)`.
    pub fn address(&self) -> Address {
        let mut preimage = Vec::with_capacity(2 + self.members.len() * 32);
        preimage.push(self.version);
        preimage.push(self.threshold);
        for member in &self.members {
            preimage.extend_from_slice(member.as_bytes());
        }
        Address::from_domain_hash(MULTISIG_ADDR_DOMAIN, &preimage)
    }

    /// Position of `key` in the member list. A key listed more than once
    /// resolves to its first position.
    pub fn index_of(&self, key: &PublicKey) -> Option<usize> {
        self.members.iter().position(|m| m == key)
    }
}

// ---------------------------------------------------------------------------
// Signature set
// ---------------------------------------------------------------------------

/// How far a set has progressed, counting populated slots without
/// verifying them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultisigState {
    Empty,
    Partial,
    Complete,
}

/// Per-slot result of [`MultisigSignatureSet::audit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// The member has not signed.
    Empty,
    Valid,
    /// A signature is present but does not verify for this member.
    Invalid,
}

/// Signatures collected so far for one message, aligned to the member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigSignatureSet {
    metadata: MultisigMetadata,
    slots: Vec<Option<Signature>>,
}

impl MultisigSignatureSet {
    pub fn new(metadata: MultisigMetadata) -> Self {
        let slots = vec![None; metadata.members.len()];
        Self { metadata, slots }
    }

    pub fn metadata(&self) -> &MultisigMetadata {
        &self.metadata
    }

    pub fn address(&self) -> Address {
        self.metadata.address()
    }

    pub fn signature(&self, index: usize) -> Option<&Signature> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn signature_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn state(&self) -> MultisigState {
        match self.signature_count() {
            0 => MultisigState::Empty,
            n if n < usize::from(self.metadata.threshold) => MultisigState::Partial,
            _ => MultisigState::Complete,
        }
    }

    /// Return a new set with `signature` in slot `index`.
    ///
    /// Re-adding the identical signature is a no-op; a different one is a
    /// conflict.
    pub fn add_signature(&self, index: usize, signature: Signature) -> Result<Self, MultisigError> {
        let members = self.slots.len();
        let slot = self
            .slots
            .get(index)
            .ok_or(MultisigError::IndexOutOfRange { index, members })?;
        match slot {
            Some(existing) if *existing != signature => {
                Err(MultisigError::ConflictingSignature { index })
            }
            _ => {
                let mut next = self.clone();
                next.slots[index] = Some(signature);
                Ok(next)
            }
        }
    }

    /// Sign `message` with `keypair` and add the result in the keypair's slot.
    pub fn sign(&self, message: &[u8], keypair: &Keypair) -> Result<Self, MultisigError> {
        let index = self
            .metadata
            .index_of(&keypair.public_key())
            .ok_or(MultisigError::NotAMember)?;
        self.add_signature(index, keypair.sign(message))
    }

    /// Union of two sets over the same metadata.
    pub fn merge(&self, other: &Self) -> Result<Self, MultisigError> {
        if self.metadata != other.metadata {
            return Err(MultisigError::MetadataMismatch);
        }
        let mut merged = self.clone();
        for (index, theirs) in other.slots.iter().enumerate() {
            match (&merged.slots[index], theirs) {
                (Some(a), Some(b)) if a != b => {
                    return Err(MultisigError::ConflictingSignature { index });
                }
                (None, Some(b)) => merged.slots[index] = Some(*b),
                _ => {}
            }
        }
        Ok(merged)
    }

    /// Verify each populated slot against its member and `message`.
    pub fn audit(&self, message: &[u8]) -> Vec<SlotStatus> {
        self.slots
            .iter()
            .zip(&self.metadata.members)
            .map(|(slot, member)| match slot {
                None => SlotStatus::Empty,
                Some(sig) if member.verify(message, sig) => SlotStatus::Valid,
                Some(_) => SlotStatus::Invalid,
            })
            .collect()
    }

    /// Produce the authorization for `message` if enough members signed it.
    ///
    /// Invalid slots are dropped from the output and reported through
    /// `tracing`; see the module docs.
    pub fn finalize(&self, message: &[u8]) -> Result<MultisigAuthorization, MultisigError> {
        let audit = self.audit(message);
        let mut slots = Vec::with_capacity(self.slots.len());
        let (mut valid, mut invalid) = (0usize, 0usize);
        for (index, (status, slot)) in audit.iter().zip(&self.slots).enumerate() {
            match status {
                SlotStatus::Valid => {
                    valid += 1;
                    slots.push(*slot);
                }
                SlotStatus::Invalid => {
                    invalid += 1;
                    warn!(
                        index,
                        address = %Address::from_public_key(&self.metadata.members[index]),
                        "multisig slot holds a signature that does not verify"
                    );
                    slots.push(None);
                }
                SlotStatus::Empty => slots.push(None),
            }
        }

        let threshold = self.metadata.threshold;
        if valid < usize::from(threshold) {
            return Err(MultisigError::ThresholdNotMet {
                valid,
                invalid,
                threshold,
            });
        }
        debug!(
            address = %self.address(),
            valid,
            invalid,
            threshold,
            "multisig finalized"
        );
        Ok(MultisigAuthorization {
            set: Self {
                metadata: self.metadata.clone(),
                slots,
            },
        })
    }

    /// Strict check used on received blobs: every present signature must
    /// verify and there must be at least `threshold` of them.
    pub fn verify(&self, message: &[u8]) -> Result<(), MultisigError> {
        let present: Vec<(usize, (PublicKey, Signature))> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|sig| (i, (self.metadata.members[i], sig))))
            .collect();
        let count = present.len();
        if count < usize::from(self.metadata.threshold) {
            return Err(MultisigError::ThresholdNotMet {
                valid: count,
                invalid: 0,
                threshold: self.metadata.threshold,
            });
        }
        let (indices, items): (Vec<usize>, Vec<(PublicKey, Signature)>) = present.into_iter().unzip();
        batch_verify(message, &items).map_err(|err| match err {
            SignatureError::BatchItemFailed { index } => MultisigError::InvalidSignature {
                index: indices[index],
            },
            SignatureError::VerificationFailed => MultisigError::InvalidSignature { index: 0 },
        })
    }

    // -- wire form ---------------------------------------------------------

    pub fn to_canonical_map(&self) -> Result<CanonicalMap, EncodingError> {
        let mut subsigs = Vec::with_capacity(self.slots.len());
        for (member, slot) in self.metadata.members.iter().zip(&self.slots) {
            let mut entry = CanonicalMap::new();
            entry.insert_fixed("pk", member.as_bytes())?;
            if let Some(sig) = slot {
                entry.insert_fixed("s", sig.as_bytes())?;
            }
            subsigs.push(Value::Map(entry));
        }
        let mut map = CanonicalMap::new();
        map.insert_array("subsig", subsigs)?;
        map.insert_uint("thr", u64::from(self.metadata.threshold))?;
        map.insert_uint("v", u64::from(self.metadata.version))?;
        Ok(map)
    }

    pub fn from_canonical_map(map: CanonicalMap) -> Result<Self, MultisigError> {
        let mut reader = MapReader::new(map, "msig");
        let version = narrow(reader.uint("v")?, "msig.v")?;
        let threshold = narrow(reader.uint("thr")?, "msig.thr")?;

        let mut members = Vec::new();
        let mut slots = Vec::new();
        for item in reader.array("subsig")? {
            let entry = match item {
                Value::Map(entry) => entry,
                other => {
                    return Err(EncodingError::TypeMismatch {
                        field: "msig.subsig".into(),
                        expected: "map",
                        found: other.type_name(),
                    }
                    .into())
                }
            };
            let mut sub = MapReader::new(entry, "subsig");
            members.push(PublicKey::from_bytes(sub.fixed::<32>("pk")?.unwrap_or_default()));
            slots.push(sub.fixed::<SIGNATURE_LENGTH>("s")?.map(Signature::from_bytes));
            sub.finish()?;
        }
        reader.finish()?;

        Ok(Self {
            metadata: MultisigMetadata::new(version, threshold, members)?,
            slots,
        })
    }
}

fn narrow(value: u64, field: &str) -> Result<u8, EncodingError> {
    u8::try_from(value).map_err(|_| EncodingError::TypeMismatch {
        field: field.to_string(),
        expected: "u8",
        found: "uint",
    })
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// A finalized multisig: every signature it carries verified for the
/// message it was finalized against, and there are at least `threshold` of
/// them. Only [`MultisigSignatureSet::finalize`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigAuthorization {
    set: MultisigSignatureSet,
}

impl MultisigAuthorization {
    pub fn metadata(&self) -> &MultisigMetadata {
        &self.set.metadata
    }

    pub fn address(&self) -> Address {
        self.set.address()
    }

    pub fn signature_count(&self) -> usize {
        self.set.signature_count()
    }

    /// Re-check against `message`.
    pub fn verify(&self, message: &[u8]) -> Result<(), MultisigError> {
        self.set.verify(message)
    }

    pub fn as_signature_set(&self) -> &MultisigSignatureSet {
        &self.set
    }

    pub fn into_signature_set(self) -> MultisigSignatureSet {
        self.set
    }

    pub fn to_canonical_map(&self) -> Result<CanonicalMap, EncodingError> {
        self.set.to_canonical_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{decode_map_canonical, encode_map};

    fn keys(n: usize) -> Vec<Keypair> {
        (0..n).map(|i| Keypair::from_seed(&[i as u8 + 1; 32])).collect()
    }

    fn metadata(kps: &[Keypair], threshold: u8) -> MultisigMetadata {
        MultisigMetadata::new(1, threshold, kps.iter().map(Keypair::public_key).collect()).unwrap()
    }

    #[test]
    fn test_known_address() {
        let a = Keypair::from_hex("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60").unwrap();
        let b = Keypair::from_hex("4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb").unwrap();
        let meta = MultisigMetadata::new(1, 2, vec![a.public_key(), b.public_key()]).unwrap();
        assert_eq!(
            meta.address().to_string(),
            "SZ6HGQIERV62HXFQB4SJWYLNUNYR53ERT3UJTB22OS2D32JWMT3Q6CY4F4"
        );
    }

    #[test]
    fn test_member_order_changes_address() {
        let kps = keys(3);
        let forward = metadata(&kps, 2);
        let mut reversed_keys: Vec<PublicKey> = kps.iter().map(Keypair::public_key).collect();
        reversed_keys.reverse();
        let reversed = MultisigMetadata::new(1, 2, reversed_keys).unwrap();
        assert_ne!(forward.address(), reversed.address());
    }

    #[test]
    fn test_metadata_validation() {
        let pks: Vec<PublicKey> = keys(2).iter().map(Keypair::public_key).collect();
        assert_eq!(
            MultisigMetadata::new(2, 1, pks.clone()),
            Err(MultisigError::UnsupportedVersion { version: 2 })
        );
        assert_eq!(
            MultisigMetadata::new(1, 0, pks.clone()),
            Err(MultisigError::InvalidThreshold { threshold: 0, members: 2 })
        );
        assert_eq!(
            MultisigMetadata::new(1, 3, pks),
            Err(MultisigError::InvalidThreshold { threshold: 3, members: 2 })
        );
    }

    #[test]
    fn test_state_transitions() {
        let kps = keys(3);
        let msg = b"TXpayload";
        let set = MultisigSignatureSet::new(metadata(&kps, 2));
        assert_eq!(set.state(), MultisigState::Empty);
        let set = set.sign(msg, &kps[0]).unwrap();
        assert_eq!(set.state(), MultisigState::Partial);
        let set = set.sign(msg, &kps[2]).unwrap();
        assert_eq!(set.state(), MultisigState::Complete);
    }

    #[test]
    fn test_add_is_pure() {
        let kps = keys(2);
        let empty = MultisigSignatureSet::new(metadata(&kps, 1));
        let signed = empty.sign(b"m", &kps[0]).unwrap();
        assert_eq!(empty.signature_count(), 0);
        assert_eq!(signed.signature_count(), 1);
    }

    #[test]
    fn test_add_out_of_range() {
        let kps = keys(2);
        let set = MultisigSignatureSet::new(metadata(&kps, 1));
        let sig = kps[0].sign(b"m");
        assert_eq!(
            set.add_signature(2, sig),
            Err(MultisigError::IndexOutOfRange { index: 2, members: 2 })
        );
    }

    #[test]
    fn test_add_conflict_and_idempotent_readd() {
        let kps = keys(2);
        let set = MultisigSignatureSet::new(metadata(&kps, 1));
        let sig = kps[0].sign(b"m");
        let set = set.add_signature(0, sig).unwrap();
        assert_eq!(set.add_signature(0, sig).unwrap(), set);
        let other = kps[0].sign(b"different");
        assert_eq!(
            set.add_signature(0, other),
            Err(MultisigError::ConflictingSignature { index: 0 })
        );
    }

    #[test]
    fn test_non_member_cannot_sign() {
        let kps = keys(2);
        let outsider = Keypair::from_seed(&[99u8; 32]);
        let set = MultisigSignatureSet::new(metadata(&kps, 1));
        assert_eq!(set.sign(b"m", &outsider), Err(MultisigError::NotAMember));
    }

    #[test]
    fn test_merge_union() {
        let kps = keys(3);
        let msg = b"m";
        let base = MultisigSignatureSet::new(metadata(&kps, 2));
        let a = base.sign(msg, &kps[0]).unwrap();
        let b = base.sign(msg, &kps[1]).unwrap();
        let ab = a.merge(&b).unwrap();
        let ba = b.merge(&a).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.signature_count(), 2);
        assert!(ab.finalize(msg).is_ok());
    }

    #[test]
    fn test_merge_metadata_mismatch() {
        let kps = keys(3);
        let a = MultisigSignatureSet::new(metadata(&kps, 2));
        let b = MultisigSignatureSet::new(metadata(&kps, 1));
        assert_eq!(a.merge(&b), Err(MultisigError::MetadataMismatch));
    }

    #[test]
    fn test_merge_conflict() {
        let kps = keys(2);
        let base = MultisigSignatureSet::new(metadata(&kps, 1));
        let a = base.sign(b"one", &kps[0]).unwrap();
        let b = base.sign(b"two", &kps[0]).unwrap();
        assert_eq!(a.merge(&b), Err(MultisigError::ConflictingSignature { index: 0 }));
    }

    #[test]
    fn test_finalize_below_threshold() {
        let kps = keys(3);
        let set = MultisigSignatureSet::new(metadata(&kps, 2))
            .sign(b"m", &kps[1])
            .unwrap();
        assert_eq!(
            set.finalize(b"m"),
            Err(MultisigError::ThresholdNotMet { valid: 1, invalid: 0, threshold: 2 })
        );
    }

    #[test]
    fn test_invalid_slot_counts_as_absent() {
        let kps = keys(3);
        let msg = b"m";
        let set = MultisigSignatureSet::new(metadata(&kps, 2))
            .sign(msg, &kps[0])
            .unwrap()
            .sign(msg, &kps[1])
            .unwrap()
            // Member 2 signed the wrong message.
            .sign(b"not m", &kps[2])
            .unwrap();
        assert_eq!(
            set.audit(msg),
            vec![SlotStatus::Valid, SlotStatus::Valid, SlotStatus::Invalid]
        );

        let auth = set.finalize(msg).unwrap();
        assert_eq!(auth.signature_count(), 2);
        assert!(auth.as_signature_set().signature(2).is_none());
        assert!(auth.verify(msg).is_ok());

        // The raw set fails the strict check because of the bad slot.
        assert_eq!(set.verify(msg), Err(MultisigError::InvalidSignature { index: 2 }));
    }

    #[test]
    fn test_invalid_slot_can_block_threshold() {
        let kps = keys(2);
        let msg = b"m";
        let set = MultisigSignatureSet::new(metadata(&kps, 2))
            .sign(msg, &kps[0])
            .unwrap()
            .sign(b"other", &kps[1])
            .unwrap();
        assert_eq!(
            set.finalize(msg),
            Err(MultisigError::ThresholdNotMet { valid: 1, invalid: 1, threshold: 2 })
        );
    }

    #[test]
    fn test_wire_roundtrip_keeps_empty_slots() {
        let kps = keys(3);
        let set = MultisigSignatureSet::new(metadata(&kps, 2))
            .sign(b"m", &kps[1])
            .unwrap();
        let bytes = encode_map(&set.to_canonical_map().unwrap()).unwrap();
        let map = decode_map_canonical(&bytes).unwrap();
        let back = MultisigSignatureSet::from_canonical_map(map).unwrap();
        assert_eq!(back, set);
        assert!(back.signature(0).is_none());
        assert!(back.signature(1).is_some());
    }
}
