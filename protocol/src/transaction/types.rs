//! Core type definitions for ledger transactions.
//!
//! A [`Transaction`] is a shared [`Header`] plus exactly one
//! [`TransactionKind`] payload. Payload structs are plain data with public
//! fields; the invariants that span fields are enforced when the payload is
//! combined with a header in [`Transaction::new`], so an incoherent
//! transaction never exists as a value.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TransactionError;
use crate::config::{HASH_LENGTH, STATE_PROOF_KEY_LENGTH, TXID_STRING_LENGTH};
use crate::encoding::base64_serde;
use crate::identity::Address;

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Discriminant for the operation a transaction represents.
///
/// The wire carries the short code from [`TransactionType::wire_code`], not
/// the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Payment,
    KeyRegistration,
    AssetConfig,
    AssetTransfer,
    AssetFreeze,
    ApplicationCall,
    StateProof,
}

impl TransactionType {
    pub const ALL: [TransactionType; 7] = [
        TransactionType::Payment,
        TransactionType::KeyRegistration,
        TransactionType::AssetConfig,
        TransactionType::AssetTransfer,
        TransactionType::AssetFreeze,
        TransactionType::ApplicationCall,
        TransactionType::StateProof,
    ];

    pub fn wire_code(&self) -> &'static str {
        match self {
            Self::Payment => "pay",
            Self::KeyRegistration => "keyreg",
            Self::AssetConfig => "acfg",
            Self::AssetTransfer => "axfer",
            Self::AssetFreeze => "afrz",
            Self::ApplicationCall => "appl",
            Self::StateProof => "stpf",
        }
    }

    pub fn from_wire_code(code: &str) -> Result<Self, TransactionError> {
        Self::ALL
            .into_iter()
            .find(|t| t.wire_code() == code)
            .ok_or_else(|| TransactionError::UnknownType(code.to_string()))
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_code())
    }
}

impl FromStr for TransactionType {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire_code(s)
    }
}

// ---------------------------------------------------------------------------
// OnComplete
// ---------------------------------------------------------------------------

/// What happens to the sender's application state after an application call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnComplete {
    #[default]
    NoOp,
    OptIn,
    CloseOut,
    ClearState,
    UpdateApplication,
    DeleteApplication,
}

impl OnComplete {
    pub fn code(&self) -> u64 {
        match self {
            Self::NoOp => 0,
            Self::OptIn => 1,
            Self::CloseOut => 2,
            Self::ClearState => 3,
            Self::UpdateApplication => 4,
            Self::DeleteApplication => 5,
        }
    }

    pub fn from_code(code: u64) -> Result<Self, TransactionError> {
        match code {
            0 => Ok(Self::NoOp),
            1 => Ok(Self::OptIn),
            2 => Ok(Self::CloseOut),
            3 => Ok(Self::ClearState),
            4 => Ok(Self::UpdateApplication),
            5 => Ok(Self::DeleteApplication),
            other => Err(TransactionError::UnknownOnComplete(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// `SHA-512/256("TX" || canonical bytes)`. Displays as 52 base-32 characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId([u8; HASH_LENGTH]);

impl TransactionId {
    pub fn from_bytes(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&BASE32_NOPAD.encode(&self.0))
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({self})")
    }
}

impl FromStr for TransactionId {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != TXID_STRING_LENGTH {
            return Err(TransactionError::InvalidId(s.to_string()));
        }
        let raw = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|_| TransactionError::InvalidId(s.to_string()))?;
        let bytes: [u8; HASH_LENGTH] = raw
            .try_into()
            .map_err(|_| TransactionError::InvalidId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for TransactionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Identifier binding an atomic group. Displays as base64, as the network's
/// REST interfaces do.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId([u8; HASH_LENGTH]);

impl GroupId {
    pub fn from_bytes(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&STANDARD.encode(self.0))
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({self})")
    }
}

impl Serialize for GroupId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Fields every transaction carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub sender: Address,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    #[serde(with = "base64_serde::bytes")]
    pub genesis_hash: [u8; HASH_LENGTH],
    #[serde(with = "base64_serde::option", default)]
    pub note: Option<Vec<u8>>,
    #[serde(with = "base64_serde::option", default)]
    pub lease: Option<[u8; HASH_LENGTH]>,
    #[serde(default)]
    pub rekey_to: Option<Address>,
    #[serde(with = "base64_serde::option", default)]
    pub group: Option<[u8; HASH_LENGTH]>,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub receiver: Address,
    pub amount: u64,
    #[serde(default)]
    pub close_remainder_to: Option<Address>,
}

/// Participation keys for an online key registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    #[serde(with = "base64_serde::bytes")]
    pub vote_key: [u8; 32],
    #[serde(with = "base64_serde::bytes")]
    pub selection_key: [u8; 32],
    #[serde(with = "base64_serde::option", default)]
    pub state_proof_key: Option<[u8; STATE_PROOF_KEY_LENGTH]>,
    pub vote_first: u64,
    pub vote_last: u64,
    pub vote_key_dilution: u64,
}

/// `participation: None` takes the account offline. `non_participation`
/// additionally marks it as never participating again and is only legal
/// when going offline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRegistration {
    pub participation: Option<Participation>,
    #[serde(default)]
    pub non_participation: bool,
}

/// Parameters of an asset, as set at creation or reconfiguration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetParams {
    pub total: u64,
    pub decimals: u32,
    #[serde(default)]
    pub default_frozen: bool,
    #[serde(default)]
    pub unit_name: String,
    #[serde(default)]
    pub asset_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(with = "base64_serde::option", default)]
    pub metadata_hash: Option<[u8; 32]>,
    #[serde(default)]
    pub manager: Option<Address>,
    #[serde(default)]
    pub reserve: Option<Address>,
    #[serde(default)]
    pub freeze: Option<Address>,
    #[serde(default)]
    pub clawback: Option<Address>,
}

impl AssetParams {
    /// `true` when every field holds its zero value, so the parameters
    /// would vanish from the encoding entirely.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// `asset_id == 0` creates an asset from `params`. With an asset id,
/// `Some(params)` reconfigures it and `None` destroys it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub asset_id: u64,
    pub params: Option<AssetParams>,
}

/// An opt-in is a zero-amount transfer to oneself. `revocation_target` makes
/// it a clawback, sent by the asset's clawback account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTransfer {
    pub asset_id: u64,
    pub amount: u64,
    pub receiver: Address,
    #[serde(default)]
    pub close_to: Option<Address>,
    #[serde(default)]
    pub revocation_target: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFreeze {
    pub asset_id: u64,
    pub freeze_account: Address,
    pub frozen: bool,
}

/// Storage an application reserves, global or per account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateSchema {
    pub num_uints: u64,
    pub num_byte_slices: u64,
}

impl StateSchema {
    pub fn is_empty(&self) -> bool {
        self.num_uints == 0 && self.num_byte_slices == 0
    }
}

/// Application call. `app_id == 0` creates an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCall {
    pub app_id: u64,
    pub on_complete: OnComplete,
    #[serde(with = "base64_serde::bytes", default)]
    pub approval_program: Vec<u8>,
    #[serde(with = "base64_serde::bytes", default)]
    pub clear_program: Vec<u8>,
    #[serde(with = "base64_serde::list", default)]
    pub args: Vec<Vec<u8>>,
    #[serde(default)]
    pub accounts: Vec<Address>,
    #[serde(default)]
    pub foreign_apps: Vec<u64>,
    #[serde(default)]
    pub foreign_assets: Vec<u64>,
    #[serde(default)]
    pub global_schema: StateSchema,
    #[serde(default)]
    pub local_schema: StateSchema,
    #[serde(default)]
    pub extra_pages: u32,
}

/// The message a state proof attests to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateProofMessage {
    #[serde(with = "base64_serde::bytes", default)]
    pub block_headers_commitment: Vec<u8>,
    #[serde(with = "base64_serde::bytes", default)]
    pub voters_commitment: Vec<u8>,
    pub ln_proven_weight: u64,
    pub first_attested_round: u64,
    pub last_attested_round: u64,
}

/// State proof transaction. The proof body is carried as an already encoded
/// canonical map and is passed through without interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateProof {
    pub state_proof_type: u64,
    #[serde(with = "base64_serde::bytes", default)]
    pub state_proof: Vec<u8>,
    pub message: Option<StateProofMessage>,
}

/// The kind-specific half of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TransactionKind {
    Payment(Payment),
    KeyRegistration(KeyRegistration),
    AssetConfig(AssetConfig),
    AssetTransfer(AssetTransfer),
    AssetFreeze(AssetFreeze),
    ApplicationCall(ApplicationCall),
    StateProof(StateProof),
}

impl TransactionKind {
    pub fn tx_type(&self) -> TransactionType {
        match self {
            Self::Payment(_) => TransactionType::Payment,
            Self::KeyRegistration(_) => TransactionType::KeyRegistration,
            Self::AssetConfig(_) => TransactionType::AssetConfig,
            Self::AssetTransfer(_) => TransactionType::AssetTransfer,
            Self::AssetFreeze(_) => TransactionType::AssetFreeze,
            Self::ApplicationCall(_) => TransactionType::ApplicationCall,
            Self::StateProof(_) => TransactionType::StateProof,
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A validated, normalized transaction.
///
/// Construct with [`Transaction::new`] or
/// [`TransactionBuilder`](super::TransactionBuilder). Fields are read-only;
/// "changing" a transaction (for example assigning a group) yields a new
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub(super) header: Header,
    #[serde(flatten)]
    pub(super) kind: TransactionKind,
}

impl Transaction {
    /// Validate and normalize `header` and `kind` into a transaction.
    ///
    /// Normalization maps the explicit-zero spelling of an optional field
    /// (`Some` of an empty note, an all-zero lease/group/address, empty
    /// reconfiguration params) to `None`, so that values that encode
    /// identically also compare equal.
    pub fn new(header: Header, kind: TransactionKind) -> Result<Self, TransactionError> {
        let mut txn = Self { header, kind };
        txn.normalize();
        txn.validate()?;
        Ok(txn)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn kind(&self) -> &TransactionKind {
        &self.kind
    }

    pub fn tx_type(&self) -> TransactionType {
        self.kind.tx_type()
    }

    pub fn sender(&self) -> &Address {
        &self.header.sender
    }

    pub fn fee(&self) -> u64 {
        self.header.fee
    }

    pub fn group(&self) -> Option<&[u8; HASH_LENGTH]> {
        self.header.group.as_ref()
    }

    /// A copy carrying `group` in place of the current group id.
    pub fn with_group(&self, group: Option<[u8; HASH_LENGTH]>) -> Self {
        let mut txn = self.clone();
        txn.header.group = group.filter(|g| g.iter().any(|b| *b != 0));
        txn
    }

    /// A copy with a different fee. Fee carries no cross-field invariant.
    pub fn with_fee(&self, fee: u64) -> Self {
        let mut txn = self.clone();
        txn.header.fee = fee;
        txn
    }

    fn normalize(&mut self) {
        let h = &mut self.header;
        h.note = h.note.take().filter(|n| !n.is_empty());
        h.lease = h.lease.filter(non_zero);
        h.group = h.group.filter(non_zero);
        h.rekey_to = h.rekey_to.filter(|a| !a.is_zero());

        match &mut self.kind {
            TransactionKind::Payment(p) => {
                p.close_remainder_to = p.close_remainder_to.filter(|a| !a.is_zero());
            }
            TransactionKind::KeyRegistration(k) => {
                if let Some(part) = &mut k.participation {
                    part.state_proof_key = part.state_proof_key.filter(non_zero);
                }
            }
            TransactionKind::AssetConfig(c) => {
                if let Some(params) = &mut c.params {
                    params.metadata_hash = params.metadata_hash.filter(non_zero);
                    for addr in [
                        &mut params.manager,
                        &mut params.reserve,
                        &mut params.freeze,
                        &mut params.clawback,
                    ] {
                        *addr = addr.filter(|a| !a.is_zero());
                    }
                }
                if c.asset_id == 0 {
                    c.params.get_or_insert_with(AssetParams::default);
                } else if c.params.as_ref().is_some_and(AssetParams::is_empty) {
                    c.params = None;
                }
            }
            TransactionKind::AssetTransfer(t) => {
                t.close_to = t.close_to.filter(|a| !a.is_zero());
                t.revocation_target = t.revocation_target.filter(|a| !a.is_zero());
            }
            TransactionKind::StateProof(s) => {
                if s.message.as_ref().is_some_and(|m| *m == StateProofMessage::default()) {
                    s.message = None;
                }
            }
            TransactionKind::AssetFreeze(_) | TransactionKind::ApplicationCall(_) => {}
        }
    }
}

fn non_zero<const N: usize>(bytes: &[u8; N]) -> bool {
    bytes.iter().any(|b| *b != 0)
}
