//! # Transaction Module
//!
//! Construction, canonical encoding, grouping, signing and verification of
//! ledger transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs       : Transaction, Header, per-kind payloads, ids, wire enums
//! builder.rs     : Fluent TransactionBuilder and SuggestedParams
//! canonical.rs   : Transaction <-> canonical field map (the field table)
//! group.rs       : Atomic group id computation and assignment
//! signing.rs     : Signing bytes, single/multisig/logic-sig signing, fees
//! signed.rs      : SignedTransaction and its wire form
//! verification.rs: Structural validation and authorization checks
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: [`TransactionBuilder`] or [`Transaction::new`] validate
//!    and normalize the fields.
//! 2. **Group** (optional): [`assign_group_id`] binds several transactions.
//! 3. **Sign**: [`sign_transaction`], [`sign_multisig_transaction`] or
//!    [`sign_logic_sig_transaction`] produce a [`SignedTransaction`].
//! 4. **Submit**: hand [`SignedTransaction::to_bytes`] to a
//!    [`Submitter`](crate::transport::Submitter).
//!
//! ## Design Decisions
//!
//! - Identifiers and signatures are computed over the canonical encoding
//!   with the `TX` domain prefix, never over JSON or any other rendering.
//! - All amounts, fees and rounds are `u64`. There are no negative values on
//!   the wire.
//! - Optional fields are `Option`s in the model and are omitted from the
//!   encoding when absent. Where the protocol treats zero as absent (a zero
//!   amount, an all-zero address) the field table in `canonical.rs` says so.

pub mod builder;
pub mod canonical;
pub mod group;
pub mod signed;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{SuggestedParams, TransactionBuilder};
pub use group::{assign_group_id, assign_group_id_for, compute_group_id};
pub use signed::{Authorization, SignedTransaction};
pub use signing::{
    append_multisig_signature, bytes_to_sign, estimate_size, finalize_multisig_transaction,
    merge_multisig_transactions, sign_logic_sig_transaction, sign_logic_sig_transaction_for,
    sign_multisig_transaction, sign_transaction,
};
pub use types::{
    ApplicationCall, AssetConfig, AssetFreeze, AssetParams, AssetTransfer, GroupId, Header,
    KeyRegistration, OnComplete, Participation, Payment, StateProof, StateProofMessage,
    StateSchema, Transaction, TransactionId, TransactionKind, TransactionType,
};

use thiserror::Error;

use crate::crypto::SignatureError;
use crate::encoding::EncodingError;
use crate::error::ErrorKind;
use crate::logicsig::LogicSigError;
use crate::multisig::MultisigError;

/// Errors from building, decoding, grouping or verifying transactions.
///
/// Each variant maps to a specific rule, with enough context to find the
/// offending field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransactionError {
    /// A field was set that the transaction kind does not carry.
    #[error("field `{field}` is not allowed on a {kind} transaction")]
    FieldNotAllowed {
        field: &'static str,
        kind: TransactionType,
    },

    #[error("required field `{field}` is missing")]
    MissingField { field: &'static str },

    #[error("first valid round {first_valid} is after last valid round {last_valid}")]
    InvalidValidityWindow { first_valid: u64, last_valid: u64 },

    #[error("field `{field}` is {got} bytes long, maximum is {max}")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        got: usize,
    },

    #[error("field `{field}` has {got} entries, maximum is {max}")]
    TooManyEntries {
        field: &'static str,
        max: usize,
        got: usize,
    },

    #[error("field `{field}` is invalid: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    #[error("unknown transaction type `{0}`")]
    UnknownType(String),

    #[error("unknown on-completion code {0}")]
    UnknownOnComplete(u64),

    #[error("invalid transaction id `{0}`")]
    InvalidId(String),

    #[error("a group holds 1 to 16 transactions, got {got}")]
    InvalidGroupSize { got: usize },

    /// A signed transaction must carry exactly one of `sig`, `msig`, `lsig`.
    #[error("signed transaction carries {count} authorizations, expected exactly one")]
    AuthorizationCount { count: usize },

    #[error("authorization is for {found}, transaction must be authorized by {expected}")]
    AuthorizerMismatch { expected: String, found: String },

    #[error("the signed transaction is not a multisig transaction")]
    NotMultisig,

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Multisig(#[from] MultisigError),

    #[error(transparent)]
    LogicSig(#[from] LogicSigError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl TransactionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransactionError::Signature(_) | TransactionError::AuthorizerMismatch { .. } => {
                ErrorKind::Verification
            }
            TransactionError::Multisig(e) => e.kind(),
            TransactionError::LogicSig(e) => e.kind(),
            _ => ErrorKind::Malformed,
        }
    }
}
