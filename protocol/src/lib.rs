// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # algosig: Canonical Transaction Encoding & Signing
//!
//! The part of a ledger client that has to be byte-exact: turning a
//! transaction's fields into the network's canonical encoding, deriving the
//! identifiers that hash over it, and producing the signatures the network
//! will accept. Get one byte wrong and the transaction is either rejected or,
//! worse, authorizes something other than what the caller meant.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **config**: Domain prefixes, lengths and limits. Consensus values.
//! - **crypto**: SHA-512/256 and Ed25519. Nothing else.
//! - **encoding**: Canonical MessagePack: sorted keys, minimal integers,
//!   omit-empty maps, and a strict decoder that rejects anything else.
//! - **identity**: Checksummed base-32 addresses.
//! - **transaction**: The seven transaction kinds, builder, field table,
//!   ids, groups, signing and the signed envelope.
//! - **multisig**: Threshold accounts and the signature-collection state
//!   machine.
//! - **logicsig**: Program authorization, plain or delegated.
//! - **transport**: The seam an HTTP client plugs into. No client ships here.
//! - **error**: One error type over all of the above, with a coarse
//!   [`ErrorKind`] for deciding what to do next.
//!
//! ## Data flow
//!
//! ```text
//! TransactionBuilder ─▶ Transaction ─▶ canonical bytes ─▶ "TX" || bytes
//!                                            │                  │
//!                                            ▼                  ▼
//!                                      TransactionId    sig / msig / lsig
//!                                                               │
//!                                                               ▼
//!                                                     SignedTransaction ─▶ Submitter
//! ```
//!
//! ## Design Philosophy
//!
//! 1. Everything is a value. Signing, grouping and adding a multisig
//!    subsignature return new values; nothing is mutated in place.
//! 2. Hashes and signatures are computed over canonical bytes only. JSON is
//!    for humans.
//! 3. Decoding is strict. Unknown keys, non-minimal integers and explicit
//!    zero values are rejected rather than normalized.
//! 4. All operations are synchronous and CPU-bound, apart from the
//!    transport seam.

pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod identity;
pub mod logicsig;
pub mod multisig;
pub mod transaction;
pub mod transport;

pub use crypto::{Keypair, PublicKey, Signature};
pub use error::{Error, ErrorKind, Result};
pub use identity::Address;
pub use logicsig::{program_address, LogicSigAuth};
pub use multisig::{MultisigMetadata, MultisigSignatureSet};
pub use transaction::{
    SignedTransaction, Transaction, TransactionBuilder, TransactionId, TransactionType,
};
pub use transport::{submit_signed, Submitter};
