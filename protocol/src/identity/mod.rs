//! # Identity Module
//!
//! Every account on the ledger is named by 32 bytes. For an ordinary account
//! those bytes are an Ed25519 public key; for multisig and logic-signature
//! accounts they are a domain-separated digest. Either way, users see the
//! same 58-character checksummed [`Address`].
//!
//! Key material itself lives in [`crate::crypto::keys`].

pub mod address;

pub use address::{Address, AddressError};
