//! Transaction construction via the builder pattern.
//!
//! [`TransactionBuilder`] accepts any field in any order, then `build()`
//! checks that every field set belongs to the declared kind, assembles the
//! payload and hands it to [`Transaction::new`] for validation. Setting an
//! asset-transfer field on a payment is an error, not a silently ignored
//! value.
//!
//! The builder does not sign; that happens in [`super::signing`].

use serde::{Deserialize, Serialize};

use super::signing::estimate_size;
use super::types::*;
use super::TransactionError;
use crate::config::{HASH_LENGTH, MIN_TXN_FEE, STATE_PROOF_KEY_LENGTH};
use crate::encoding::base64_serde;
use crate::identity::Address;

// ---------------------------------------------------------------------------
// SuggestedParams
// ---------------------------------------------------------------------------

/// Network parameters a transaction is built against, usually fetched from
/// a node just before building.
///
/// With `flat_fee == false`, `fee` is a per-byte rate and the final fee is
/// `max(MIN_TXN_FEE, fee * estimated_size)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedParams {
    pub fee: u64,
    #[serde(default)]
    pub flat_fee: bool,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    #[serde(with = "base64_serde::bytes")]
    pub genesis_hash: [u8; HASH_LENGTH],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeeMode {
    Flat(u64),
    PerByte(u64),
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Transaction`] values.
///
/// # Usage
///
/// ```
/// use algosig::crypto::Keypair;
/// use algosig::transaction::{TransactionBuilder, TransactionType};
///
/// let alice = Keypair::generate().address();
/// let bob = Keypair::generate().address();
/// let txn = TransactionBuilder::new(TransactionType::Payment)
///     .sender(alice)
///     .receiver(bob)
///     .amount(5_000_000)
///     .fee(1_000)
///     .first_valid(100)
///     .last_valid(1_100)
///     .genesis_id("testnet-v1.0")
///     .genesis_hash([7u8; 32])
///     .build()
///     .unwrap();
/// assert_eq!(txn.fee(), 1_000);
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    tx_type: TransactionType,
    touched: Vec<&'static str>,

    sender: Option<Address>,
    fee: FeeMode,
    first_valid: u64,
    last_valid: u64,
    genesis_id: String,
    genesis_hash: Option<[u8; HASH_LENGTH]>,
    note: Option<Vec<u8>>,
    lease: Option<[u8; HASH_LENGTH]>,
    rekey_to: Option<Address>,
    group: Option<[u8; HASH_LENGTH]>,

    receiver: Option<Address>,
    amount: Option<u64>,
    close_remainder_to: Option<Address>,

    vote_key: Option<[u8; 32]>,
    selection_key: Option<[u8; 32]>,
    state_proof_key: Option<[u8; STATE_PROOF_KEY_LENGTH]>,
    vote_first: Option<u64>,
    vote_last: Option<u64>,
    vote_key_dilution: Option<u64>,
    non_participation: Option<bool>,

    asset_id: Option<u64>,
    params: AssetParams,
    revocation_target: Option<Address>,
    freeze_account: Option<Address>,
    frozen: Option<bool>,

    app: ApplicationCall,

    state_proof_type: Option<u64>,
    state_proof: Option<Vec<u8>>,
    state_proof_message: Option<StateProofMessage>,
}

/// Generates a setter that records which kind-specific field was touched.
macro_rules! kind_setter {
    ($(#[$doc:meta])* $name:ident, $ty:ty, |$s:ident, $v:ident| $assign:expr) => {
        $(#[$doc])*
        pub fn $name(mut self, $v: $ty) -> Self {
            self.touched.push(stringify!($name));
            let $s = &mut self;
            $assign;
            self
        }
    };
}

impl TransactionBuilder {
    /// Creates a builder for the given transaction kind. The fee defaults to
    /// a flat zero, which is only useful inside a fee-pooling group.
    pub fn new(tx_type: TransactionType) -> Self {
        Self {
            tx_type,
            touched: Vec::new(),
            sender: None,
            fee: FeeMode::Flat(0),
            first_valid: 0,
            last_valid: 0,
            genesis_id: String::new(),
            genesis_hash: None,
            note: None,
            lease: None,
            rekey_to: None,
            group: None,
            receiver: None,
            amount: None,
            close_remainder_to: None,
            vote_key: None,
            selection_key: None,
            state_proof_key: None,
            vote_first: None,
            vote_last: None,
            vote_key_dilution: None,
            non_participation: None,
            asset_id: None,
            params: AssetParams::default(),
            revocation_target: None,
            freeze_account: None,
            frozen: None,
            app: ApplicationCall::default(),
            state_proof_type: None,
            state_proof: None,
            state_proof_message: None,
        }
    }

    // -- header ------------------------------------------------------------

    /// Replace every header field at once.
    pub fn header(mut self, header: Header) -> Self {
        self.sender = Some(header.sender);
        self.fee = FeeMode::Flat(header.fee);
        self.first_valid = header.first_valid;
        self.last_valid = header.last_valid;
        self.genesis_id = header.genesis_id;
        self.genesis_hash = Some(header.genesis_hash);
        self.note = header.note;
        self.lease = header.lease;
        self.rekey_to = header.rekey_to;
        self.group = header.group;
        self
    }

    /// Validity window, genesis and fee policy from a node's suggestion.
    pub fn suggested_params(mut self, params: &SuggestedParams) -> Self {
        self.first_valid = params.first_valid;
        self.last_valid = params.last_valid;
        self.genesis_id = params.genesis_id.clone();
        self.genesis_hash = Some(params.genesis_hash);
        self.fee = if params.flat_fee {
            FeeMode::Flat(params.fee)
        } else {
            FeeMode::PerByte(params.fee)
        };
        self
    }

    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    /// A flat fee, used as given.
    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = FeeMode::Flat(fee);
        self
    }

    /// A per-byte fee rate. The final fee is computed at build time.
    pub fn fee_per_byte(mut self, rate: u64) -> Self {
        self.fee = FeeMode::PerByte(rate);
        self
    }

    pub fn first_valid(mut self, round: u64) -> Self {
        self.first_valid = round;
        self
    }

    pub fn last_valid(mut self, round: u64) -> Self {
        self.last_valid = round;
        self
    }

    pub fn genesis_id(mut self, id: impl Into<String>) -> Self {
        self.genesis_id = id.into();
        self
    }

    pub fn genesis_hash(mut self, hash: [u8; HASH_LENGTH]) -> Self {
        self.genesis_hash = Some(hash);
        self
    }

    pub fn note(mut self, note: impl Into<Vec<u8>>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn lease(mut self, lease: [u8; HASH_LENGTH]) -> Self {
        self.lease = Some(lease);
        self
    }

    pub fn rekey_to(mut self, address: Address) -> Self {
        self.rekey_to = Some(address);
        self
    }

    pub fn group(mut self, group: [u8; HASH_LENGTH]) -> Self {
        self.group = Some(group);
        self
    }

    // -- payment / asset transfer --------------------------------------------

    kind_setter!(
        /// Payment or asset-transfer receiver.
        receiver, Address, |s, v| s.receiver = Some(v)
    );
    kind_setter!(
        /// Payment amount in base units, or asset-transfer amount.
        amount, u64, |s, v| s.amount = Some(v)
    );
    kind_setter!(
        /// Close the sender's remaining balance (or asset holding) to this
        /// address.
        close_remainder_to, Address, |s, v| s.close_remainder_to = Some(v)
    );
    kind_setter!(revocation_target, Address, |s, v| s.revocation_target = Some(v));

    // -- key registration ----------------------------------------------------

    kind_setter!(vote_key, [u8; 32], |s, v| s.vote_key = Some(v));
    kind_setter!(selection_key, [u8; 32], |s, v| s.selection_key = Some(v));
    kind_setter!(
        state_proof_key,
        [u8; STATE_PROOF_KEY_LENGTH],
        |s, v| s.state_proof_key = Some(v)
    );
    kind_setter!(vote_first, u64, |s, v| s.vote_first = Some(v));
    kind_setter!(vote_last, u64, |s, v| s.vote_last = Some(v));
    kind_setter!(vote_key_dilution, u64, |s, v| s.vote_key_dilution = Some(v));
    kind_setter!(non_participation, bool, |s, v| s.non_participation = Some(v));

    // -- assets ----------------------------------------------------------------

    kind_setter!(
        /// Asset being configured, transferred or frozen.
        asset_id, u64, |s, v| s.asset_id = Some(v)
    );
    kind_setter!(total, u64, |s, v| s.params.total = v);
    kind_setter!(decimals, u32, |s, v| s.params.decimals = v);
    kind_setter!(default_frozen, bool, |s, v| s.params.default_frozen = v);
    kind_setter!(unit_name, &str, |s, v| s.params.unit_name = v.to_string());
    kind_setter!(asset_name, &str, |s, v| s.params.asset_name = v.to_string());
    kind_setter!(url, &str, |s, v| s.params.url = v.to_string());
    kind_setter!(metadata_hash, [u8; 32], |s, v| s.params.metadata_hash = Some(v));
    kind_setter!(manager, Address, |s, v| s.params.manager = Some(v));
    kind_setter!(reserve, Address, |s, v| s.params.reserve = Some(v));
    kind_setter!(freeze, Address, |s, v| s.params.freeze = Some(v));
    kind_setter!(clawback, Address, |s, v| s.params.clawback = Some(v));
    kind_setter!(freeze_account, Address, |s, v| s.freeze_account = Some(v));
    kind_setter!(frozen, bool, |s, v| s.frozen = Some(v));

    // -- applications ------------------------------------------------------

    kind_setter!(app_id, u64, |s, v| s.app.app_id = v);
    kind_setter!(on_complete, OnComplete, |s, v| s.app.on_complete = v);
    kind_setter!(approval_program, Vec<u8>, |s, v| s.app.approval_program = v);
    kind_setter!(clear_program, Vec<u8>, |s, v| s.app.clear_program = v);
    kind_setter!(app_args, Vec<Vec<u8>>, |s, v| s.app.args = v);
    kind_setter!(accounts, Vec<Address>, |s, v| s.app.accounts = v);
    kind_setter!(foreign_apps, Vec<u64>, |s, v| s.app.foreign_apps = v);
    kind_setter!(foreign_assets, Vec<u64>, |s, v| s.app.foreign_assets = v);
    kind_setter!(global_schema, StateSchema, |s, v| s.app.global_schema = v);
    kind_setter!(local_schema, StateSchema, |s, v| s.app.local_schema = v);
    kind_setter!(extra_pages, u32, |s, v| s.app.extra_pages = v);

    // -- state proofs ----------------------------------------------------------

    kind_setter!(state_proof_type, u64, |s, v| s.state_proof_type = Some(v));
    kind_setter!(
        /// Pre-encoded canonical proof body.
        state_proof, Vec<u8>, |s, v| s.state_proof = Some(v)
    );
    kind_setter!(
        state_proof_message,
        StateProofMessage,
        |s, v| s.state_proof_message = Some(v)
    );

    // -- build -----------------------------------------------------------------

    /// Validate and assemble the transaction.
    pub fn build(self) -> Result<Transaction, TransactionError> {
        let allowed = allowed_fields(self.tx_type);
        if let Some(field) = self.touched.iter().copied().find(|f| !allowed.contains(f)) {
            return Err(TransactionError::FieldNotAllowed {
                field,
                kind: self.tx_type,
            });
        }

        let header = Header {
            sender: self
                .sender
                .ok_or(TransactionError::MissingField { field: "sender" })?,
            fee: match self.fee {
                FeeMode::Flat(fee) | FeeMode::PerByte(fee) => fee,
            },
            first_valid: self.first_valid,
            last_valid: self.last_valid,
            genesis_id: self.genesis_id,
            genesis_hash: self
                .genesis_hash
                .ok_or(TransactionError::MissingField {
                    field: "genesis_hash",
                })?,
            note: self.note,
            lease: self.lease,
            rekey_to: self.rekey_to,
            group: self.group,
        };

        let kind = match self.tx_type {
            TransactionType::Payment => TransactionKind::Payment(Payment {
                receiver: self.receiver.unwrap_or_default(),
                amount: self.amount.unwrap_or_default(),
                close_remainder_to: self.close_remainder_to,
            }),
            TransactionType::KeyRegistration => {
                let online = self.vote_key.is_some()
                    || self.selection_key.is_some()
                    || self.state_proof_key.is_some()
                    || self.vote_first.is_some()
                    || self.vote_last.is_some()
                    || self.vote_key_dilution.is_some();
                let participation = if online {
                    Some(Participation {
                        vote_key: self
                            .vote_key
                            .ok_or(TransactionError::MissingField { field: "vote_key" })?,
                        selection_key: self.selection_key.ok_or(
                            TransactionError::MissingField {
                                field: "selection_key",
                            },
                        )?,
                        state_proof_key: self.state_proof_key,
                        vote_first: self.vote_first.unwrap_or_default(),
                        vote_last: self.vote_last.unwrap_or_default(),
                        vote_key_dilution: self.vote_key_dilution.unwrap_or_default(),
                    })
                } else {
                    None
                };
                TransactionKind::KeyRegistration(KeyRegistration {
                    participation,
                    non_participation: self.non_participation.unwrap_or_default(),
                })
            }
            TransactionType::AssetConfig => {
                let asset_id = self.asset_id.unwrap_or_default();
                let params = if asset_id == 0 || !self.params.is_empty() {
                    Some(self.params)
                } else {
                    None
                };
                TransactionKind::AssetConfig(AssetConfig { asset_id, params })
            }
            TransactionType::AssetTransfer => TransactionKind::AssetTransfer(AssetTransfer {
                asset_id: self.asset_id.unwrap_or_default(),
                amount: self.amount.unwrap_or_default(),
                receiver: self.receiver.unwrap_or_default(),
                close_to: self.close_remainder_to,
                revocation_target: self.revocation_target,
            }),
            TransactionType::AssetFreeze => TransactionKind::AssetFreeze(AssetFreeze {
                asset_id: self.asset_id.unwrap_or_default(),
                freeze_account: self.freeze_account.unwrap_or_default(),
                frozen: self.frozen.unwrap_or_default(),
            }),
            TransactionType::ApplicationCall => TransactionKind::ApplicationCall(self.app),
            TransactionType::StateProof => TransactionKind::StateProof(StateProof {
                state_proof_type: self.state_proof_type.unwrap_or_default(),
                state_proof: self.state_proof.unwrap_or_default(),
                message: self.state_proof_message,
            }),
        };

        let txn = Transaction::new(header, kind)?;
        match self.fee {
            FeeMode::Flat(_) => Ok(txn),
            FeeMode::PerByte(rate) => {
                // The estimate is taken with the rate itself in the fee
                // field, as the reference SDKs do.
                let size = estimate_size(&txn)? as u64;
                let fee = rate.saturating_mul(size).max(MIN_TXN_FEE);
                Ok(txn.with_fee(fee))
            }
        }
    }
}

/// Kind-specific builder fields each kind accepts. Header fields are
/// accepted everywhere and not listed.
fn allowed_fields(tx_type: TransactionType) -> &'static [&'static str] {
    match tx_type {
        TransactionType::Payment => &["receiver", "amount", "close_remainder_to"],
        TransactionType::KeyRegistration => &[
            "vote_key",
            "selection_key",
            "state_proof_key",
            "vote_first",
            "vote_last",
            "vote_key_dilution",
            "non_participation",
        ],
        TransactionType::AssetConfig => &[
            "asset_id",
            "total",
            "decimals",
            "default_frozen",
            "unit_name",
            "asset_name",
            "url",
            "metadata_hash",
            "manager",
            "reserve",
            "freeze",
            "clawback",
        ],
        TransactionType::AssetTransfer => &[
            "asset_id",
            "amount",
            "receiver",
            "close_remainder_to",
            "revocation_target",
        ],
        TransactionType::AssetFreeze => &["asset_id", "freeze_account", "frozen"],
        TransactionType::ApplicationCall => &[
            "app_id",
            "on_complete",
            "approval_program",
            "clear_program",
            "app_args",
            "accounts",
            "foreign_apps",
            "foreign_assets",
            "global_schema",
            "local_schema",
            "extra_pages",
        ],
        TransactionType::StateProof => &["state_proof_type", "state_proof", "state_proof_message"],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base(tx_type: TransactionType) -> TransactionBuilder {
        TransactionBuilder::new(tx_type)
            .sender(Address::new([1u8; 32]))
            .first_valid(100)
            .last_valid(1_000)
            .genesis_id("testnet-v1.0")
            .genesis_hash([2u8; 32])
    }

    #[test]
    fn builder_sets_payment_fields() {
        let txn = base(TransactionType::Payment)
            .receiver(Address::new([3u8; 32]))
            .amount(42)
            .fee(1_000)
            .build()
            .unwrap();
        assert_eq!(txn.tx_type(), TransactionType::Payment);
        assert_eq!(txn.fee(), 1_000);
        match txn.kind() {
            TransactionKind::Payment(p) => {
                assert_eq!(p.amount, 42);
                assert_eq!(p.receiver, Address::new([3u8; 32]));
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn foreign_field_is_rejected() {
        let err = base(TransactionType::Payment)
            .amount(1)
            .asset_id(31_566_704)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TransactionError::FieldNotAllowed {
                field: "asset_id",
                kind: TransactionType::Payment
            }
        );
    }

    #[test]
    fn missing_sender_is_rejected() {
        let err = TransactionBuilder::new(TransactionType::Payment)
            .genesis_hash([2u8; 32])
            .build()
            .unwrap_err();
        assert_eq!(err, TransactionError::MissingField { field: "sender" });
    }

    #[test]
    fn missing_genesis_hash_is_rejected() {
        let err = TransactionBuilder::new(TransactionType::Payment)
            .sender(Address::new([1u8; 32]))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TransactionError::MissingField {
                field: "genesis_hash"
            }
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = base(TransactionType::Payment)
            .amount(5)
            .receiver(Address::new([3u8; 32]))
            .note(b"hi".to_vec())
            .fee(1_000)
            .build()
            .unwrap();
        let b = TransactionBuilder::new(TransactionType::Payment)
            .note(b"hi".to_vec())
            .fee(1_000)
            .receiver(Address::new([3u8; 32]))
            .genesis_hash([2u8; 32])
            .last_valid(1_000)
            .amount(5)
            .genesis_id("testnet-v1.0")
            .first_valid(100)
            .sender(Address::new([1u8; 32]))
            .build()
            .unwrap();
        assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
    }

    #[test]
    fn explicit_zero_equals_unset() {
        let unset = base(TransactionType::Payment).amount(5).build().unwrap();
        let zeroed = base(TransactionType::Payment)
            .amount(5)
            .fee(0)
            .note(Vec::new())
            .lease([0u8; 32])
            .close_remainder_to(Address::ZERO)
            .rekey_to(Address::ZERO)
            .build()
            .unwrap();
        assert_eq!(unset, zeroed);
        assert_eq!(unset.to_bytes().unwrap(), zeroed.to_bytes().unwrap());
    }

    #[test]
    fn per_byte_fee_has_floor() {
        let txn = base(TransactionType::Payment)
            .amount(5)
            .fee_per_byte(0)
            .build()
            .unwrap();
        assert_eq!(txn.fee(), MIN_TXN_FEE);
    }

    #[test]
    fn per_byte_fee_scales_with_size() {
        let small = base(TransactionType::Payment)
            .amount(5)
            .fee_per_byte(10)
            .build()
            .unwrap();
        let large = base(TransactionType::Payment)
            .amount(5)
            .note(vec![0xaa; 900])
            .fee_per_byte(10)
            .build()
            .unwrap();
        assert!(large.fee() > small.fee());
        assert!(large.fee() >= 9_000);
    }

    #[test]
    fn suggested_params_apply() {
        let params = SuggestedParams {
            fee: 1_000,
            flat_fee: true,
            first_valid: 7,
            last_valid: 1_007,
            genesis_id: "mainnet-v1.0".into(),
            genesis_hash: [5u8; 32],
        };
        let txn = TransactionBuilder::new(TransactionType::Payment)
            .sender(Address::new([1u8; 32]))
            .suggested_params(&params)
            .build()
            .unwrap();
        assert_eq!(txn.header().first_valid, 7);
        assert_eq!(txn.header().last_valid, 1_007);
        assert_eq!(txn.header().genesis_id, "mainnet-v1.0");
        assert_eq!(txn.fee(), 1_000);
    }

    #[test]
    fn keyreg_partial_participation_rejected() {
        let err = base(TransactionType::KeyRegistration)
            .vote_key([4u8; 32])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TransactionError::MissingField {
                field: "selection_key"
            }
        );
    }

    #[test]
    fn asset_reconfigure_vs_destroy() {
        let destroy = base(TransactionType::AssetConfig)
            .asset_id(9)
            .build()
            .unwrap();
        let reconfigure = base(TransactionType::AssetConfig)
            .asset_id(9)
            .manager(Address::new([8u8; 32]))
            .build()
            .unwrap();
        match (destroy.kind(), reconfigure.kind()) {
            (TransactionKind::AssetConfig(d), TransactionKind::AssetConfig(r)) => {
                assert!(d.params.is_none());
                assert_eq!(
                    r.params.as_ref().and_then(|p| p.manager),
                    Some(Address::new([8u8; 32]))
                );
            }
            _ => panic!("expected asset config"),
        }
    }

    #[test]
    fn suggested_params_json() {
        let json = r#"{
            "fee": 0,
            "first_valid": 1,
            "last_valid": 2,
            "genesis_id": "x",
            "genesis_hash": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="
        }"#;
        let params: SuggestedParams = serde_json::from_str(json).unwrap();
        assert!(!params.flat_fee);
        assert_eq!(params.genesis_hash, [0u8; 32]);
    }
}
