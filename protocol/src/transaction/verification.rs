//! Transaction verification: structural checks and authorization checks.
//!
//! [`Transaction::new`] runs [`Transaction::validate`], so every
//! `Transaction` value in the crate has already passed the structural rules.
//! [`SignedTransaction::verify`] adds the cryptographic half: the attached
//! authorization must be for the right account and must cover the
//! transaction's signing bytes.
//!
//! Checks are ordered from cheapest to most expensive (length comparisons
//! before decoding, decoding before signature verification).

use tracing::debug;

use super::signed::{Authorization, SignedTransaction};
use super::signing::bytes_to_sign;
use super::types::*;
use super::TransactionError;
use crate::config::{
    MAX_APP_ACCOUNTS, MAX_APP_ARGS, MAX_APP_EXTRA_PAGES, MAX_APP_TOTAL_ARG_LENGTH,
    MAX_APP_TOTAL_REFERENCES, MAX_ASSET_DECIMALS, MAX_ASSET_NAME_LENGTH,
    MAX_ASSET_UNIT_NAME_LENGTH, MAX_ASSET_URL_LENGTH, MAX_NOTE_LENGTH,
};
use crate::crypto::verify_checked;
use crate::encoding::decode_map_canonical;

impl Transaction {
    /// Structural validation.
    ///
    /// The checks, in order:
    ///
    /// 1. **Sender**: must not be the zero address.
    /// 2. **Validity window**: `first_valid <= last_valid`.
    /// 3. **Genesis hash**: must be set.
    /// 4. **Note**: at most 1024 bytes.
    /// 5. **Kind rules**: see the per-kind helpers below.
    pub(crate) fn validate(&self) -> Result<(), TransactionError> {
        let h = &self.header;

        // 1. Sender.
        if h.sender.is_zero() {
            return Err(TransactionError::MissingField { field: "snd" });
        }

        // 2. Validity window.
        if h.first_valid > h.last_valid {
            return Err(TransactionError::InvalidValidityWindow {
                first_valid: h.first_valid,
                last_valid: h.last_valid,
            });
        }

        // 3. Genesis hash.
        if h.genesis_hash.iter().all(|b| *b == 0) {
            return Err(TransactionError::MissingField { field: "gh" });
        }

        // 4. Note length.
        if let Some(note) = &h.note {
            check_len("note", note.len(), MAX_NOTE_LENGTH)?;
        }

        // 5. Kind-specific rules.
        match &self.kind {
            TransactionKind::Payment(_) => Ok(()),
            TransactionKind::KeyRegistration(k) => validate_key_registration(k),
            TransactionKind::AssetConfig(c) => validate_asset_config(c),
            TransactionKind::AssetTransfer(t) => require_asset_id("xaid", t.asset_id),
            TransactionKind::AssetFreeze(f) => require_asset_id("faid", f.asset_id),
            TransactionKind::ApplicationCall(a) => validate_application_call(a),
            TransactionKind::StateProof(s) => validate_state_proof(s),
        }
    }
}

fn check_len(field: &'static str, got: usize, max: usize) -> Result<(), TransactionError> {
    if got > max {
        return Err(TransactionError::FieldTooLong { field, max, got });
    }
    Ok(())
}

fn check_count(field: &'static str, got: usize, max: usize) -> Result<(), TransactionError> {
    if got > max {
        return Err(TransactionError::TooManyEntries { field, max, got });
    }
    Ok(())
}

fn require_asset_id(field: &'static str, asset_id: u64) -> Result<(), TransactionError> {
    if asset_id == 0 {
        return Err(TransactionError::MissingField { field });
    }
    Ok(())
}

fn validate_key_registration(k: &KeyRegistration) -> Result<(), TransactionError> {
    match &k.participation {
        Some(part) => {
            if k.non_participation {
                return Err(TransactionError::InvalidField {
                    field: "nonpart",
                    reason: "only allowed when going offline",
                });
            }
            if part.vote_first > part.vote_last {
                return Err(TransactionError::InvalidValidityWindow {
                    first_valid: part.vote_first,
                    last_valid: part.vote_last,
                });
            }
            if part.vote_key.iter().all(|b| *b == 0) {
                return Err(TransactionError::MissingField { field: "votekey" });
            }
            if part.selection_key.iter().all(|b| *b == 0) {
                return Err(TransactionError::MissingField { field: "selkey" });
            }
            Ok(())
        }
        None => Ok(()),
    }
}

fn validate_asset_config(c: &AssetConfig) -> Result<(), TransactionError> {
    let Some(params) = &c.params else {
        return Ok(());
    };
    if params.decimals > MAX_ASSET_DECIMALS {
        return Err(TransactionError::InvalidField {
            field: "dc",
            reason: "at most 19 decimals",
        });
    }
    check_len("un", params.unit_name.len(), MAX_ASSET_UNIT_NAME_LENGTH)?;
    check_len("an", params.asset_name.len(), MAX_ASSET_NAME_LENGTH)?;
    check_len("au", params.url.len(), MAX_ASSET_URL_LENGTH)?;
    Ok(())
}

fn validate_application_call(a: &ApplicationCall) -> Result<(), TransactionError> {
    check_count("apaa", a.args.len(), MAX_APP_ARGS)?;
    let arg_bytes: usize = a.args.iter().map(Vec::len).sum();
    check_len("apaa", arg_bytes, MAX_APP_TOTAL_ARG_LENGTH)?;
    check_count("apat", a.accounts.len(), MAX_APP_ACCOUNTS)?;
    let references = a.accounts.len() + a.foreign_apps.len() + a.foreign_assets.len();
    check_count("references", references, MAX_APP_TOTAL_REFERENCES)?;

    if a.extra_pages > MAX_APP_EXTRA_PAGES {
        return Err(TransactionError::InvalidField {
            field: "apep",
            reason: "at most 3 extra pages",
        });
    }

    if a.app_id != 0 {
        // Schemas and page counts are fixed when the application is created.
        if !a.global_schema.is_empty() || !a.local_schema.is_empty() {
            return Err(TransactionError::InvalidField {
                field: "apgs",
                reason: "schemas can only be set when creating an application",
            });
        }
        if a.extra_pages != 0 {
            return Err(TransactionError::InvalidField {
                field: "apep",
                reason: "extra pages can only be set when creating an application",
            });
        }
        let has_programs = !a.approval_program.is_empty() || !a.clear_program.is_empty();
        if has_programs && a.on_complete != OnComplete::UpdateApplication {
            return Err(TransactionError::InvalidField {
                field: "apap",
                reason: "programs can only be set on create or update",
            });
        }
    }
    Ok(())
}

fn validate_state_proof(s: &StateProof) -> Result<(), TransactionError> {
    if !s.state_proof.is_empty() {
        decode_map_canonical(&s.state_proof)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

impl SignedTransaction {
    /// Verify the authorization against the transaction's signing bytes.
    ///
    /// The authorizing account is `sgnr` when present and the sender
    /// otherwise:
    ///
    /// 1. **Single**: the signature must verify under the authorizer's key.
    /// 2. **Multisig**: the metadata must hash to the authorizer and every
    ///    present subsignature must verify, with at least `threshold` of them.
    /// 3. **Logic**: see [`LogicSigAuth::verify`](crate::logicsig::LogicSigAuth::verify).
    pub fn verify(&self) -> Result<(), TransactionError> {
        let authorizer = self.authorizer();
        let message = bytes_to_sign(self.transaction())?;

        match self.authorization() {
            Authorization::Single(signature) => {
                verify_checked(&authorizer.public_key(), &message, signature)?;
            }
            Authorization::Multisig(set) => {
                let address = set.address();
                if address != authorizer {
                    return Err(TransactionError::AuthorizerMismatch {
                        expected: authorizer.to_string(),
                        found: address.to_string(),
                    });
                }
                set.verify(&message)?;
            }
            Authorization::Logic(lsig) => {
                lsig.verify(&authorizer)?;
            }
        }

        debug!(authorizer = %authorizer, "authorization verified");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Keypair, Signature};
    use crate::identity::Address;
    use crate::multisig::MultisigMetadata;
    use crate::transaction::{
        sign_multisig_transaction, sign_transaction, TransactionBuilder,
    };

    fn payment(sender: Address) -> TransactionBuilder {
        TransactionBuilder::new(TransactionType::Payment)
            .sender(sender)
            .receiver(Address::new([3u8; 32]))
            .amount(1_000)
            .fee(1_000)
            .first_valid(100)
            .last_valid(1_000)
            .genesis_id("testnet-v1.0")
            .genesis_hash([2u8; 32])
    }

    #[test]
    fn valid_signed_transaction_passes() {
        let kp = Keypair::generate();
        let txn = payment(kp.address()).build().unwrap();
        let stxn = sign_transaction(&txn, &kp).unwrap();
        assert!(stxn.verify().is_ok());
    }

    #[test]
    fn rejects_inverted_validity_window() {
        let err = payment(Address::new([1u8; 32]))
            .first_valid(10)
            .last_valid(9)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TransactionError::InvalidValidityWindow {
                first_valid: 10,
                last_valid: 9
            }
        );
    }

    #[test]
    fn equal_validity_bounds_are_allowed() {
        assert!(payment(Address::new([1u8; 32]))
            .first_valid(9)
            .last_valid(9)
            .build()
            .is_ok());
    }

    #[test]
    fn rejects_zero_sender() {
        let err = payment(Address::ZERO).build().unwrap_err();
        assert_eq!(err, TransactionError::MissingField { field: "snd" });
    }

    #[test]
    fn rejects_long_note() {
        let err = payment(Address::new([1u8; 32]))
            .note(vec![0u8; 1_025])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TransactionError::FieldTooLong {
                field: "note",
                max: 1_024,
                got: 1_025
            }
        );
        assert!(payment(Address::new([1u8; 32]))
            .note(vec![0u8; 1_024])
            .build()
            .is_ok());
    }

    #[test]
    fn rejects_long_unit_name() {
        let err = TransactionBuilder::new(TransactionType::AssetConfig)
            .sender(Address::new([1u8; 32]))
            .genesis_hash([2u8; 32])
            .total(10)
            .unit_name("TOOLONGXX")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TransactionError::FieldTooLong { field: "un", .. }
        ));
    }

    #[test]
    fn rejects_transfer_without_asset() {
        let err = TransactionBuilder::new(TransactionType::AssetTransfer)
            .sender(Address::new([1u8; 32]))
            .genesis_hash([2u8; 32])
            .amount(1)
            .build()
            .unwrap_err();
        assert_eq!(err, TransactionError::MissingField { field: "xaid" });
    }

    #[test]
    fn rejects_nonpart_when_online() {
        let err = TransactionBuilder::new(TransactionType::KeyRegistration)
            .sender(Address::new([1u8; 32]))
            .genesis_hash([2u8; 32])
            .vote_key([4u8; 32])
            .selection_key([5u8; 32])
            .vote_last(100)
            .non_participation(true)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TransactionError::InvalidField { field: "nonpart", .. }
        ));
    }

    #[test]
    fn rejects_too_many_app_references() {
        let err = TransactionBuilder::new(TransactionType::ApplicationCall)
            .sender(Address::new([1u8; 32]))
            .genesis_hash([2u8; 32])
            .app_id(5)
            .accounts(vec![Address::new([7u8; 32]); 4])
            .foreign_apps(vec![1, 2, 3])
            .foreign_assets(vec![4, 5])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TransactionError::TooManyEntries {
                field: "references",
                max: 8,
                got: 9
            }
        );
    }

    #[test]
    fn rejects_schema_on_existing_app() {
        let err = TransactionBuilder::new(TransactionType::ApplicationCall)
            .sender(Address::new([1u8; 32]))
            .genesis_hash([2u8; 32])
            .app_id(5)
            .local_schema(StateSchema {
                num_uints: 1,
                num_byte_slices: 0,
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, TransactionError::InvalidField { field: "apgs", .. }));
    }

    #[test]
    fn rejects_state_proof_body_that_is_not_a_map() {
        let err = TransactionBuilder::new(TransactionType::StateProof)
            .sender(Address::new([1u8; 32]))
            .genesis_hash([2u8; 32])
            .state_proof(vec![0x01])
            .build()
            .unwrap_err();
        assert!(matches!(err, TransactionError::Encoding(_)));
    }

    #[test]
    fn rejects_signature_from_wrong_key() {
        let owner = Keypair::generate();
        let txn = payment(owner.address()).build().unwrap();
        let forged = SignedTransaction::new(
            txn.clone(),
            Authorization::Single(Keypair::generate().sign(&bytes_to_sign(&txn).unwrap())),
            None,
        );
        assert!(matches!(
            forged.verify(),
            Err(TransactionError::Signature(_))
        ));
    }

    #[test]
    fn rejects_zero_signature() {
        let kp = Keypair::generate();
        let txn = payment(kp.address()).build().unwrap();
        let stxn = SignedTransaction::new(
            txn,
            Authorization::Single(Signature::from_bytes([0u8; 64])),
            None,
        );
        assert!(stxn.verify().is_err());
    }

    #[test]
    fn rekeyed_account_verifies_under_signer() {
        let sender = Keypair::generate();
        let spender = Keypair::generate();
        let txn = payment(sender.address()).build().unwrap();
        let stxn = sign_transaction(&txn, &spender).unwrap();
        assert_eq!(stxn.auth_address(), Some(&spender.address()));
        assert!(stxn.verify().is_ok());
    }

    #[test]
    fn multisig_for_another_account_is_rejected() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        let metadata = MultisigMetadata::new(1, 1, vec![a.public_key(), b.public_key()]).unwrap();
        let txn = payment(metadata.address()).build().unwrap();
        let stxn = sign_multisig_transaction(&txn, &metadata, &a).unwrap();
        assert!(stxn.verify().is_ok());

        let other = payment(Address::new([1u8; 32])).build().unwrap();
        let set = match stxn.authorization() {
            Authorization::Multisig(set) => set.clone(),
            _ => unreachable!(),
        };
        let mismatched = SignedTransaction::new(other, Authorization::Multisig(set), None);
        assert!(matches!(
            mismatched.verify(),
            Err(TransactionError::AuthorizerMismatch { .. })
        ));
    }
}
