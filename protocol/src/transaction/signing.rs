//! Transaction signing.
//!
//! Signing is a separate step from building because the keys may not be
//! available at construction time (hardware wallet, remote co-signers). All
//! three authorization forms sign the same buffer, [`bytes_to_sign`]:
//! `"TX" || canonical transaction bytes`.
//!
//! Signing never mutates the transaction. Each function returns a new
//! [`SignedTransaction`]; multisig helpers return a new value with one more
//! subsignature.

use tracing::debug;

use super::signed::{Authorization, SignedTransaction};
use super::types::Transaction;
use super::TransactionError;
use crate::config::TX_DOMAIN;
use crate::crypto::{domain_separated_bytes, Keypair};
use crate::encoding::EncodingError;
use crate::identity::Address;
use crate::logicsig::LogicSigAuth;
use crate::multisig::{MultisigMetadata, MultisigSignatureSet};

/// Bytes a `sig` entry adds around the transaction in a signed envelope:
/// map header (1), `"sig"` key (4), bin8 header (2), signature (64) and
/// `"txn"` key (4).
const SIGNATURE_OVERHEAD: usize = 75;

/// `"TX" || canonical bytes`, the exact buffer every authorization signs.
pub fn bytes_to_sign(txn: &Transaction) -> Result<Vec<u8>, EncodingError> {
    Ok(domain_separated_bytes(TX_DOMAIN, &txn.to_bytes()?))
}

/// Size in bytes of `txn` once wrapped with a single signature.
///
/// Fee estimation multiplies this by the per-byte rate.
pub fn estimate_size(txn: &Transaction) -> Result<usize, EncodingError> {
    Ok(txn.to_bytes()?.len() + SIGNATURE_OVERHEAD)
}

/// Sign `txn` with a single key.
///
/// When the key's address differs from the sender (a rekeyed account), the
/// result records it in `sgnr`.
///
/// # Example
///
/// ```
/// use algosig::crypto::Keypair;
/// use algosig::transaction::{sign_transaction, TransactionBuilder, TransactionType};
///
/// let keypair = Keypair::generate();
/// let txn = TransactionBuilder::new(TransactionType::Payment)
///     .sender(keypair.address())
///     .amount(1)
///     .genesis_hash([1u8; 32])
///     .build()
///     .unwrap();
/// let signed = sign_transaction(&txn, &keypair).unwrap();
/// assert!(signed.verify().is_ok());
/// ```
pub fn sign_transaction(
    txn: &Transaction,
    keypair: &Keypair,
) -> Result<SignedTransaction, TransactionError> {
    let message = bytes_to_sign(txn)?;
    let signature = keypair.sign(&message);
    let signer = keypair.address();
    debug!(sender = %txn.sender(), signer = %signer, "signed transaction");
    Ok(SignedTransaction::new(
        txn.clone(),
        Authorization::Single(signature),
        Some(signer),
    ))
}

/// Start a multisig authorization for `txn` with one member's signature.
pub fn sign_multisig_transaction(
    txn: &Transaction,
    metadata: &MultisigMetadata,
    keypair: &Keypair,
) -> Result<SignedTransaction, TransactionError> {
    let message = bytes_to_sign(txn)?;
    let set = MultisigSignatureSet::new(metadata.clone()).sign(&message, keypair)?;
    Ok(SignedTransaction::new(
        txn.clone(),
        Authorization::Multisig(set),
        Some(metadata.address()),
    ))
}

/// Add `keypair`'s subsignature to a partially signed multisig transaction.
pub fn append_multisig_signature(
    stxn: &SignedTransaction,
    keypair: &Keypair,
) -> Result<SignedTransaction, TransactionError> {
    let Authorization::Multisig(set) = stxn.authorization() else {
        return Err(TransactionError::NotMultisig);
    };
    let message = bytes_to_sign(stxn.transaction())?;
    let set = set.sign(&message, keypair)?;
    Ok(stxn.with_authorization(Authorization::Multisig(set)))
}

/// Union the subsignatures of several copies of one multisig transaction,
/// typically collected from different co-signers.
///
/// All inputs must carry the same transaction and the same metadata.
pub fn merge_multisig_transactions(
    stxns: &[SignedTransaction],
) -> Result<SignedTransaction, TransactionError> {
    let (first, rest) = stxns.split_first().ok_or(TransactionError::InvalidField {
        field: "msig",
        reason: "nothing to merge",
    })?;
    let Authorization::Multisig(mut merged) = first.authorization().clone() else {
        return Err(TransactionError::NotMultisig);
    };
    for other in rest {
        if other.transaction() != first.transaction() {
            return Err(TransactionError::InvalidField {
                field: "txn",
                reason: "merged multisig transactions differ",
            });
        }
        let Authorization::Multisig(set) = other.authorization() else {
            return Err(TransactionError::NotMultisig);
        };
        merged = merged.merge(set)?;
    }
    debug!(
        inputs = stxns.len(),
        signatures = merged.signature_count(),
        "merged multisig transactions"
    );
    Ok(first.with_authorization(Authorization::Multisig(merged)))
}

/// Drop unverifiable subsignatures and check the threshold.
///
/// The returned transaction is ready to submit; an error means more
/// signatures are needed.
pub fn finalize_multisig_transaction(
    stxn: &SignedTransaction,
) -> Result<SignedTransaction, TransactionError> {
    let Authorization::Multisig(set) = stxn.authorization() else {
        return Err(TransactionError::NotMultisig);
    };
    let message = bytes_to_sign(stxn.transaction())?;
    let finalized = set.finalize(&message)?;
    Ok(stxn.with_authorization(Authorization::Multisig(finalized.into_signature_set())))
}

/// Attach a logic signature to `txn`, authorizing it for the sender.
///
/// An undelegated logic signature only authorizes the program's own
/// account, so the sender must be the program address. A delegation must
/// come from the sender's key, or from the multisig account the sender is.
/// Rekeyed senders go through [`sign_logic_sig_transaction_for`].
pub fn sign_logic_sig_transaction(
    txn: &Transaction,
    lsig: &LogicSigAuth,
) -> Result<SignedTransaction, TransactionError> {
    sign_logic_sig_transaction_for(txn, lsig, txn.sender())
}

/// Attach a logic signature that acts for `authorizer`, the account the
/// sender answers to.
///
/// `authorizer` is the program address for an account rekeyed to a
/// program, the delegating key's address for a single delegation and the
/// multisig address for a multisig delegation. The logic signature is
/// checked against it before the envelope is returned; when it differs
/// from the sender it is recorded in `sgnr`.
pub fn sign_logic_sig_transaction_for(
    txn: &Transaction,
    lsig: &LogicSigAuth,
    authorizer: &Address,
) -> Result<SignedTransaction, TransactionError> {
    lsig.verify(authorizer)?;
    debug!(sender = %txn.sender(), authorizer = %authorizer, "attached logic signature");
    Ok(SignedTransaction::new(
        txn.clone(),
        Authorization::Logic(lsig.clone()),
        Some(*authorizer),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
