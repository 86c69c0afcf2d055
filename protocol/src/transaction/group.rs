//! Atomic transaction groups.
//!
//! A group id binds up to 16 transactions so that they are applied all
//! together or not at all:
//!
//! ```text
//! group_id = SHA-512/256("TG" || canonical({ "txlist": [raw_id(txn_i) ...] }))
//! ```
//!
//! where each `raw_id` is computed with the `grp` field cleared, so the id
//! does not depend on any group previously assigned. Order matters: the same
//! transactions in another order form a different group.

use tracing::debug;

use super::types::{GroupId, Transaction};
use super::TransactionError;
use crate::config::{MAX_GROUP_SIZE, TX_GROUP_DOMAIN};
use crate::crypto::domain_separated_hash;
use crate::encoding::{encode_map, CanonicalMap, Value};
use crate::identity::Address;

/// Compute the group id for `txns`, in order.
pub fn compute_group_id(txns: &[Transaction]) -> Result<GroupId, TransactionError> {
    if txns.is_empty() || txns.len() > MAX_GROUP_SIZE {
        return Err(TransactionError::InvalidGroupSize { got: txns.len() });
    }

    let mut ids = Vec::with_capacity(txns.len());
    for txn in txns {
        let raw = txn.with_group(None).raw_id()?;
        ids.push(Value::Bytes(raw.to_vec()));
    }
    let mut map = CanonicalMap::new();
    map.insert_array("txlist", ids)?;

    let group = GroupId::from_bytes(domain_separated_hash(TX_GROUP_DOMAIN, &encode_map(&map)?));
    debug!(size = txns.len(), group = %group, "computed group id");
    Ok(group)
}

/// Return copies of `txns` carrying their common group id.
pub fn assign_group_id(txns: &[Transaction]) -> Result<Vec<Transaction>, TransactionError> {
    let group = compute_group_id(txns)?;
    Ok(txns
        .iter()
        .map(|txn| txn.with_group(Some(*group.as_bytes())))
        .collect())
}

/// Like [`assign_group_id`], but return only the transactions sent by
/// `sender`, each carrying the id of the whole group.
///
/// Useful when several parties build the same group and each signs only its
/// own members.
pub fn assign_group_id_for(
    txns: &[Transaction],
    sender: &Address,
) -> Result<Vec<Transaction>, TransactionError> {
    Ok(assign_group_id(txns)?
        .into_iter()
        .filter(|txn| txn.sender() == sender)
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{TransactionBuilder, TransactionType};

    fn payment(sender: u8, amount: u64) -> Transaction {
        TransactionBuilder::new(TransactionType::Payment)
            .sender(Address::new([sender; 32]))
            .receiver(Address::new([9u8; 32]))
            .amount(amount)
            .fee(1_000)
            .first_valid(1)
            .last_valid(100)
            .genesis_hash([2u8; 32])
            .build()
            .unwrap()
    }

    #[test]
    fn assignment_sets_same_group_on_all() {
        let grouped = assign_group_id(&[payment(1, 1), payment(2, 2)]).unwrap();
        assert!(grouped[0].group().is_some());
        assert_eq!(grouped[0].group(), grouped[1].group());
    }

    #[test]
    fn group_id_ignores_existing_group() {
        let txns = vec![payment(1, 1), payment(2, 2)];
        let first = compute_group_id(&txns).unwrap();
        let grouped = assign_group_id(&txns).unwrap();
        assert_eq!(compute_group_id(&grouped).unwrap(), first);
    }

    #[test]
    fn order_matters() {
        let a = payment(1, 1);
        let b = payment(2, 2);
        assert_ne!(
            compute_group_id(&[a.clone(), b.clone()]).unwrap(),
            compute_group_id(&[b, a]).unwrap()
        );
    }

    #[test]
    fn group_changes_transaction_id() {
        let txn = payment(1, 1);
        let grouped = assign_group_id(&[txn.clone()]).unwrap();
        assert_ne!(txn.id().unwrap(), grouped[0].id().unwrap());
    }

    #[test]
    fn size_limits() {
        assert_eq!(
            compute_group_id(&[]).unwrap_err(),
            TransactionError::InvalidGroupSize { got: 0 }
        );
        let sixteen: Vec<Transaction> = (0..16).map(|i| payment(1, i + 1)).collect();
        assert!(compute_group_id(&sixteen).is_ok());
        let seventeen: Vec<Transaction> = (0..17).map(|i| payment(1, i + 1)).collect();
        assert_eq!(
            compute_group_id(&seventeen).unwrap_err(),
            TransactionError::InvalidGroupSize { got: 17 }
        );
    }

    #[test]
    fn filter_by_sender() {
        let txns = vec![payment(1, 1), payment(2, 2), payment(1, 3)];
        let mine = assign_group_id_for(&txns, &Address::new([1u8; 32])).unwrap();
        assert_eq!(mine.len(), 2);
        let all = assign_group_id(&txns).unwrap();
        assert_eq!(mine[0], all[0]);
        assert_eq!(mine[1], all[2]);
    }
}
