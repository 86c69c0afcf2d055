//! Signed transactions and their wire envelope.
//!
//! ```text
//! { lsig? | msig? | sig?,  sgnr?,  txn }
//! ```
//!
//! Exactly one of `sig`, `msig` and `lsig` is present. `sgnr` names the
//! authorizing account when it is not the sender (a rekeyed account).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;

use super::types::{Transaction, TransactionId};
use super::TransactionError;
use crate::config::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::Signature;
use crate::encoding::{decode_map_canonical, encode_map, CanonicalMap, EncodingError, MapReader};
use crate::identity::Address;
use crate::logicsig::{Delegation, LogicSigAuth};
use crate::multisig::MultisigSignatureSet;

/// How a transaction is authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// An Ed25519 signature by the authorizing account's key.
    Single(Signature),
    /// Subsignatures from a multisig account's members.
    Multisig(MultisigSignatureSet),
    /// A program, optionally delegated by a key or a multisig.
    Logic(LogicSigAuth),
}

impl Authorization {
    /// Envelope key this authorization is stored under.
    pub fn wire_key(&self) -> &'static str {
        match self {
            Authorization::Single(_) => "sig",
            Authorization::Multisig(_) => "msig",
            Authorization::Logic(_) => "lsig",
        }
    }
}

/// A transaction together with exactly one authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    txn: Transaction,
    auth: Authorization,
    auth_address: Option<Address>,
}

impl SignedTransaction {
    /// Wrap `txn` with `auth`. An `auth_address` equal to the sender (or the
    /// zero address) is dropped, since it is implied.
    pub fn new(txn: Transaction, auth: Authorization, auth_address: Option<Address>) -> Self {
        let auth_address = auth_address.filter(|a| !a.is_zero() && a != txn.sender());
        Self {
            txn,
            auth,
            auth_address,
        }
    }

    pub fn transaction(&self) -> &Transaction {
        &self.txn
    }

    pub fn authorization(&self) -> &Authorization {
        &self.auth
    }

    /// The `sgnr` field, when present.
    pub fn auth_address(&self) -> Option<&Address> {
        self.auth_address.as_ref()
    }

    /// The account whose authority this transaction spends.
    pub fn authorizer(&self) -> Address {
        self.auth_address.unwrap_or(*self.txn.sender())
    }

    /// Same transaction, different authorization.
    pub(crate) fn with_authorization(&self, auth: Authorization) -> Self {
        Self {
            txn: self.txn.clone(),
            auth,
            auth_address: self.auth_address,
        }
    }

    /// The id of the inner transaction. Authorization does not affect it.
    pub fn id(&self) -> Result<TransactionId, EncodingError> {
        self.txn.id()
    }

    pub fn to_canonical_map(&self) -> Result<CanonicalMap, EncodingError> {
        let mut map = CanonicalMap::new();
        match &self.auth {
            Authorization::Single(sig) => {
                if sig.as_bytes().iter().all(|b| *b == 0) {
                    return Err(EncodingError::ZeroValue { field: "sig" });
                }
                map.insert_fixed("sig", sig.as_bytes())?
            }
            Authorization::Multisig(set) => map.insert_map("msig", set.to_canonical_map()?)?,
            Authorization::Logic(lsig) => map.insert_map("lsig", lsig.to_canonical_map()?)?,
        }
        if let Some(signer) = &self.auth_address {
            map.insert_fixed("sgnr", signer.as_bytes())?;
        }
        map.insert_map("txn", self.txn.to_canonical_map()?)?;
        Ok(map)
    }

    /// The canonical envelope, ready to submit.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        encode_map(&self.to_canonical_map()?)
    }

    /// Decode a canonical envelope.
    ///
    /// Fails unless exactly one authorization is present, every key is
    /// known, and the decoded value re-encodes to `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut r = MapReader::new(decode_map_canonical(bytes)?, "stxn");

        let sig = r.fixed::<SIGNATURE_LENGTH>("sig")?;
        let msig = if r.has("msig") {
            Some(r.map("msig")?)
        } else {
            None
        };
        let lsig = if r.has("lsig") {
            Some(r.map("lsig")?)
        } else {
            None
        };
        let count = usize::from(sig.is_some()) + usize::from(msig.is_some()) + usize::from(lsig.is_some());
        if count != 1 {
            return Err(TransactionError::AuthorizationCount { count });
        }

        let signer = r.fixed::<PUBLIC_KEY_LENGTH>("sgnr")?.map(Address::new);
        if !r.has("txn") {
            return Err(TransactionError::MissingField { field: "txn" });
        }
        let txn = Transaction::from_canonical_map(r.map("txn")?)?;
        r.finish()?;

        let auth = match (sig, msig, lsig) {
            (Some(sig), _, _) => Authorization::Single(Signature::from_bytes(sig)),
            (_, Some(msig), _) => {
                Authorization::Multisig(MultisigSignatureSet::from_canonical_map(msig)?)
            }
            (_, _, Some(lsig)) => Authorization::Logic(LogicSigAuth::from_canonical_map(lsig)?),
            (None, None, None) => return Err(TransactionError::AuthorizationCount { count: 0 }),
        };

        let stxn = Self::new(txn, auth, signer);
        if stxn.to_bytes()? != bytes {
            return Err(EncodingError::NotCanonical(
                "signed transaction does not re-encode to its input".into(),
            )
            .into());
        }
        Ok(stxn)
    }

    /// A JSON rendering for display. Binary fields are base64; keys and
    /// addresses use their text forms. Not a wire format.
    pub fn to_json(&self) -> Result<serde_json::Value, TransactionError> {
        let txn = serde_json::to_value(&self.txn).map_err(|_| TransactionError::InvalidField {
            field: "txn",
            reason: "not representable as JSON",
        })?;
        let auth = match &self.auth {
            Authorization::Single(sig) => json!({ "sig": STANDARD.encode(sig.as_bytes()) }),
            Authorization::Multisig(set) => json!({ "msig": multisig_json(set) }),
            Authorization::Logic(lsig) => {
                let delegation = match lsig.delegation() {
                    None => serde_json::Value::Null,
                    Some(Delegation::Single(sig)) => json!({ "sig": STANDARD.encode(sig.as_bytes()) }),
                    Some(Delegation::Multi(set)) => json!({ "msig": multisig_json(set) }),
                };
                json!({
                    "lsig": {
                        "logic": STANDARD.encode(lsig.program()),
                        "args": lsig.args().iter().map(|a| STANDARD.encode(a)).collect::<Vec<_>>(),
                        "program_address": lsig.address().to_string(),
                        "delegation": delegation,
                    }
                })
            }
        };
        Ok(json!({
            "id": self.id()?.to_string(),
            "authorization": auth,
            "signer": self.auth_address.map(|a| a.to_string()),
            "txn": txn,
        }))
    }
}

fn multisig_json(set: &MultisigSignatureSet) -> serde_json::Value {
    let metadata = set.metadata();
    let subsigs: Vec<serde_json::Value> = metadata
        .members()
        .iter()
        .enumerate()
        .map(|(index, member)| {
            json!({
                "address": Address::from_public_key(member).to_string(),
                "signature": set.signature(index).map(|s| STANDARD.encode(s.as_bytes())),
            })
        })
        .collect();
    json!({
        "address": set.address().to_string(),
        "version": metadata.version(),
        "threshold": metadata.threshold(),
        "subsig": subsigs,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
