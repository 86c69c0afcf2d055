//! Mapping between [`Transaction`] and its canonical field map.
//!
//! ## Field table
//!
//! | key       | field                          | absent when          |
//! |-----------|--------------------------------|----------------------|
//! | `fee`     | header.fee                     | 0                    |
//! | `fv`/`lv` | first/last valid round         | 0                    |
//! | `gen`     | genesis id                     | empty                |
//! | `gh`      | genesis hash (32)              | never (required)     |
//! | `note`    | note (≤ 1024)                  | `None`               |
//! | `lx`      | lease (32)                     | `None`               |
//! | `rekey`   | rekey-to address               | `None`               |
//! | `grp`     | group id (32)                  | `None`               |
//! | `snd`     | sender                         | never (required)     |
//! | `type`    | kind wire code                 | never                |
//! | `amt` `rcv` `close`                       | pay   | 0 / zero address / `None` |
//! | `votekey` `selkey` `sprfkey` `votefst` `votelst` `votekd` `nonpart` | keyreg | offline / 0 / false |
//! | `caid` `apar{am an au c dc df f m r t un}` | acfg | 0 / `None` or empty |
//! | `xaid` `aamt` `arcv` `aclose` `asnd`      | axfer | 0 / zero address / `None` |
//! | `faid` `fadd` `afrz`                      | afrz  | 0 / zero address / false |
//! | `apid` `apan` `apap` `apsu` `apaa` `apat` `apfa` `apas` `apgs` `apls` `apep` | appl | 0 / empty |
//! | `sptype` `sp` `spmsg{P b f l v}`          | stpf  | 0 / empty / `None` |
//!
//! Amounts, receivers and booleans have no separate "absent" state on the
//! wire: zero, the zero address and `false` are what an omitted field
//! decodes to.

use super::types::*;
use super::TransactionError;
use crate::config::{HASH_LENGTH, STATE_PROOF_KEY_LENGTH, TX_DOMAIN};
use crate::crypto::domain_separated_hash;
use crate::encoding::{
    decode_canonical, decode_map_canonical, encode, encode_map, CanonicalMap, EncodingError,
    MapReader, Value,
};
use crate::identity::Address;

impl Transaction {
    /// Flatten into the canonical field map.
    pub fn to_canonical_map(&self) -> Result<CanonicalMap, EncodingError> {
        let mut map = CanonicalMap::new();
        let h = &self.header;
        map.insert_uint("fee", h.fee)?;
        map.insert_uint("fv", h.first_valid)?;
        map.insert_uint("lv", h.last_valid)?;
        map.insert_str("gen", &h.genesis_id)?;
        map.insert_fixed("gh", &h.genesis_hash)?;
        if let Some(note) = &h.note {
            map.insert_bytes("note", note)?;
        }
        if let Some(lease) = &h.lease {
            map.insert_fixed("lx", lease)?;
        }
        if let Some(rekey) = &h.rekey_to {
            map.insert_fixed("rekey", rekey.as_bytes())?;
        }
        if let Some(group) = &h.group {
            map.insert_fixed("grp", group)?;
        }
        map.insert_fixed("snd", h.sender.as_bytes())?;
        map.insert_str("type", self.tx_type().wire_code())?;

        match &self.kind {
            TransactionKind::Payment(p) => {
                map.insert_uint("amt", p.amount)?;
                map.insert_fixed("rcv", p.receiver.as_bytes())?;
                insert_address(&mut map, "close", &p.close_remainder_to)?;
            }
            TransactionKind::KeyRegistration(k) => {
                if let Some(part) = &k.participation {
                    map.insert_fixed("votekey", &part.vote_key)?;
                    map.insert_fixed("selkey", &part.selection_key)?;
                    if let Some(sp) = &part.state_proof_key {
                        map.insert_fixed("sprfkey", sp)?;
                    }
                    map.insert_uint("votefst", part.vote_first)?;
                    map.insert_uint("votelst", part.vote_last)?;
                    map.insert_uint("votekd", part.vote_key_dilution)?;
                }
                map.insert_bool("nonpart", k.non_participation)?;
            }
            TransactionKind::AssetConfig(c) => {
                map.insert_uint("caid", c.asset_id)?;
                if let Some(params) = &c.params {
                    map.insert_map("apar", asset_params_map(params)?)?;
                }
            }
            TransactionKind::AssetTransfer(t) => {
                map.insert_uint("xaid", t.asset_id)?;
                map.insert_uint("aamt", t.amount)?;
                map.insert_fixed("arcv", t.receiver.as_bytes())?;
                insert_address(&mut map, "aclose", &t.close_to)?;
                insert_address(&mut map, "asnd", &t.revocation_target)?;
            }
            TransactionKind::AssetFreeze(f) => {
                map.insert_uint("faid", f.asset_id)?;
                map.insert_fixed("fadd", f.freeze_account.as_bytes())?;
                map.insert_bool("afrz", f.frozen)?;
            }
            TransactionKind::ApplicationCall(a) => {
                map.insert_uint("apid", a.app_id)?;
                map.insert_uint("apan", a.on_complete.code())?;
                map.insert_bytes("apap", &a.approval_program)?;
                map.insert_bytes("apsu", &a.clear_program)?;
                map.insert_array(
                    "apaa",
                    a.args.iter().map(|arg| Value::Bytes(arg.clone())).collect(),
                )?;
                map.insert_array(
                    "apat",
                    a.accounts
                        .iter()
                        .map(|acct| Value::Bytes(acct.as_bytes().to_vec()))
                        .collect(),
                )?;
                map.insert_array("apfa", a.foreign_apps.iter().map(|id| Value::Uint(*id)).collect())?;
                map.insert_array("apas", a.foreign_assets.iter().map(|id| Value::Uint(*id)).collect())?;
                map.insert_map("apgs", schema_map(&a.global_schema)?)?;
                map.insert_map("apls", schema_map(&a.local_schema)?)?;
                map.insert_uint("apep", u64::from(a.extra_pages))?;
            }
            TransactionKind::StateProof(s) => {
                map.insert_uint("sptype", s.state_proof_type)?;
                if !s.state_proof.is_empty() {
                    map.insert("sp", decode_canonical(&s.state_proof)?)?;
                }
                if let Some(msg) = &s.message {
                    let mut m = CanonicalMap::new();
                    m.insert_uint("P", msg.ln_proven_weight)?;
                    m.insert_bytes("b", &msg.block_headers_commitment)?;
                    m.insert_uint("f", msg.first_attested_round)?;
                    m.insert_uint("l", msg.last_attested_round)?;
                    m.insert_bytes("v", &msg.voters_commitment)?;
                    map.insert_map("spmsg", m)?;
                }
            }
        }
        Ok(map)
    }

    /// The canonical encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        encode_map(&self.to_canonical_map()?)
    }

    /// `SHA-512/256("TX" || canonical bytes)`.
    pub fn raw_id(&self) -> Result<[u8; HASH_LENGTH], EncodingError> {
        Ok(domain_separated_hash(TX_DOMAIN, &self.to_bytes()?))
    }

    pub fn id(&self) -> Result<TransactionId, EncodingError> {
        Ok(TransactionId::from_bytes(self.raw_id()?))
    }

    /// Decode from canonical bytes.
    ///
    /// The input must already be canonical, every key must belong to the
    /// declared kind, and the decoded transaction must pass the same
    /// validation as a freshly built one.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let txn = Self::from_canonical_map(decode_map_canonical(bytes)?)?;
        if txn.to_bytes()? != bytes {
            return Err(EncodingError::NotCanonical(
                "transaction does not re-encode to its input".into(),
            )
            .into());
        }
        Ok(txn)
    }

    pub fn from_canonical_map(map: CanonicalMap) -> Result<Self, TransactionError> {
        let mut r = MapReader::new(map, "txn");
        let tx_type = TransactionType::from_wire_code(&r.string("type")?)?;
        let header = Header {
            sender: Address::new(
                r.fixed::<32>("snd")?
                    .ok_or(TransactionError::MissingField { field: "snd" })?,
            ),
            fee: r.uint("fee")?,
            first_valid: r.uint("fv")?,
            last_valid: r.uint("lv")?,
            genesis_id: r.string("gen")?,
            genesis_hash: r
                .fixed::<HASH_LENGTH>("gh")?
                .ok_or(TransactionError::MissingField { field: "gh" })?,
            note: Some(r.bytes("note")?),
            lease: r.fixed::<HASH_LENGTH>("lx")?,
            rekey_to: read_address(&mut r, "rekey")?,
            group: r.fixed::<HASH_LENGTH>("grp")?,
        };

        let kind = match tx_type {
            TransactionType::Payment => TransactionKind::Payment(Payment {
                amount: r.uint("amt")?,
                receiver: read_address(&mut r, "rcv")?.unwrap_or_default(),
                close_remainder_to: read_address(&mut r, "close")?,
            }),
            TransactionType::KeyRegistration => {
                TransactionKind::KeyRegistration(read_key_registration(&mut r)?)
            }
            TransactionType::AssetConfig => {
                let asset_id = r.uint("caid")?;
                let params = if r.has("apar") {
                    Some(read_asset_params(r.map("apar")?)?)
                } else {
                    None
                };
                TransactionKind::AssetConfig(AssetConfig { asset_id, params })
            }
            TransactionType::AssetTransfer => TransactionKind::AssetTransfer(AssetTransfer {
                asset_id: r.uint("xaid")?,
                amount: r.uint("aamt")?,
                receiver: read_address(&mut r, "arcv")?.unwrap_or_default(),
                close_to: read_address(&mut r, "aclose")?,
                revocation_target: read_address(&mut r, "asnd")?,
            }),
            TransactionType::AssetFreeze => TransactionKind::AssetFreeze(AssetFreeze {
                asset_id: r.uint("faid")?,
                freeze_account: read_address(&mut r, "fadd")?.unwrap_or_default(),
                frozen: r.boolean("afrz")?,
            }),
            TransactionType::ApplicationCall => {
                TransactionKind::ApplicationCall(read_application_call(&mut r)?)
            }
            TransactionType::StateProof => {
                let state_proof_type = r.uint("sptype")?;
                let state_proof = match r.raw("sp") {
                    Some(value) => encode(&value)?,
                    None => Vec::new(),
                };
                let message = if r.has("spmsg") {
                    let mut m = MapReader::new(r.map("spmsg")?, "spmsg");
                    let msg = StateProofMessage {
                        ln_proven_weight: m.uint("P")?,
                        block_headers_commitment: m.bytes("b")?,
                        first_attested_round: m.uint("f")?,
                        last_attested_round: m.uint("l")?,
                        voters_commitment: m.bytes("v")?,
                    };
                    m.finish()?;
                    Some(msg)
                } else {
                    None
                };
                TransactionKind::StateProof(StateProof {
                    state_proof_type,
                    state_proof,
                    message,
                })
            }
        };

        r.finish()?;
        Transaction::new(header, kind)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn insert_address(
    map: &mut CanonicalMap,
    key: &str,
    addr: &Option<Address>,
) -> Result<(), EncodingError> {
    match addr {
        Some(a) => map.insert_fixed(key, a.as_bytes()),
        None => Ok(()),
    }
}

fn read_address(r: &mut MapReader, key: &str) -> Result<Option<Address>, EncodingError> {
    Ok(r.fixed::<32>(key)?.map(Address::new))
}

fn asset_params_map(p: &AssetParams) -> Result<CanonicalMap, EncodingError> {
    let mut m = CanonicalMap::new();
    if let Some(hash) = &p.metadata_hash {
        m.insert_fixed("am", hash)?;
    }
    m.insert_str("an", &p.asset_name)?;
    m.insert_str("au", &p.url)?;
    insert_address(&mut m, "c", &p.clawback)?;
    m.insert_uint("dc", u64::from(p.decimals))?;
    m.insert_bool("df", p.default_frozen)?;
    insert_address(&mut m, "f", &p.freeze)?;
    insert_address(&mut m, "m", &p.manager)?;
    insert_address(&mut m, "r", &p.reserve)?;
    m.insert_uint("t", p.total)?;
    m.insert_str("un", &p.unit_name)?;
    Ok(m)
}

fn read_asset_params(map: CanonicalMap) -> Result<AssetParams, TransactionError> {
    let mut r = MapReader::new(map, "apar");
    let decimals = u32::try_from(r.uint("dc")?).map_err(|_| TransactionError::InvalidField {
        field: "apar.dc",
        reason: "decimals out of range",
    })?;
    let params = AssetParams {
        total: r.uint("t")?,
        decimals,
        default_frozen: r.boolean("df")?,
        unit_name: r.string("un")?,
        asset_name: r.string("an")?,
        url: r.string("au")?,
        metadata_hash: r.fixed::<32>("am")?,
        manager: read_address(&mut r, "m")?,
        reserve: read_address(&mut r, "r")?,
        freeze: read_address(&mut r, "f")?,
        clawback: read_address(&mut r, "c")?,
    };
    r.finish()?;
    Ok(params)
}

fn read_key_registration(r: &mut MapReader) -> Result<KeyRegistration, TransactionError> {
    let vote_key = r.fixed::<32>("votekey")?;
    let selection_key = r.fixed::<32>("selkey")?;
    let state_proof_key = r.fixed::<STATE_PROOF_KEY_LENGTH>("sprfkey")?;
    let vote_first = r.uint("votefst")?;
    let vote_last = r.uint("votelst")?;
    let vote_key_dilution = r.uint("votekd")?;
    let non_participation = r.boolean("nonpart")?;

    let any_online = vote_key.is_some()
        || selection_key.is_some()
        || state_proof_key.is_some()
        || vote_first != 0
        || vote_last != 0
        || vote_key_dilution != 0;
    let participation = if any_online {
        Some(Participation {
            vote_key: vote_key.ok_or(TransactionError::MissingField { field: "votekey" })?,
            selection_key: selection_key.ok_or(TransactionError::MissingField { field: "selkey" })?,
            state_proof_key,
            vote_first,
            vote_last,
            vote_key_dilution,
        })
    } else {
        None
    };
    Ok(KeyRegistration {
        participation,
        non_participation,
    })
}

fn schema_map(s: &StateSchema) -> Result<CanonicalMap, EncodingError> {
    let mut m = CanonicalMap::new();
    m.insert_uint("nbs", s.num_byte_slices)?;
    m.insert_uint("nui", s.num_uints)?;
    Ok(m)
}

fn read_schema(map: CanonicalMap, context: &'static str) -> Result<StateSchema, EncodingError> {
    let mut r = MapReader::new(map, context);
    let schema = StateSchema {
        num_byte_slices: r.uint("nbs")?,
        num_uints: r.uint("nui")?,
    };
    r.finish()?;
    Ok(schema)
}

fn read_application_call(r: &mut MapReader) -> Result<ApplicationCall, TransactionError> {
    let accounts = r
        .bytes_array("apat")?
        .into_iter()
        .map(|raw| {
            let got = raw.len();
            let bytes: [u8; 32] = raw.try_into().map_err(|_| EncodingError::WrongLength {
                field: "txn.apat".into(),
                expected: 32,
                got,
            })?;
            Ok(Address::new(bytes))
        })
        .collect::<Result<Vec<_>, EncodingError>>()?;
    let extra_pages = u32::try_from(r.uint("apep")?).map_err(|_| TransactionError::InvalidField {
        field: "apep",
        reason: "extra pages out of range",
    })?;

    Ok(ApplicationCall {
        app_id: r.uint("apid")?,
        on_complete: OnComplete::from_code(r.uint("apan")?)?,
        approval_program: r.bytes("apap")?,
        clear_program: r.bytes("apsu")?,
        args: r.bytes_array("apaa")?,
        accounts,
        foreign_apps: r.uint_array("apfa")?,
        foreign_assets: r.uint_array("apas")?,
        global_schema: read_schema(r.map("apgs")?, "apgs")?,
        local_schema: read_schema(r.map("apls")?, "apls")?,
        extra_pages,
    })
}
