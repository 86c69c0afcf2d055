//! Suggested transaction parameters, as a node reports them.
//!
//! The JSON shape is the node's `/v2/transactions/params` response:
//!
//! ```json
//! {
//!   "fee": 0,
//!   "min-fee": 1000,
//!   "last-round": 1234,
//!   "genesis-id": "testnet-v1.0",
//!   "genesis-hash": "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI="
//! }
//! ```

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::path::Path;

use algosig::transaction::SuggestedParams;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeParams {
    /// Per-byte fee rate.
    pub fee: u64,
    #[serde(default)]
    pub min_fee: u64,
    pub last_round: u64,
    pub genesis_id: String,
    /// Base64.
    pub genesis_hash: String,
}

impl NodeParams {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read params file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse params file {}", path.display()))
    }

    /// Parameters for a transaction valid from the node's last round for
    /// `validity` rounds.
    pub fn suggested(&self, validity: u64) -> Result<SuggestedParams> {
        let hash = STANDARD
            .decode(&self.genesis_hash)
            .context("genesis-hash is not valid base64")?;
        let Ok(genesis_hash) = <[u8; 32]>::try_from(hash.as_slice()) else {
            bail!("genesis-hash must be 32 bytes, got {}", hash.len());
        };
        Ok(SuggestedParams {
            fee: self.fee,
            flat_fee: false,
            first_valid: self.last_round,
            last_valid: self.last_round.saturating_add(validity),
            genesis_id: self.genesis_id.clone(),
            genesis_hash,
        })
    }
}
