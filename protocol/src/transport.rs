//! # Submission Seam
//!
//! The library never talks to a node itself. A transport (an HTTP client,
//! a test double, a queue) implements [`Submitter`], and
//! [`submit_signed`] hands it the canonical bytes.
//!
//! Several signed transactions are submitted as one buffer: the canonical
//! encoding is self-delimiting, so concatenated envelopes decode
//! unambiguously. This is how atomic groups reach the network.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::encoding::EncodingError;
use crate::transaction::SignedTransaction;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The node received the transaction and refused it.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The node could not be reached or the exchange failed midway.
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("nothing to submit")]
    EmptyBatch,

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Sends signed-transaction bytes to the network.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Submit one or more concatenated signed-transaction encodings and
    /// return the id the network reports (the first transaction's id).
    async fn submit_raw(&self, signed: &[u8]) -> Result<String, SubmitError>;
}

/// Encode `stxns` back to back and submit them in one call.
pub async fn submit_signed<S>(submitter: &S, stxns: &[SignedTransaction]) -> Result<String, SubmitError>
where
    S: Submitter + ?Sized,
{
    if stxns.is_empty() {
        return Err(SubmitError::EmptyBatch);
    }
    let mut buffer = Vec::new();
    for stxn in stxns {
        buffer.extend_from_slice(&stxn.to_bytes()?);
    }
    debug!(count = stxns.len(), bytes = buffer.len(), "submitting signed transactions");
    submitter.submit_raw(&buffer).await
}
