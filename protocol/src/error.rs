//! Crate-level error type.
//!
//! Each module reports its own error enum. [`Error`] wraps all of them for
//! callers that drive several stages at once, and [`Error::kind`] sorts any
//! failure into one of four buckets so a caller can decide whether to fix
//! its input, collect more signatures, treat the data as tampered, or retry
//! a submission.

use thiserror::Error;

use crate::crypto::{KeyError, SignatureError};
use crate::encoding::EncodingError;
use crate::identity::AddressError;
use crate::logicsig::LogicSigError;
use crate::multisig::MultisigError;
use crate::transaction::TransactionError;
use crate::transport::SubmitError;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad field combination, wrong length, out-of-range index, undecodable
    /// bytes. The caller's input needs fixing.
    Malformed,
    /// A signature or checksum did not verify: wrong key, corruption, or
    /// tampering.
    Verification,
    /// Multisig metadata disagrees or the threshold is not met. Recoverable
    /// by supplying more signatures or consistent metadata.
    Policy,
    /// The external submission layer failed.
    Transport,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Multisig(#[from] MultisigError),

    #[error(transparent)]
    LogicSig(#[from] LogicSigError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Encoding(_) | Error::Key(_) => ErrorKind::Malformed,
            Error::Address(e) => e.kind(),
            Error::Signature(_) => ErrorKind::Verification,
            Error::Transaction(e) => e.kind(),
            Error::Multisig(e) => e.kind(),
            Error::LogicSig(e) => e.kind(),
            Error::Submit(_) => ErrorKind::Transport,
        }
    }
}

impl AddressError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AddressError::ChecksumMismatch => ErrorKind::Verification,
            _ => ErrorKind::Malformed,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let e: Error = AddressError::ChecksumMismatch.into();
        assert_eq!(e.kind(), ErrorKind::Verification);

        let e: Error = AddressError::WrongLength { got: 3 }.into();
        assert_eq!(e.kind(), ErrorKind::Malformed);

        let e: Error = MultisigError::ThresholdNotMet {
            valid: 1,
            invalid: 0,
            threshold: 2,
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::Policy);

        let e: Error = SignatureError::VerificationFailed.into();
        assert_eq!(e.kind(), ErrorKind::Verification);

        let e: Error = SubmitError::Rejected("overspend".into()).into();
        assert_eq!(e.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_transparent_display() {
        let e: Error = EncodingError::UnexpectedEof.into();
        assert_eq!(e.to_string(), "unexpected end of input");
    }
}
