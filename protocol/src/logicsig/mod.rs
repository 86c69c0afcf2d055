//! # Logic Signatures
//!
//! A logic signature authorizes a transaction by program rather than by key.
//! Three forms exist:
//!
//! - **Undelegated**: the program's own address is the authorizing account.
//!   Holding the program is the authorization; anyone can re-derive
//!   `SHA-512/256("Program" || program)` and compare.
//! - **Single delegation**: an account key signs `"Program" || program`,
//!   letting the program act for that account.
//! - **Multisig delegation**: the same message signed through a
//!   [`MultisigSignatureSet`], with the usual threshold rules.
//!
//! Arguments are opaque witness data for the program's execution and are
//! passed through untouched. Nothing in this module executes programs.
//!
//! ## Wire form
//!
//! ```text
//! lsig: { arg: [<bytes>...]?, l: <program>, msig: {..}?, sig: <64>? }
//! ```

use thiserror::Error;
use tracing::debug;

use crate::config::{LOGIC_SIG_MAX_SIZE, PROGRAM_DATA_DOMAIN, PROGRAM_DOMAIN, SIGNATURE_LENGTH};
use crate::crypto::{domain_separated_bytes, Keypair, PublicKey, Signature};
use crate::encoding::{CanonicalMap, EncodingError, MapReader, Value};
use crate::error::ErrorKind;
use crate::identity::Address;
use crate::multisig::{MultisigError, MultisigSignatureSet};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LogicSigError {
    #[error("logic signature program is empty")]
    EmptyProgram,

    #[error("program and arguments are {size} bytes, maximum is {max}")]
    TooLarge { size: usize, max: usize },

    /// The logic signature authorizes a different account.
    #[error("logic signature authorizes {found}, expected {expected}")]
    AuthorityMismatch { expected: String, found: String },

    #[error("delegation signature does not verify")]
    InvalidSignature,

    #[error("logic signature carries both a single and a multisig delegation")]
    ConflictingDelegation,

    #[error(transparent)]
    Multisig(#[from] MultisigError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl LogicSigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LogicSigError::AuthorityMismatch { .. } | LogicSigError::InvalidSignature => {
                ErrorKind::Verification
            }
            LogicSigError::Multisig(e) => e.kind(),
            _ => ErrorKind::Malformed,
        }
    }
}

/// The address a program authorizes when used without delegation.
pub fn program_address(program: &[u8]) -> Address {
    Address::from_domain_hash(PROGRAM_DOMAIN, program)
}

/// `"Program" || program`, the buffer delegating keys sign.
pub fn program_signing_bytes(program: &[u8]) -> Vec<u8> {
    domain_separated_bytes(PROGRAM_DOMAIN, program)
}

fn program_data_bytes(data: &[u8], program: &[u8]) -> Vec<u8> {
    let address = program_address(program);
    let mut message = Vec::with_capacity(PROGRAM_DATA_DOMAIN.len() + 32 + data.len());
    message.extend_from_slice(PROGRAM_DATA_DOMAIN);
    message.extend_from_slice(address.as_bytes());
    message.extend_from_slice(data);
    message
}

/// Sign arbitrary `data` for consumption by `program`.
///
/// The message is `"ProgData" || program_address || data`, so the signature
/// cannot be replayed against another program or as a transaction.
pub fn sign_program_data(data: &[u8], program: &[u8], keypair: &Keypair) -> Signature {
    keypair.sign(&program_data_bytes(data, program))
}

/// Verify a signature produced by [`sign_program_data`].
pub fn verify_program_data(
    data: &[u8],
    program: &[u8],
    public_key: &PublicKey,
    signature: &Signature,
) -> bool {
    public_key.verify(&program_data_bytes(data, program), signature)
}

/// Who delegated authority to the program, if anyone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delegation {
    Single(Signature),
    Multi(MultisigSignatureSet),
}

/// A program plus optional delegation and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicSigAuth {
    program: Vec<u8>,
    args: Vec<Vec<u8>>,
    delegation: Option<Delegation>,
}

impl LogicSigAuth {
    /// Program-only authorization; the program's address is the signer.
    pub fn build_undelegated(program: Vec<u8>) -> Result<Self, LogicSigError> {
        let lsig = Self {
            program,
            args: Vec::new(),
            delegation: None,
        };
        lsig.check_size()?;
        Ok(lsig)
    }

    /// Delegate `keypair`'s account to the program.
    pub fn build_delegated_single(
        program: Vec<u8>,
        keypair: &Keypair,
    ) -> Result<Self, LogicSigError> {
        let mut lsig = Self::build_undelegated(program)?;
        let signature = keypair.sign(&program_signing_bytes(&lsig.program));
        lsig.delegation = Some(Delegation::Single(signature));
        debug!(delegator = %keypair.address(), "delegated logic signature");
        Ok(lsig)
    }

    /// Delegate a multisig account to the program.
    ///
    /// `signatures` must already hold subsignatures over
    /// [`program_signing_bytes`]; it is finalized here, so invalid slots are
    /// dropped and the threshold is enforced.
    pub fn build_delegated_multi(
        program: Vec<u8>,
        signatures: &MultisigSignatureSet,
    ) -> Result<Self, LogicSigError> {
        let mut lsig = Self::build_undelegated(program)?;
        let finalized = signatures.finalize(&program_signing_bytes(&lsig.program))?;
        debug!(delegator = %finalized.address(), "delegated logic signature to multisig");
        lsig.delegation = Some(Delegation::Multi(finalized.into_signature_set()));
        Ok(lsig)
    }

    /// Attach witness arguments, replacing any already present.
    pub fn with_args(mut self, args: Vec<Vec<u8>>) -> Result<Self, LogicSigError> {
        self.args = args;
        self.check_size()?;
        Ok(self)
    }

    pub fn program(&self) -> &[u8] {
        &self.program
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    pub fn delegation(&self) -> Option<&Delegation> {
        self.delegation.as_ref()
    }

    /// The program's own address, regardless of delegation.
    pub fn address(&self) -> Address {
        program_address(&self.program)
    }

    /// Check that this logic signature may act for `authorizer`.
    ///
    /// Undelegated: the program address must be `authorizer`. Single
    /// delegation: the signature must verify under `authorizer`'s key.
    /// Multisig delegation: the multisig address must be `authorizer` and
    /// its subsignatures must meet the threshold.
    pub fn verify(&self, authorizer: &Address) -> Result<(), LogicSigError> {
        match &self.delegation {
            None => {
                let address = self.address();
                if address != *authorizer {
                    return Err(LogicSigError::AuthorityMismatch {
                        expected: authorizer.to_string(),
                        found: address.to_string(),
                    });
                }
            }
            Some(Delegation::Single(signature)) => {
                let message = program_signing_bytes(&self.program);
                if !authorizer.public_key().verify(&message, signature) {
                    return Err(LogicSigError::InvalidSignature);
                }
            }
            Some(Delegation::Multi(set)) => {
                let address = set.address();
                if address != *authorizer {
                    return Err(LogicSigError::AuthorityMismatch {
                        expected: authorizer.to_string(),
                        found: address.to_string(),
                    });
                }
                set.verify(&program_signing_bytes(&self.program))?;
            }
        }
        Ok(())
    }

    fn check_size(&self) -> Result<(), LogicSigError> {
        if self.program.is_empty() {
            return Err(LogicSigError::EmptyProgram);
        }
        let size = self.program.len() + self.args.iter().map(Vec::len).sum::<usize>();
        if size > LOGIC_SIG_MAX_SIZE {
            return Err(LogicSigError::TooLarge {
                size,
                max: LOGIC_SIG_MAX_SIZE,
            });
        }
        Ok(())
    }

    // -- wire form ---------------------------------------------------------

    pub fn to_canonical_map(&self) -> Result<CanonicalMap, EncodingError> {
        let mut map = CanonicalMap::new();
        let args = self.args.iter().map(|a| Value::Bytes(a.clone())).collect();
        map.insert_array("arg", args)?;
        map.insert_bytes("l", &self.program)?;
        match &self.delegation {
            Some(Delegation::Single(sig)) => {
                if sig.as_bytes().iter().all(|b| *b == 0) {
                    return Err(EncodingError::ZeroValue { field: "sig" });
                }
                map.insert_fixed("sig", sig.as_bytes())?
            }
            Some(Delegation::Multi(set)) => map.insert_map("msig", set.to_canonical_map()?)?,
            None => {}
        }
        Ok(map)
    }

    pub fn from_canonical_map(map: CanonicalMap) -> Result<Self, LogicSigError> {
        let mut r = MapReader::new(map, "lsig");
        let args = r.bytes_array("arg")?;
        let program = r.bytes("l")?;
        let sig = r.fixed::<SIGNATURE_LENGTH>("sig")?;
        let msig = if r.has("msig") {
            Some(r.map("msig")?)
        } else {
            None
        };
        r.finish()?;

        let delegation = match (sig, msig) {
            (Some(_), Some(_)) => return Err(LogicSigError::ConflictingDelegation),
            (Some(sig), None) => Some(Delegation::Single(Signature::from_bytes(sig))),
            (None, Some(msig)) => Some(Delegation::Multi(MultisigSignatureSet::from_canonical_map(
                msig,
            )?)),
            (None, None) => None,
        };
        let lsig = Self {
            program,
            args,
            delegation,
        };
        lsig.check_size()?;
        Ok(lsig)
    }
}
