//! # Canonical Encoding
//!
//! The consensus wire format: a canonical subset of MessagePack.
//!
//! ```text
//! value.rs   : Value / CanonicalMap; the omit-empty rule lives here
//! encoder.rs : canonical writer (smallest markers, sorted keys)
//! decoder.rs : strict reader, plus a canonical-form check
//! reader.rs  : typed, consuming field access for decoding structs
//! ```
//!
//! ## Rules
//!
//! 1. Unsigned integers use the smallest representation that fits.
//! 2. Byte strings (`bin`) and strings (`str`) carry explicit lengths.
//! 3. Map keys are strings in byte-lexicographic order, never repeated.
//! 4. Arrays keep input order.
//! 5. Booleans are `0xc2` / `0xc3`, never integers.
//! 6. Fields equal to their type's zero are omitted from maps entirely.
//!
//! Signatures and ids are computed over these bytes, so any divergence here
//! changes what gets signed.

pub mod base64_serde;
pub mod decoder;
pub mod encoder;
pub mod reader;
pub mod value;

pub use decoder::{decode, decode_canonical, decode_map_canonical, decode_prefix};
pub use encoder::{encode, encode_map};
pub use reader::MapReader;
pub use value::{CanonicalMap, Value};

use thiserror::Error;

/// Errors raised while encoding or decoding canonical values.
///
/// All of these mean the input was malformed; none of them are
/// cryptographic failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("write failed: {0}")]
    Write(String),

    #[error("length {len} does not fit a 32-bit length prefix")]
    LengthOverflow { len: usize },

    #[error("duplicate map key: {0}")]
    DuplicateKey(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("{remaining} trailing bytes after the encoded value")]
    TrailingBytes { remaining: usize },

    #[error("unsupported wire type (marker 0x{marker:02x})")]
    UnsupportedType { marker: u8 },

    #[error("map key is not a string")]
    NonStringKey,

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("nesting too deep")]
    TooDeep,

    #[error("input is not in canonical form: {0}")]
    NotCanonical(String),

    #[error("field {field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field {field}: expected {expected} bytes, got {got}")]
    WrongLength {
        field: String,
        expected: usize,
        got: usize,
    },

    #[error("unexpected field {field} in {context}")]
    UnexpectedField {
        context: &'static str,
        field: String,
    },

    /// A required field holds its zero value, which omit-empty would drop.
    #[error("field {field} is all zero and has no encoding")]
    ZeroValue { field: &'static str },
}
