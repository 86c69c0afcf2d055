//! Canonical MessagePack writer.
//!
//! Marker selection is delegated to `rmp`, whose `write_uint` / `write_str`
//! / `write_bin` / `write_*_len` always choose the smallest representation.
//! The canonical policy (sorted keys, no empties, no signed or float types)
//! is enforced by the [`Value`] model before a byte is written.

use std::fmt;

use super::value::{CanonicalMap, Value};
use super::EncodingError;

/// Encode a value into its canonical byte form.
pub fn encode(value: &Value) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::with_capacity(256);
    write_value(&mut buf, value)?;
    Ok(buf)
}

/// Encode a map into its canonical byte form.
pub fn encode_map(map: &CanonicalMap) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::with_capacity(256);
    write_map(&mut buf, map)?;
    Ok(buf)
}

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), EncodingError> {
    match value {
        Value::Uint(n) => {
            rmp::encode::write_uint(buf, *n).map_err(write_error)?;
        }
        Value::Bool(b) => {
            rmp::encode::write_bool(buf, *b).map_err(write_error)?;
        }
        Value::Bytes(bytes) => {
            checked_len(bytes.len())?;
            rmp::encode::write_bin(buf, bytes).map_err(write_error)?;
        }
        Value::Str(s) => {
            checked_len(s.len())?;
            rmp::encode::write_str(buf, s).map_err(write_error)?;
        }
        Value::Array(items) => {
            let len = checked_len(items.len())?;
            rmp::encode::write_array_len(buf, len).map_err(write_error)?;
            for item in items {
                write_value(buf, item)?;
            }
        }
        Value::Map(map) => write_map(buf, map)?,
    }
    Ok(())
}

fn write_map(buf: &mut Vec<u8>, map: &CanonicalMap) -> Result<(), EncodingError> {
    let len = checked_len(map.len())?;
    rmp::encode::write_map_len(buf, len).map_err(write_error)?;
    for (key, value) in map.iter() {
        checked_len(key.len())?;
        rmp::encode::write_str(buf, key).map_err(write_error)?;
        write_value(buf, value)?;
    }
    Ok(())
}

/// MessagePack lengths are at most 32 bits. `rmp` would truncate silently.
fn checked_len(len: usize) -> Result<u32, EncodingError> {
    u32::try_from(len).map_err(|_| EncodingError::LengthOverflow { len })
}

fn write_error<E: fmt::Display>(err: E) -> EncodingError {
    EncodingError::Write(err.to_string())
}
