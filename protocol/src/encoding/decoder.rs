//! Strict MessagePack reader for the canonical subset.
//!
//! Marker classification comes from `rmp::Marker`; payloads are read from an
//! in-memory cursor. Anything outside the canonical type set (nil, signed
//! integers, floats, extensions, non-string map keys) is rejected rather than
//! coerced.

use rmp::Marker;

use super::encoder::encode;
use super::value::{CanonicalMap, Value};
use super::EncodingError;

/// Nesting limit. Transactions nest three levels deep at most; anything far
/// beyond that is hostile input.
const MAX_DEPTH: usize = 32;

/// Decode exactly one value. Trailing bytes are an error.
pub fn decode(bytes: &[u8]) -> Result<Value, EncodingError> {
    let (value, rest) = decode_prefix(bytes)?;
    if !rest.is_empty() {
        return Err(EncodingError::TrailingBytes {
            remaining: rest.len(),
        });
    }
    Ok(value)
}

/// Decode one value from the front of `bytes`, returning the unread tail.
///
/// Every encoded value is self-delimiting, so a buffer of concatenated
/// encodings can be split by calling this repeatedly.
pub fn decode_prefix(bytes: &[u8]) -> Result<(Value, &[u8]), EncodingError> {
    let mut reader = Reader {
        data: bytes,
        pos: 0,
    };
    let value = reader.read_value(0)?;
    Ok((value, &bytes[reader.pos..]))
}

/// Decode and require the input to already be in canonical form.
///
/// Re-encoding must reproduce the input byte for byte (which rules out
/// unsorted keys and oversized integer or length markers) and no map may
/// carry an empty value.
pub fn decode_canonical(bytes: &[u8]) -> Result<Value, EncodingError> {
    let value = decode(bytes)?;
    if value.contains_empty_entry() {
        return Err(EncodingError::NotCanonical(
            "map carries an explicitly encoded empty value".into(),
        ));
    }
    if encode(&value)? != bytes {
        return Err(EncodingError::NotCanonical(
            "re-encoding does not reproduce the input".into(),
        ));
    }
    Ok(value)
}

/// [`decode_canonical`] for inputs that must be a map.
pub fn decode_map_canonical(bytes: &[u8]) -> Result<CanonicalMap, EncodingError> {
    match decode_canonical(bytes)? {
        Value::Map(map) => Ok(map),
        other => Err(EncodingError::TypeMismatch {
            field: "<root>".into(),
            expected: "map",
            found: other.type_name(),
        }),
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], EncodingError> {
        let end = self.pos.checked_add(n).ok_or(EncodingError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(EncodingError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, EncodingError> {
        Ok(self.take(1)?[0])
    }

    fn read_be(&mut self, width: usize) -> Result<u64, EncodingError> {
        let bytes = self.take(width)?;
        Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    fn read_len(&mut self, width: usize) -> Result<usize, EncodingError> {
        let len = self.read_be(width)?;
        usize::try_from(len).map_err(|_| EncodingError::LengthOverflow { len: usize::MAX })
    }

    fn read_value(&mut self, depth: usize) -> Result<Value, EncodingError> {
        if depth > MAX_DEPTH {
            return Err(EncodingError::TooDeep);
        }
        let byte = self.read_u8()?;
        match Marker::from_u8(byte) {
            Marker::FixPos(n) => Ok(Value::Uint(u64::from(n))),
            Marker::U8 => Ok(Value::Uint(self.read_be(1)?)),
            Marker::U16 => Ok(Value::Uint(self.read_be(2)?)),
            Marker::U32 => Ok(Value::Uint(self.read_be(4)?)),
            Marker::U64 => Ok(Value::Uint(self.read_be(8)?)),
            Marker::True => Ok(Value::Bool(true)),
            Marker::False => Ok(Value::Bool(false)),
            Marker::Bin8 => self.read_bytes(1),
            Marker::Bin16 => self.read_bytes(2),
            Marker::Bin32 => self.read_bytes(4),
            Marker::FixStr(n) => self.read_str_body(usize::from(n)),
            Marker::Str8 => {
                let len = self.read_len(1)?;
                self.read_str_body(len)
            }
            Marker::Str16 => {
                let len = self.read_len(2)?;
                self.read_str_body(len)
            }
            Marker::Str32 => {
                let len = self.read_len(4)?;
                self.read_str_body(len)
            }
            Marker::FixArray(n) => self.read_array(usize::from(n), depth),
            Marker::Array16 => {
                let len = self.read_len(2)?;
                self.read_array(len, depth)
            }
            Marker::Array32 => {
                let len = self.read_len(4)?;
                self.read_array(len, depth)
            }
            Marker::FixMap(n) => self.read_map(usize::from(n), depth),
            Marker::Map16 => {
                let len = self.read_len(2)?;
                self.read_map(len, depth)
            }
            Marker::Map32 => {
                let len = self.read_len(4)?;
                self.read_map(len, depth)
            }
            _ => Err(EncodingError::UnsupportedType { marker: byte }),
        }
    }

    fn read_bytes(&mut self, width: usize) -> Result<Value, EncodingError> {
        let len = self.read_len(width)?;
        Ok(Value::Bytes(self.take(len)?.to_vec()))
    }

    fn read_str_body(&mut self, len: usize) -> Result<Value, EncodingError> {
        let raw = self.take(len)?;
        let s = std::str::from_utf8(raw).map_err(|_| EncodingError::InvalidUtf8)?;
        Ok(Value::Str(s.to_string()))
    }

    fn read_array(&mut self, len: usize, depth: usize) -> Result<Value, EncodingError> {
        // Every element takes at least one byte; don't pre-allocate for a
        // length prefix that the remaining input cannot possibly satisfy.
        let mut items = Vec::with_capacity(len.min(self.data.len() - self.pos));
        for _ in 0..len {
            items.push(self.read_value(depth + 1)?);
        }
        Ok(Value::Array(items))
    }

    fn read_map(&mut self, len: usize, depth: usize) -> Result<Value, EncodingError> {
        let mut map = CanonicalMap::new();
        for _ in 0..len {
            let key = match self.read_value(depth + 1)? {
                Value::Str(key) => key,
                _ => return Err(EncodingError::NonStringKey),
            };
            let value = self.read_value(depth + 1)?;
            map.insert_raw(key, value)?;
        }
        Ok(Value::Map(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encoder::encode_map;

    #[test]
    fn test_decode_roundtrip_nested() {
        let mut inner = CanonicalMap::new();
        inner.insert_uint("t", 1_000_000).unwrap();
        inner.insert_str("un", "TOK").unwrap();
        let mut map = CanonicalMap::new();
        map.insert_map("apar", inner).unwrap();
        map.insert_array("apaa", vec![Value::Bytes(vec![1]), Value::Bytes(vec![2, 3])])
            .unwrap();
        map.insert_bool("df", true).unwrap();
        let bytes = encode_map(&map).unwrap();
        assert_eq!(decode_map_canonical(&bytes).unwrap(), map);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert_eq!(
            decode(&[0x01, 0x02]),
            Err(EncodingError::TrailingBytes { remaining: 1 })
        );
    }

    #[test]
    fn test_truncated_input_rejected() {
        assert_eq!(decode(&[0xc4, 0x05, 0x01]), Err(EncodingError::UnexpectedEof));
        assert_eq!(decode(&[]), Err(EncodingError::UnexpectedEof));
    }

    #[test]
    fn test_unsupported_types_rejected() {
        // nil, negative fixint, float64
        for byte in [0xc0u8, 0xff, 0xcb] {
            assert_eq!(
                decode(&[byte]),
                Err(EncodingError::UnsupportedType { marker: byte })
            );
        }
    }

    #[test]
    fn test_non_string_key_rejected() {
        assert_eq!(decode(&[0x81, 0x01, 0x02]), Err(EncodingError::NonStringKey));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let bytes = [0x82, 0xa1, b'a', 0x01, 0xa1, b'a', 0x02];
        assert_eq!(
            decode(&bytes),
            Err(EncodingError::DuplicateKey("a".to_string()))
        );
    }

    #[test]
    fn test_non_minimal_integer_is_not_canonical() {
        // 5 encoded as uint8 instead of positive fixint.
        let bytes = [0xcc, 0x05];
        assert_eq!(decode(&bytes), Ok(Value::Uint(5)));
        assert!(matches!(
            decode_canonical(&bytes),
            Err(EncodingError::NotCanonical(_))
        ));
    }

    #[test]
    fn test_unsorted_keys_are_not_canonical() {
        let bytes = [0x82, 0xa1, b'b', 0x01, 0xa1, b'a', 0x02];
        assert!(decode(&bytes).is_ok());
        assert!(matches!(
            decode_canonical(&bytes),
            Err(EncodingError::NotCanonical(_))
        ));
    }

    #[test]
    fn test_explicit_zero_is_not_canonical() {
        let bytes = [0x81, 0xa3, b'f', b'e', b'e', 0x00];
        assert!(matches!(
            decode_canonical(&bytes),
            Err(EncodingError::NotCanonical(_))
        ));
    }

    #[test]
    fn test_hostile_array_length_does_not_allocate() {
        // array32 claiming 4 billion elements with no payload.
        let bytes = [0xdd, 0xff, 0xff, 0xff, 0xff];
        assert_eq!(decode(&bytes), Err(EncodingError::UnexpectedEof));
    }
}
