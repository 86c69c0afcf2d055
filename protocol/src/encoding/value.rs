//! The canonical value model.
//!
//! A [`Value`] is the closed set of types the consensus encoding knows
//! about. There is no signed integer, float, nil or extension variant, so a
//! value that cannot be encoded canonically cannot be constructed in the
//! first place.
//!
//! [`CanonicalMap`] is where the omit-empty rule lives. Its `insert_*`
//! helpers drop any value equal to its type's zero, which means a field
//! explicitly set to zero and a field never set produce identical bytes.

use std::collections::BTreeMap;

use super::EncodingError;

/// A value in the canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Uint(u64),
    Bool(bool),
    Bytes(Vec<u8>),
    Str(String),
    Array(Vec<Value>),
    Map(CanonicalMap),
}

impl Value {
    /// `true` when the value equals its type's zero: `0`, `false`, an empty
    /// byte string, string, array or map.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Uint(n) => *n == 0,
            Value::Bool(b) => !*b,
            Value::Bytes(b) => b.is_empty(),
            Value::Str(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
        }
    }

    /// Short type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Uint(_) => "uint",
            Value::Bool(_) => "bool",
            Value::Bytes(_) => "bytes",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// `true` if any map nested anywhere in this value holds an empty entry.
    pub(crate) fn contains_empty_entry(&self) -> bool {
        match self {
            Value::Array(items) => items.iter().any(Value::contains_empty_entry),
            Value::Map(map) => map
                .iter()
                .any(|(_, v)| v.is_empty() || v.contains_empty_entry()),
            _ => false,
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<CanonicalMap> for Value {
    fn from(map: CanonicalMap) -> Self {
        Value::Map(map)
    }
}

/// A string-keyed map whose entries are always held in byte-lexicographic
/// key order (`BTreeMap<String, _>` orders by UTF-8 bytes).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalMap {
    entries: BTreeMap<String, Value>,
}

impl CanonicalMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key` unless it is empty.
    ///
    /// Inserting the same key twice is a programming error and is reported,
    /// never resolved by overwriting.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Result<(), EncodingError> {
        let value = value.into();
        if value.is_empty() {
            return Ok(());
        }
        self.insert_raw(key.to_string(), value)
    }

    pub fn insert_uint(&mut self, key: &str, value: u64) -> Result<(), EncodingError> {
        self.insert(key, Value::Uint(value))
    }

    pub fn insert_bool(&mut self, key: &str, value: bool) -> Result<(), EncodingError> {
        self.insert(key, Value::Bool(value))
    }

    pub fn insert_str(&mut self, key: &str, value: &str) -> Result<(), EncodingError> {
        self.insert(key, Value::Str(value.to_string()))
    }

    pub fn insert_bytes(&mut self, key: &str, value: &[u8]) -> Result<(), EncodingError> {
        self.insert(key, Value::Bytes(value.to_vec()))
    }

    /// Insert a fixed-width byte array (address, hash, key, signature).
    ///
    /// Fixed arrays have no "empty" length, so their zero value is all-zero
    /// bytes and that is what gets omitted.
    pub fn insert_fixed(&mut self, key: &str, value: &[u8]) -> Result<(), EncodingError> {
        if value.iter().all(|b| *b == 0) {
            return Ok(());
        }
        self.insert_raw(key.to_string(), Value::Bytes(value.to_vec()))
    }

    pub fn insert_map(&mut self, key: &str, value: CanonicalMap) -> Result<(), EncodingError> {
        self.insert(key, Value::Map(value))
    }

    pub fn insert_array(&mut self, key: &str, items: Vec<Value>) -> Result<(), EncodingError> {
        self.insert(key, Value::Array(items))
    }

    /// Insert without the omit-empty filter. Used by the decoder, which
    /// has to see exactly what was on the wire.
    pub(crate) fn insert_raw(&mut self, key: String, value: Value) -> Result<(), EncodingError> {
        if self.entries.contains_key(&key) {
            return Err(EncodingError::DuplicateKey(key));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical (sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_dropped() {
        let mut map = CanonicalMap::new();
        map.insert_uint("fee", 0).unwrap();
        map.insert_bool("nonpart", false).unwrap();
        map.insert_str("gen", "").unwrap();
        map.insert_bytes("note", &[]).unwrap();
        map.insert_array("apaa", vec![]).unwrap();
        map.insert_map("apar", CanonicalMap::new()).unwrap();
        map.insert_fixed("rcv", &[0u8; 32]).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_keys_iterate_sorted() {
        let mut map = CanonicalMap::new();
        map.insert_str("type", "pay").unwrap();
        map.insert_uint("amt", 1).unwrap();
        map.insert_uint("fv", 2).unwrap();
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["amt", "fv", "type"]);
    }

    #[test]
    fn test_byte_order_not_case_folded() {
        // Uppercase sorts before lowercase in byte order: "P" < "b".
        let mut map = CanonicalMap::new();
        map.insert_uint("b", 1).unwrap();
        map.insert_uint("P", 2).unwrap();
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["P", "b"]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut map = CanonicalMap::new();
        map.insert_uint("fee", 1).unwrap();
        assert_eq!(
            map.insert_uint("fee", 2),
            Err(EncodingError::DuplicateKey("fee".to_string()))
        );
    }

    #[test]
    fn test_array_elements_are_kept_even_if_empty() {
        let mut map = CanonicalMap::new();
        map.insert_array("apaa", vec![Value::Bytes(vec![]), Value::Bytes(vec![1])])
            .unwrap();
        match map.get("apaa") {
            Some(Value::Array(items)) => assert_eq!(items.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_contains_empty_entry_detects_nested() {
        let mut inner = CanonicalMap::new();
        inner.insert_raw("t".into(), Value::Uint(0)).unwrap();
        let mut outer = CanonicalMap::new();
        outer.insert_raw("apar".into(), Value::Map(inner)).unwrap();
        assert!(Value::Map(outer).contains_empty_entry());
    }
}
