//! Typed field access over a decoded map.
//!
//! [`MapReader`] consumes fields as they are read so that [`MapReader::finish`]
//! can reject any key the caller did not ask for. An absent field reads as
//! its type's zero, mirroring the omit-empty rule on the way in.

use super::value::{CanonicalMap, Value};
use super::EncodingError;

pub struct MapReader {
    map: CanonicalMap,
    context: &'static str,
}

impl MapReader {
    /// `context` names the object being decoded, for error messages.
    pub fn new(map: CanonicalMap, context: &'static str) -> Self {
        Self { map, context }
    }

    /// `true` if `key` is present and not yet consumed.
    pub fn has(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    fn mismatch(&self, key: &str, expected: &'static str, found: &Value) -> EncodingError {
        EncodingError::TypeMismatch {
            field: format!("{}.{}", self.context, key),
            expected,
            found: found.type_name(),
        }
    }

    pub fn uint(&mut self, key: &str) -> Result<u64, EncodingError> {
        match self.map.remove(key) {
            None => Ok(0),
            Some(Value::Uint(n)) => Ok(n),
            Some(other) => Err(self.mismatch(key, "uint", &other)),
        }
    }

    pub fn boolean(&mut self, key: &str) -> Result<bool, EncodingError> {
        match self.map.remove(key) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(b),
            Some(other) => Err(self.mismatch(key, "bool", &other)),
        }
    }

    pub fn string(&mut self, key: &str) -> Result<String, EncodingError> {
        match self.map.remove(key) {
            None => Ok(String::new()),
            Some(Value::Str(s)) => Ok(s),
            Some(other) => Err(self.mismatch(key, "string", &other)),
        }
    }

    pub fn bytes(&mut self, key: &str) -> Result<Vec<u8>, EncodingError> {
        match self.map.remove(key) {
            None => Ok(Vec::new()),
            Some(Value::Bytes(b)) => Ok(b),
            Some(other) => Err(self.mismatch(key, "bytes", &other)),
        }
    }

    /// A byte string that must be exactly `N` bytes when present.
    pub fn fixed<const N: usize>(&mut self, key: &str) -> Result<Option<[u8; N]>, EncodingError> {
        match self.map.remove(key) {
            None => Ok(None),
            Some(Value::Bytes(b)) => {
                let got = b.len();
                let arr: [u8; N] = b.try_into().map_err(|_| EncodingError::WrongLength {
                    field: format!("{}.{}", self.context, key),
                    expected: N,
                    got,
                })?;
                Ok(Some(arr))
            }
            Some(other) => Err(self.mismatch(key, "bytes", &other)),
        }
    }

    pub fn map(&mut self, key: &str) -> Result<CanonicalMap, EncodingError> {
        match self.map.remove(key) {
            None => Ok(CanonicalMap::new()),
            Some(Value::Map(m)) => Ok(m),
            Some(other) => Err(self.mismatch(key, "map", &other)),
        }
    }

    pub fn array(&mut self, key: &str) -> Result<Vec<Value>, EncodingError> {
        match self.map.remove(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(self.mismatch(key, "array", &other)),
        }
    }

    /// An array whose elements must all be byte strings.
    pub fn bytes_array(&mut self, key: &str) -> Result<Vec<Vec<u8>>, EncodingError> {
        let field = format!("{}.{}", self.context, key);
        self.array(key)?
            .into_iter()
            .map(|item| match item {
                Value::Bytes(b) => Ok(b),
                other => Err(EncodingError::TypeMismatch {
                    field: field.clone(),
                    expected: "bytes",
                    found: other.type_name(),
                }),
            })
            .collect()
    }

    /// An array whose elements must all be unsigned integers.
    pub fn uint_array(&mut self, key: &str) -> Result<Vec<u64>, EncodingError> {
        let field = format!("{}.{}", self.context, key);
        self.array(key)?
            .into_iter()
            .map(|item| match item {
                Value::Uint(n) => Ok(n),
                other => Err(EncodingError::TypeMismatch {
                    field: field.clone(),
                    expected: "uint",
                    found: other.type_name(),
                }),
            })
            .collect()
    }

    /// Take a value verbatim, if present.
    pub fn raw(&mut self, key: &str) -> Option<Value> {
        self.map.remove(key)
    }

    /// Fail if any field was left unread.
    pub fn finish(self) -> Result<(), EncodingError> {
        match self.map.keys().next() {
            None => Ok(()),
            Some(key) => Err(EncodingError::UnexpectedField {
                context: self.context,
                field: key.clone(),
            }),
        }
    }
}
