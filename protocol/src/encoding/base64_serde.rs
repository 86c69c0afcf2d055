//! Serde adapters rendering byte fields as base64 strings in JSON.
//!
//! JSON is a display and configuration format here. It is never hashed or
//! signed; the canonical encoding is.
//!
//! ```ignore
//! #[serde(with = "crate::encoding::base64_serde::bytes")]
//! genesis_hash: [u8; 32],
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// `T` is anything viewable as bytes and rebuildable from a `Vec<u8>`:
/// `Vec<u8>` and fixed arrays both qualify.
pub mod bytes {
    use super::*;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&STANDARD.encode(value.as_ref()))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<Vec<u8>>,
    {
        let s = String::deserialize(deserializer)?;
        let raw = STANDARD.decode(s.as_bytes()).map_err(D::Error::custom)?;
        let len = raw.len();
        T::try_from(raw).map_err(|_| D::Error::custom(format!("unexpected byte length {len}")))
    }
}

pub mod option {
    use super::*;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        match value {
            Some(v) => serializer.serialize_some(&STANDARD.encode(v.as_ref())),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<Vec<u8>>,
    {
        let Some(s) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let raw = STANDARD.decode(s.as_bytes()).map_err(D::Error::custom)?;
        let len = raw.len();
        T::try_from(raw)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("unexpected byte length {len}")))
    }
}

pub mod list {
    use super::*;
    use serde::de::Error as _;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(value.len()))?;
        for item in value {
            seq.serialize_element(&STANDARD.encode(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .map(|s| STANDARD.decode(s.as_bytes()).map_err(D::Error::custom))
            .collect()
    }
}
