//! Document codec: MessagePack encoding, decoding and field extraction
//!
//! Every document stored in a set is encoded as self-describing MessagePack.
//! The encoding is an internal detail (it never crosses the wire) but it is
//! fixed: one format, used exclusively, so that raw bytes captured before a
//! mutation can always be re-extracted during index maintenance.
//!
//! ## Canonical stringification
//!
//! The secondary index layer compares field values as strings after
//! canonicalization, so the same logical value keys to the same bucket no
//! matter how it was encoded (int32 vs int64 vs uint). Numeric ordering is
//! recovered separately by the sortable index, which re-parses canonical
//! strings as `f64` where possible.
//!
//! | Value | Canonical form |
//! |-------|----------------|
//! | String | itself |
//! | Int / UInt | decimal text (`42`) |
//! | Float | shortest decimal text (`3.14`, `1200`) |
//! | Bool | `true` / `false` |
//! | Null / Array / Object | rejected with `unsupported_type` |

use crate::error::{Error, Result};
use crate::value::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a document to its stored byte form
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    rmp_serde::to_vec(value).map_err(|e| Error::codec(e.to_string()))
}

/// Decode stored bytes into a dynamic [`Value`]
pub fn decode(bytes: &[u8]) -> Result<Value> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::codec(e.to_string()))
}

/// Decode stored bytes into a caller-chosen type
pub fn decode_as<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::codec(e.to_string()))
}

/// Extract one named top-level field as its canonical string
///
/// Returns `Ok(None)` when the field is absent; absence is a defined case
/// for schemaless documents, not an error. Decode failures and documents
/// whose root is not a string-keyed map are `codec_error`; present fields
/// that cannot be canonicalized are `unsupported_type`.
pub fn extract_field(bytes: &[u8], field: &str) -> Result<Option<String>> {
    let doc = decode(bytes)?;
    let map = match doc {
        Value::Object(map) => map,
        other => {
            return Err(Error::codec(format!(
                "document root is {}, expected a map",
                other.type_name()
            )))
        }
    };
    match map.get(field) {
        None => Ok(None),
        Some(value) => canonical_string(field, value).map(Some),
    }
}

/// Canonicalize a scalar field value to its index string form
///
/// `field` is carried for error context only.
pub fn canonical_string(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Int(i) => Ok(i.to_string()),
        Value::UInt(u) => Ok(u.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        other => Err(Error::unsupported_type(field, other.type_name())),
    }
}
