//! Set: a named key → document store
//!
//! A set maps string keys to encoded document bytes. The bytes are always a
//! valid encoding produced by the document codec; callers hand in a
//! [`Value`] (or anything `Serialize`) and the set encodes on the way in.
//!
//! ## Thread safety
//!
//! All state sits behind one `parking_lot::RwLock`. Reads (`get`, `get_raw`,
//! `has`, `keys`, `len`, `scan`) take the reader side; `put`, `delete` and
//! `clear` take the writer side. `keys()` and `scan()` observe the state as
//! of read-lock acquisition; there is no weakly consistent iteration.
//!
//! A set knows nothing about indexes. Writing through `Set::put` directly
//! does not touch any index; callers that need index consistency go through
//! `Database::put` / `Database::delete`.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use stash_core::{codec, Error, Result, Value};
use std::collections::HashMap;

/// A named collection of key → encoded-document pairs
#[derive(Debug, Default)]
pub struct Set {
    name: String,
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl Set {
    /// Create an empty set with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Set {
            name: name.into(),
            data: RwLock::new(HashMap::new()),
        }
    }

    /// The set's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a document under a key, overwriting any previous value
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = codec::encode(value)?;
        self.data.write().insert(key.to_string(), encoded);
        Ok(())
    }

    /// Retrieve and decode the document stored under a key
    pub fn get(&self, key: &str) -> Result<Value> {
        let data = self.data.read();
        let encoded = data.get(key).ok_or_else(|| Error::key_not_found(key))?;
        codec::decode(encoded)
    }

    /// Retrieve and decode into a caller-chosen type
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let data = self.data.read();
        let encoded = data.get(key).ok_or_else(|| Error::key_not_found(key))?;
        codec::decode_as(encoded)
    }

    /// Retrieve a copy of the raw encoded bytes for a key
    pub fn get_raw(&self, key: &str) -> Result<Vec<u8>> {
        let data = self.data.read();
        data.get(key)
            .cloned()
            .ok_or_else(|| Error::key_not_found(key))
    }

    /// Remove a key, failing if it is absent
    pub fn delete(&self, key: &str) -> Result<()> {
        let mut data = self.data.write();
        if data.remove(key).is_none() {
            return Err(Error::key_not_found(key));
        }
        Ok(())
    }

    /// Check whether a key exists
    pub fn has(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Snapshot of all keys, in no particular order
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the set holds no entries
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Visit every (key, raw bytes) pair under one read lock
    ///
    /// Stops at the first callback error and surfaces it.
    pub fn scan<F>(&self, mut callback: F) -> Result<()>
    where
        F: FnMut(&str, &[u8]) -> Result<()>,
    {
        let data = self.data.read();
        for (key, raw) in data.iter() {
            callback(key, raw)?;
        }
        Ok(())
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.data.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    fn value_doc(pairs: &[(&str, Value)]) -> Value {
        Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn test_put_get_round_trip() {
        let set = Set::new("users");
        let doc = value_doc(&[("name", Value::from("Alice")), ("age", Value::Int(30))]);
        set.put("u1", &doc).unwrap();

        let got = set.get("u1").unwrap();
        assert_eq!(got, doc);
    }

    #[test]
    fn test_put_overwrites() {
        let set = Set::new("users");
        set.put("u1", &value_doc(&[("age", Value::Int(30))])).unwrap();
        set.put("u1", &value_doc(&[("age", Value::Int(31))])).unwrap();

        let got = set.get("u1").unwrap();
        assert_eq!(got.as_object().unwrap().get("age"), Some(&Value::Int(31)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_get_missing_key() {
        let set = Set::new("users");
        let err = set.get("nope").unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { .. }));
        assert!(set.get_raw("nope").is_err());
    }

    #[test]
    fn test_get_as_typed() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct User {
            name: String,
            age: i64,
        }
        let set = Set::new("users");
        let user = User {
            name: "Bob".into(),
            age: 25,
        };
        set.put("u2", &user).unwrap();
        let back: User = set.get_as("u2").unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_delete() {
        let set = Set::new("users");
        set.put("u1", &value_doc(&[("a", Value::Int(1))])).unwrap();
        assert!(set.has("u1"));

        set.delete("u1").unwrap();
        assert!(!set.has("u1"));
        assert!(matches!(
            set.delete("u1").unwrap_err(),
            Error::KeyNotFound { .. }
        ));
    }

    #[test]
    fn test_keys_and_len() {
        let set = Set::new("users");
        assert!(set.is_empty());
        for i in 0..5 {
            set.put(&format!("k{i}"), &value_doc(&[("i", Value::Int(i))]))
                .unwrap();
        }
        assert_eq!(set.len(), 5);
        let mut keys = set.keys();
        keys.sort();
        assert_eq!(keys, vec!["k0", "k1", "k2", "k3", "k4"]);
    }

    #[test]
    fn test_scan_visits_everything() {
        let set = Set::new("users");
        set.put("a", &value_doc(&[("n", Value::Int(1))])).unwrap();
        set.put("b", &value_doc(&[("n", Value::Int(2))])).unwrap();

        let mut seen = Vec::new();
        set.scan(|key, raw| {
            assert!(!raw.is_empty());
            seen.push(key.to_string());
            Ok(())
        })
        .unwrap();
        seen.sort();
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn test_scan_stops_on_error() {
        let set = Set::new("users");
        for i in 0..10 {
            set.put(&format!("k{i}"), &value_doc(&[("i", Value::Int(i))]))
                .unwrap();
        }
        let mut visited = 0;
        let result = set.scan(|_, _| {
            visited += 1;
            if visited == 3 {
                Err(Error::codec("boom"))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_clear() {
        let set = Set::new("users");
        set.put("u1", &value_doc(&[("a", Value::Int(1))])).unwrap();
        set.clear();
        assert!(set.is_empty());
        assert!(!set.has("u1"));
    }

    #[test]
    fn test_empty_key_is_permitted() {
        // The engine does not enforce non-empty keys; callers may reject
        // them earlier.
        let set = Set::new("users");
        set.put("", &value_doc(&[("a", Value::Int(1))])).unwrap();
        assert!(set.has(""));
    }
}
