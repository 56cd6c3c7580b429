//! Basic index: equality lookup over one declared field
//!
//! Maps each canonical field value to the list of set keys whose document
//! carries that value. Bucket order is first-insertion and survives removals
//! of other keys.
//!
//! ## Absence policy
//!
//! A document without the indexed field is silently skipped: no entry, no
//! sentinel bucket, no error. Index membership is the implicit predicate
//! "has the indexed field", which lets heterogeneous documents share a set.
//! The skip applies ONLY to absent fields: undecodable bytes and
//! uncanonicalizable values are real errors.
//!
//! An index holds only the *name* of the set it covers, never a handle;
//! resolution happens at the database layer.

use crate::set::Set;
use parking_lot::RwLock;
use stash_core::{codec, Result};
use std::collections::HashMap;

/// Equality-only inverted index from field value to set keys
#[derive(Debug)]
pub struct BasicIndex {
    name: String,
    set_name: String,
    field: String,
    values: RwLock<HashMap<String, Vec<String>>>,
}

impl BasicIndex {
    /// Create an empty index over `field` in the set named `set_name`
    pub fn new(
        name: impl Into<String>,
        set_name: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        BasicIndex {
            name: name.into(),
            set_name: set_name.into(),
            field: field.into(),
            values: RwLock::new(HashMap::new()),
        }
    }

    /// The index's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the set this index covers
    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    /// The indexed field
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Rebuild from a full scan of the set
    ///
    /// On failure the index is left empty but valid; the first offending
    /// entry's error is propagated.
    pub fn build(&self, set: &Set) -> Result<()> {
        let mut fresh: HashMap<String, Vec<String>> = HashMap::new();
        let scanned = set.scan(|key, raw| {
            if let Some(value) = codec::extract_field(raw, &self.field)? {
                fresh.entry(value).or_default().push(key.to_string());
            }
            Ok(())
        });

        let mut values = self.values.write();
        match scanned {
            Ok(()) => {
                *values = fresh;
                Ok(())
            }
            Err(e) => {
                values.clear();
                Err(e)
            }
        }
    }

    /// Add one entry from its encoded document
    pub fn add(&self, key: &str, raw: &[u8]) -> Result<()> {
        let Some(value) = codec::extract_field(raw, &self.field)? else {
            return Ok(());
        };
        self.values
            .write()
            .entry(value)
            .or_default()
            .push(key.to_string());
        Ok(())
    }

    /// Remove one entry, locating its bucket from the encoded document
    pub fn remove(&self, key: &str, raw: &[u8]) -> Result<()> {
        let Some(value) = codec::extract_field(raw, &self.field)? else {
            return Ok(());
        };
        let mut values = self.values.write();
        if let Some(keys) = values.get_mut(&value) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                values.remove(&value);
            }
        }
        Ok(())
    }

    /// Replace an entry: remove under the old document, add under the new
    pub fn update(&self, key: &str, old_raw: &[u8], new_raw: &[u8]) -> Result<()> {
        self.remove(key, old_raw)?;
        self.add(key, new_raw)
    }

    /// Keys whose indexed field equals `value`, in first-insertion order
    ///
    /// Returns a defensive copy; an unknown value yields an empty vec.
    pub fn query_equal(&self, value: &str) -> Vec<String> {
        self.values.read().get(value).cloned().unwrap_or_default()
    }

    /// All distinct indexed values, in no particular order
    pub fn all_values(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    /// Number of distinct indexed values
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether the index holds no buckets
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Drop all buckets
    pub fn clear(&self) {
        self.values.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_core::{Error, Value};
    use std::collections::HashMap;

    fn raw(pairs: &[(&str, Value)]) -> Vec<u8> {
        let map: HashMap<String, Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        codec::encode(&Value::Object(map)).unwrap()
    }

    fn populated_set() -> Set {
        let set = Set::new("users");
        set.put(
            "u1",
            &Value::from(serde_json::json!({"name": "Alice", "age": 30})),
        )
        .unwrap();
        set.put(
            "u2",
            &Value::from(serde_json::json!({"name": "Bob", "age": 25})),
        )
        .unwrap();
        set.put(
            "u3",
            &Value::from(serde_json::json!({"name": "Alice", "age": 41})),
        )
        .unwrap();
        set
    }

    #[test]
    fn test_build_groups_by_value() {
        let set = populated_set();
        let index = BasicIndex::new("by_name", "users", "name");
        index.build(&set).unwrap();

        let mut alices = index.query_equal("Alice");
        alices.sort();
        assert_eq!(alices, vec!["u1", "u3"]);
        assert_eq!(index.query_equal("Bob"), vec!["u2"]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_build_skips_missing_field() {
        let set = populated_set();
        set.put("u4", &Value::from(serde_json::json!({"age": 99})))
            .unwrap();
        let index = BasicIndex::new("by_name", "users", "name");
        index.build(&set).unwrap();

        let mut values = index.all_values();
        values.sort();
        assert_eq!(values, vec!["Alice", "Bob"]);
        for value in index.all_values() {
            assert!(!index.query_equal(&value).contains(&"u4".to_string()));
        }
    }

    #[test]
    fn test_build_failure_leaves_index_empty() {
        let set = populated_set();
        // A present-but-unindexable field aborts the build
        set.put(
            "bad",
            &Value::from(serde_json::json!({"name": {"first": "X"}})),
        )
        .unwrap();

        let index = BasicIndex::new("by_name", "users", "name");
        // Seed some state to prove it is gone afterwards
        index
            .add("seed", &raw(&[("name", Value::from("Seed"))]))
            .unwrap();

        let err = index.build(&set).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { .. }));
        assert!(index.is_empty());
        assert!(index.query_equal("Seed").is_empty());
    }

    #[test]
    fn test_add_and_query_preserve_insertion_order() {
        let index = BasicIndex::new("by_name", "users", "name");
        for key in ["k3", "k1", "k2"] {
            index.add(key, &raw(&[("name", Value::from("Same"))])).unwrap();
        }
        assert_eq!(index.query_equal("Same"), vec!["k3", "k1", "k2"]);
    }

    #[test]
    fn test_query_returns_defensive_copy() {
        let index = BasicIndex::new("by_name", "users", "name");
        index.add("k1", &raw(&[("name", Value::from("A"))])).unwrap();

        let mut copy = index.query_equal("A");
        copy.push("intruder".to_string());
        assert_eq!(index.query_equal("A"), vec!["k1"]);
    }

    #[test]
    fn test_remove_drops_empty_bucket() {
        let index = BasicIndex::new("by_name", "users", "name");
        let bytes = raw(&[("name", Value::from("A"))]);
        index.add("k1", &bytes).unwrap();
        index.add("k2", &bytes).unwrap();

        index.remove("k1", &bytes).unwrap();
        assert_eq!(index.query_equal("A"), vec!["k2"]);
        assert_eq!(index.len(), 1);

        index.remove("k2", &bytes).unwrap();
        assert!(index.query_equal("A").is_empty());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_remove_preserves_other_keys_order() {
        let index = BasicIndex::new("by_name", "users", "name");
        let bytes = raw(&[("name", Value::from("A"))]);
        for key in ["k1", "k2", "k3"] {
            index.add(key, &bytes).unwrap();
        }
        index.remove("k2", &bytes).unwrap();
        assert_eq!(index.query_equal("A"), vec!["k1", "k3"]);
    }

    #[test]
    fn test_remove_with_missing_field_is_noop() {
        let index = BasicIndex::new("by_name", "users", "name");
        index.add("k1", &raw(&[("name", Value::from("A"))])).unwrap();
        index.remove("k1", &raw(&[("age", Value::Int(1))])).unwrap();
        assert_eq!(index.query_equal("A"), vec!["k1"]);
    }

    #[test]
    fn test_update_rebuckets() {
        let index = BasicIndex::new("by_name", "users", "name");
        let old = raw(&[("name", Value::from("A"))]);
        let new = raw(&[("name", Value::from("B"))]);
        index.add("k1", &old).unwrap();

        index.update("k1", &old, &new).unwrap();
        assert!(index.query_equal("A").is_empty());
        assert_eq!(index.query_equal("B"), vec!["k1"]);
    }

    #[test]
    fn test_update_gaining_and_losing_field() {
        let index = BasicIndex::new("by_name", "users", "name");
        let without = raw(&[("age", Value::Int(1))]);
        let with = raw(&[("name", Value::from("A"))]);

        // Gains the field: plain add
        index.add("k1", &without).unwrap();
        index.update("k1", &without, &with).unwrap();
        assert_eq!(index.query_equal("A"), vec!["k1"]);

        // Loses the field: plain remove
        index.update("k1", &with, &without).unwrap();
        assert!(index.query_equal("A").is_empty());
    }

    #[test]
    fn test_numeric_values_bucket_by_canonical_string() {
        let index = BasicIndex::new("by_age", "users", "age");
        index.add("k1", &raw(&[("age", Value::Int(30))])).unwrap();
        index.add("k2", &raw(&[("age", Value::from(30u64))])).unwrap();
        assert_eq!(index.query_equal("30"), vec!["k1", "k2"]);
    }

    #[test]
    fn test_clear() {
        let index = BasicIndex::new("by_name", "users", "name");
        index.add("k1", &raw(&[("name", Value::from("A"))])).unwrap();
        index.clear();
        assert!(index.is_empty());
    }
}
