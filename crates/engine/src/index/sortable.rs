//! Sortable index: equality bucketing plus ordered, paginated retrieval
//!
//! Shares the primary-bucket structure of the basic index and adds a per-key
//! cache of the canonical string forms of a declared list of *sort fields*.
//! Queries within one primary bucket can then be ordered by any declared
//! sort field, or lexicographically across several, without touching the
//! set.
//!
//! ## Missing sort fields
//!
//! Keys whose document lacks the requested sort field are appended after the
//! sorted region, in their original bucket order, regardless of direction.
//! Missing values stay a well-defined tail instead of polluting the sorted
//! region.
//!
//! ## Comparator
//!
//! Canonical strings that both parse as `f64` compare numerically; everything
//! else compares lexicographically (which also orders `"false" < "true"`).
//! All sorts are stable, so ties keep first-insertion order.
//!
//! Both the primary buckets and the sort-value cache live behind a single
//! lock: one guard means a reader can never observe one map updated and the
//! other not.

use crate::set::Set;
use parking_lot::RwLock;
use stash_core::{codec, Result};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Compare two canonical strings, numbers first
///
/// Antisymmetric and reflexive over any inputs: floats that fail
/// `partial_cmp` (NaN operands) compare equal rather than poisoning the
/// sort.
pub(crate) fn compare_canonical(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

#[derive(Debug, Default)]
struct SortableState {
    /// Primary field value → keys, first-insertion order
    values: HashMap<String, Vec<String>>,
    /// Key → (sort field → canonical string), only extractable fields
    sort_values: HashMap<String, HashMap<String, String>>,
}

impl SortableState {
    /// Index one entry. Skips the whole entry when the primary field is
    /// absent; records only the sort fields that were extractable.
    fn insert(
        &mut self,
        key: &str,
        raw: &[u8],
        primary_field: &str,
        sort_fields: &[String],
    ) -> Result<()> {
        let Some(primary) = codec::extract_field(raw, primary_field)? else {
            return Ok(());
        };
        self.values.entry(primary).or_default().push(key.to_string());

        let mut extracted = HashMap::new();
        for field in sort_fields {
            if let Some(value) = codec::extract_field(raw, field)? {
                extracted.insert(field.clone(), value);
            }
        }
        if !extracted.is_empty() {
            self.sort_values.insert(key.to_string(), extracted);
        }
        Ok(())
    }

    /// Drop one entry. A missing primary field in the old document is a
    /// no-op; otherwise the key leaves its bucket and its sort-value cache.
    fn remove(&mut self, key: &str, raw: &[u8], primary_field: &str) -> Result<()> {
        let Some(primary) = codec::extract_field(raw, primary_field)? else {
            return Ok(());
        };
        if let Some(keys) = self.values.get_mut(&primary) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                self.values.remove(&primary);
            }
        }
        self.sort_values.remove(key);
        Ok(())
    }
}

/// Index with equality buckets and multi-field ordered retrieval
#[derive(Debug)]
pub struct SortableIndex {
    name: String,
    set_name: String,
    primary_field: String,
    sort_fields: Vec<String>,
    state: RwLock<SortableState>,
}

impl SortableIndex {
    /// Create an empty sortable index
    pub fn new(
        name: impl Into<String>,
        set_name: impl Into<String>,
        primary_field: impl Into<String>,
        sort_fields: Vec<String>,
    ) -> Self {
        SortableIndex {
            name: name.into(),
            set_name: set_name.into(),
            primary_field: primary_field.into(),
            sort_fields,
            state: RwLock::new(SortableState::default()),
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

    /// The primary (equality) field
    pub fn primary_field(&self) -> &str {
        &self.primary_field
    }

    /// The declared sort fields, in declaration order
    pub fn sort_fields(&self) -> &[String] {
        &self.sort_fields
    }

    fn is_sort_field(&self, field: &str) -> bool {
        self.sort_fields.iter().any(|f| f == field)
    }

    /// Rebuild from a full scan of the set
    ///
    /// On failure the index is left empty but valid.
    pub fn build(&self, set: &Set) -> Result<()> {
        let mut fresh = SortableState::default();
        let scanned = set.scan(|key, raw| {
            fresh.insert(key, raw, &self.primary_field, &self.sort_fields)
        });

        let mut state = self.state.write();
        match scanned {
            Ok(()) => {
                *state = fresh;
                Ok(())
            }
            Err(e) => {
                state.values.clear();
                state.sort_values.clear();
                Err(e)
            }
        }
    }

    /// Add one entry from its encoded document
    pub fn add(&self, key: &str, raw: &[u8]) -> Result<()> {
        self.state
            .write()
            .insert(key, raw, &self.primary_field, &self.sort_fields)
    }

    /// Remove one entry, locating its bucket from the old encoded document
    pub fn remove(&self, key: &str, raw: &[u8]) -> Result<()> {
        self.state.write().remove(key, raw, &self.primary_field)
    }

    /// Replace an entry under one lock acquisition
    ///
    /// Tolerates a missing primary field on the remove leg, so a document
    /// that gains, loses or changes its primary value lands in the right
    /// bucket afterwards.
    pub fn update(&self, key: &str, old_raw: &[u8], new_raw: &[u8]) -> Result<()> {
        let mut state = self.state.write();
        state.remove(key, old_raw, &self.primary_field)?;
        state.insert(key, new_raw, &self.primary_field, &self.sort_fields)
    }

    /// Keys whose primary field equals `value`, in first-insertion order
    pub fn query_equal(&self, value: &str) -> Vec<String> {
        self.state
            .read()
            .values
            .get(value)
            .cloned()
            .unwrap_or_default()
    }

    /// Equality query ordered by one sort field
    ///
    /// An undeclared `sort_field` returns the bucket unsorted. Keys without
    /// the sort field form an unsorted tail in their original order.
    pub fn query_sorted(&self, value: &str, sort_field: &str, ascending: bool) -> Vec<String> {
        let state = self.state.read();
        let Some(bucket) = state.values.get(value) else {
            return Vec::new();
        };
        if !self.is_sort_field(sort_field) {
            return bucket.clone();
        }

        let (mut sorted, tail): (Vec<String>, Vec<String>) =
            bucket.iter().cloned().partition(|key| {
                state
                    .sort_values
                    .get(key)
                    .is_some_and(|sv| sv.contains_key(sort_field))
            });

        sorted.sort_by(|a, b| {
            let va = &state.sort_values[a][sort_field];
            let vb = &state.sort_values[b][sort_field];
            let ord = compare_canonical(va, vb);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });

        sorted.extend(tail);
        sorted
    }

    /// Equality query ordered lexicographically across several sort fields
    ///
    /// Per-field direction comes from the parallel `ascending` slice;
    /// missing entries default to ascending. A compared field missing for
    /// either key counts as equal and falls through to the next field.
    /// Keys with no cached sort values at all form the unsorted tail.
    pub fn query_multi_sorted(
        &self,
        value: &str,
        sort_fields: &[String],
        ascending: &[bool],
    ) -> Vec<String> {
        let state = self.state.read();
        let Some(bucket) = state.values.get(value) else {
            return Vec::new();
        };
        if sort_fields.is_empty() {
            return bucket.clone();
        }

        let (mut sorted, tail): (Vec<String>, Vec<String>) =
            bucket.iter().cloned().partition(|key| {
                state.sort_values.get(key).is_some_and(|sv| !sv.is_empty())
            });

        sorted.sort_by(|a, b| {
            for (i, field) in sort_fields.iter().enumerate() {
                let (Some(va), Some(vb)) = (
                    state.sort_values[a].get(field),
                    state.sort_values[b].get(field),
                ) else {
                    continue;
                };
                let ord = compare_canonical(va, vb);
                if ord != Ordering::Equal {
                    let asc = ascending.get(i).copied().unwrap_or(true);
                    return if asc { ord } else { ord.reverse() };
                }
            }
            Ordering::Equal
        });

        sorted.extend(tail);
        sorted
    }

    /// [`query_sorted`](Self::query_sorted) with offset/limit applied
    pub fn query_sorted_with_pagination(
        &self,
        value: &str,
        sort_field: &str,
        ascending: bool,
        offset: usize,
        limit: usize,
    ) -> Vec<String> {
        paginate(self.query_sorted(value, sort_field, ascending), offset, limit)
    }

    /// [`query_multi_sorted`](Self::query_multi_sorted) with offset/limit applied
    pub fn query_multi_sorted_with_pagination(
        &self,
        value: &str,
        sort_fields: &[String],
        ascending: &[bool],
        offset: usize,
        limit: usize,
    ) -> Vec<String> {
        paginate(
            self.query_multi_sorted(value, sort_fields, ascending),
            offset,
            limit,
        )
    }

    /// All distinct primary values, in no particular order
    pub fn all_values(&self) -> Vec<String> {
        self.state.read().values.keys().cloned().collect()
    }

    /// Number of distinct primary values
    pub fn len(&self) -> usize {
        self.state.read().values.len()
    }

    /// Whether the index holds no buckets
    pub fn is_empty(&self) -> bool {
        self.state.read().values.is_empty()
    }

    /// Drop all buckets and cached sort values
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.values.clear();
        state.sort_values.clear();
    }

    /// The cached canonical sort value for one key and field, if recorded
    #[cfg(test)]
    fn cached_sort_value(&self, key: &str, field: &str) -> Option<String> {
        self.state
            .read()
            .sort_values
            .get(key)
            .and_then(|sv| sv.get(field))
            .cloned()
    }
}

/// Slice `keys` down to one page
///
/// `offset` past the end yields empty; `limit == 0` or a page running past
/// the end yields everything from `offset` on.
fn paginate(keys: Vec<String>, offset: usize, limit: usize) -> Vec<String> {
    if offset >= keys.len() {
        return Vec::new();
    }
    let end = if limit == 0 {
        keys.len()
    } else {
        (offset + limit).min(keys.len())
    };
    keys[offset..end].to_vec()
}
