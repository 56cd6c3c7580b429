//! Database: sets, indexes and the consistency contract between them
//!
//! A database owns a collection of named sets and a collection of named
//! indexes, plus optional credentials. Indexes refer to their set by *name*
//! only; the database resolves the reference, which keeps the ownership
//! graph acyclic.
//!
//! ## Index consistency
//!
//! `put` and `delete` are the index-consistent mutators: under the database
//! write lock they mutate the set and then fan out to every index covering
//! it, so after either call each covering index is in the state a fresh
//! `build` would have produced, restricted to the mutated key.
//!
//! Writing through [`Set::put`] directly bypasses the fan-out. That is
//! intentional (it gives bulk loaders and tests a cheap path) and pairs
//! with [`Database::rebuild_index`] for recovery.
//!
//! An index mutation error during fan-out short-circuits and propagates;
//! the set mutation is NOT rolled back. Callers should treat that state as
//! requiring `rebuild_index`.
//!
//! `delete_set` does not cascade: an index over a deleted set stays
//! registered (queries still serve its last-built buckets) until dropped or
//! rebuilt; rebuilding against the missing set fails with `not_found`.

use crate::index::{BasicIndex, Index, SortableIndex};
use crate::set::Set;
use parking_lot::RwLock;
use stash_core::{EntityKind, Error, Result, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-database credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Username checked by `authenticate`
    pub username: String,
    /// Password checked by `authenticate`
    pub password: String,
    /// When false, every credential pair passes
    pub enabled: bool,
}

impl AuthConfig {
    /// Create an enabled credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthConfig {
            username: username.into(),
            password: password.into(),
            enabled: true,
        }
    }
}

#[derive(Debug, Default)]
struct DatabaseState {
    sets: HashMap<String, Arc<Set>>,
    indexes: HashMap<String, Arc<Index>>,
}

/// A named collection of sets and the indexes derived from them
#[derive(Debug)]
pub struct Database {
    name: String,
    auth: Option<AuthConfig>,
    state: RwLock<DatabaseState>,
}

impl Database {
    /// Create an empty database
    pub fn new(name: impl Into<String>, auth: Option<AuthConfig>) -> Self {
        Database {
            name: name.into(),
            auth,
            state: RwLock::new(DatabaseState::default()),
        }
    }

    /// The database's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether credentials are configured and enabled
    pub fn auth_enabled(&self) -> bool {
        self.auth.as_ref().is_some_and(|a| a.enabled)
    }

    /// The configured credentials, if any
    pub fn auth(&self) -> Option<&AuthConfig> {
        self.auth.as_ref()
    }

    // =========================================================================
    // Sets
    // =========================================================================

    /// Create a set, failing on a duplicate name
    pub fn create_set(&self, name: &str) -> Result<Arc<Set>> {
        let mut state = self.state.write();
        if state.sets.contains_key(name) {
            return Err(Error::already_exists(EntityKind::Set, name));
        }
        let set = Arc::new(Set::new(name));
        state.sets.insert(name.to_string(), Arc::clone(&set));
        Ok(set)
    }

    /// Look up a set by name
    pub fn get_set(&self, name: &str) -> Result<Arc<Set>> {
        self.state
            .read()
            .sets
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(EntityKind::Set, name))
    }

    /// Remove a set by name
    ///
    /// Indexes covering the set are NOT dropped; they keep serving their
    /// last-built state until explicitly dropped or rebuilt.
    pub fn delete_set(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        if state.sets.remove(name).is_none() {
            return Err(Error::not_found(EntityKind::Set, name));
        }
        Ok(())
    }

    /// Names of all sets, in no particular order
    pub fn list_sets(&self) -> Vec<String> {
        self.state.read().sets.keys().cloned().collect()
    }

    // =========================================================================
    // Indexes
    // =========================================================================

    /// Create and build a basic index over `field` in `set_name`
    ///
    /// The build runs synchronously under the database write lock; a build
    /// failure aborts creation and the index is never registered.
    pub fn create_basic_index(
        &self,
        name: &str,
        set_name: &str,
        field: &str,
    ) -> Result<Arc<Index>> {
        let index = BasicIndex::new(name, set_name, field);
        self.register_index(name, set_name, Index::Basic(index))
    }

    /// Create and build a sortable index over `primary_field` in `set_name`
    pub fn create_sortable_index(
        &self,
        name: &str,
        set_name: &str,
        primary_field: &str,
        sort_fields: Vec<String>,
    ) -> Result<Arc<Index>> {
        let index = SortableIndex::new(name, set_name, primary_field, sort_fields);
        self.register_index(name, set_name, Index::Sortable(index))
    }

    fn register_index(&self, name: &str, set_name: &str, index: Index) -> Result<Arc<Index>> {
        let mut state = self.state.write();
        if state.indexes.contains_key(name) {
            return Err(Error::already_exists(EntityKind::Index, name));
        }
        let set = state
            .sets
            .get(set_name)
            .ok_or_else(|| Error::not_found(EntityKind::Set, set_name))?;

        index
            .build(set)
            .map_err(|e| Error::build_failed(name, e))?;

        let index = Arc::new(index);
        state.indexes.insert(name.to_string(), Arc::clone(&index));
        Ok(index)
    }

    /// Look up an index by name
    pub fn get_index(&self, name: &str) -> Result<Arc<Index>> {
        self.state
            .read()
            .indexes
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(EntityKind::Index, name))
    }

    /// Remove an index by name
    pub fn drop_index(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        if state.indexes.remove(name).is_none() {
            return Err(Error::not_found(EntityKind::Index, name));
        }
        Ok(())
    }

    /// Re-drive an index's build against its currently named set
    ///
    /// Fails with `not_found` when either the index or its set is missing.
    /// A failed rebuild leaves the index registered but empty.
    pub fn rebuild_index(&self, name: &str) -> Result<()> {
        let state = self.state.write();
        let index = state
            .indexes
            .get(name)
            .ok_or_else(|| Error::not_found(EntityKind::Index, name))?;
        let set = state
            .sets
            .get(index.set_name())
            .ok_or_else(|| Error::not_found(EntityKind::Set, index.set_name()))?;
        index
            .build(set)
            .map_err(|e| Error::build_failed(name, e))
    }

    /// Names of all indexes, in no particular order
    pub fn list_indexes(&self) -> Vec<String> {
        self.state.read().indexes.keys().cloned().collect()
    }

    // =========================================================================
    // Index-consistent mutators
    // =========================================================================

    /// Store a document and keep every covering index consistent
    ///
    /// Captures the previous encoded bytes (if any), replaces the entry,
    /// then adds or updates the key in every index whose `set_name` matches.
    pub fn put(&self, set_name: &str, key: &str, value: &Value) -> Result<()> {
        let state = self.state.write();
        let set = state
            .sets
            .get(set_name)
            .ok_or_else(|| Error::not_found(EntityKind::Set, set_name))?;

        let old_raw = if set.has(key) {
            Some(set.get_raw(key)?)
        } else {
            None
        };
        set.put(key, value)?;
        let new_raw = set.get_raw(key)?;

        for index in state.indexes.values() {
            if index.set_name() != set_name {
                continue;
            }
            match &old_raw {
                None => index.add(key, &new_raw)?,
                Some(old) => index.update(key, old, &new_raw)?,
            }
        }
        Ok(())
    }

    /// Delete a document and keep every covering index consistent
    pub fn delete(&self, set_name: &str, key: &str) -> Result<()> {
        let state = self.state.write();
        let set = state
            .sets
            .get(set_name)
            .ok_or_else(|| Error::not_found(EntityKind::Set, set_name))?;

        let old_raw = set.get_raw(key)?;
        set.delete(key)?;

        for index in state.indexes.values() {
            if index.set_name() == set_name {
                index.remove(key, &old_raw)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Check credentials against the configured pair
    ///
    /// Passes unconditionally when auth is absent or disabled.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        match &self.auth {
            Some(auth) if auth.enabled => auth.username == username && auth.password == password,
            _ => true,
        }
    }
}
