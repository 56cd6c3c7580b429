//! Manager: the process-wide registry of databases
//!
//! One manager exists per process, constructed at startup and dropped at
//! shutdown. It owns the mapping from database name to [`Database`] and
//! hands out `Arc` references; databases never move between managers.

use crate::database::{AuthConfig, Database};
use parking_lot::RwLock;
use stash_core::{EntityKind, Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of named databases
#[derive(Debug, Default)]
pub struct Manager {
    databases: RwLock<HashMap<String, Arc<Database>>>,
}

impl Manager {
    /// Create an empty manager
    pub fn new() -> Self {
        Manager {
            databases: RwLock::new(HashMap::new()),
        }
    }

    /// Create a database, failing on a duplicate name
    pub fn create_database(&self, name: &str, auth: Option<AuthConfig>) -> Result<Arc<Database>> {
        let mut databases = self.databases.write();
        if databases.contains_key(name) {
            return Err(Error::already_exists(EntityKind::Database, name));
        }
        let db = Arc::new(Database::new(name, auth));
        databases.insert(name.to_string(), Arc::clone(&db));
        Ok(db)
    }

    /// Look up a database by name
    pub fn get_database(&self, name: &str) -> Result<Arc<Database>> {
        self.databases
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(EntityKind::Database, name))
    }

    /// Remove a database by name
    pub fn delete_database(&self, name: &str) -> Result<()> {
        let mut databases = self.databases.write();
        if databases.remove(name).is_none() {
            return Err(Error::not_found(EntityKind::Database, name));
        }
        Ok(())
    }

    /// Check whether a database exists
    pub fn database_exists(&self, name: &str) -> bool {
        self.databases.read().contains_key(name)
    }

    /// Names of all databases, in no particular order
    pub fn list_databases(&self) -> Vec<String> {
        self.databases.read().keys().cloned().collect()
    }

    /// Number of databases
    pub fn database_count(&self) -> usize {
        self.databases.read().len()
    }

    /// Check credentials against a named database
    ///
    /// An unknown database surfaces as an error, never as `false`.
    pub fn authenticate(&self, name: &str, username: &str, password: &str) -> Result<bool> {
        let db = self.get_database(name)?;
        Ok(db.authenticate(username, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_get_delete() {
        let manager = Manager::new();
        manager.create_database("app", None).unwrap();

        assert!(manager.database_exists("app"));
        assert_eq!(manager.database_count(), 1);
        assert_eq!(manager.list_databases(), vec!["app"]);
        assert_eq!(manager.get_database("app").unwrap().name(), "app");

        manager.delete_database("app").unwrap();
        assert!(!manager.database_exists("app"));
        assert_eq!(manager.database_count(), 0);
    }

    #[test]
    fn test_duplicate_name() {
        let manager = Manager::new();
        manager.create_database("app", None).unwrap();
        assert!(matches!(
            manager.create_database("app", None).unwrap_err(),
            Error::AlreadyExists { .. }
        ));
    }

    #[test]
    fn test_missing_database() {
        let manager = Manager::new();
        assert!(matches!(
            manager.get_database("nope").unwrap_err(),
            Error::NotFound { .. }
        ));
        assert!(manager.delete_database("nope").is_err());
    }

    #[test]
    fn test_authenticate_helper() {
        let manager = Manager::new();
        manager
            .create_database("secure", Some(AuthConfig::new("admin", "secret")))
            .unwrap();

        assert!(manager.authenticate("secure", "admin", "secret").unwrap());
        assert!(!manager.authenticate("secure", "admin", "nope").unwrap());

        // Unknown database is an error, not false
        assert!(manager.authenticate("ghost", "admin", "secret").is_err());
    }

    #[test]
    fn test_databases_are_shared_handles() {
        let manager = Manager::new();
        manager.create_database("app", None).unwrap();

        let a = manager.get_database("app").unwrap();
        let b = manager.get_database("app").unwrap();
        a.create_set("users").unwrap();
        assert!(b.get_set("users").is_ok());
    }
}
