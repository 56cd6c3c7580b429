//! Snapshot backup and restore against the object store
//!
//! A backup is JSON: per database, every set dumped entry-by-entry as
//! decoded documents, plus index *descriptors* (not index contents; a
//! restore rebuilds each index by scanning the restored set). JSON is lossy
//! for 64-bit extremes; the engine accepts that at this boundary.
//!
//! Object layout inside the bucket:
//! - `backups/<db>/<timestamp>.json`: single database
//! - `backups/full/<timestamp>.json`: every database

use crate::s3::S3Client;
use anyhow::{bail, Context};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use stash_core::Value;
use stash_engine::{AuthConfig, Database, Index, IndexKind, Manager};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

const BACKUP_VERSION: &str = "1";

// =============================================================================
// Snapshot shapes
// =============================================================================

/// Metadata stamped into every backup
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// When the backup was taken
    pub timestamp: DateTime<Utc>,
    /// Backup format version
    pub version: String,
    /// Databases included
    pub database_count: usize,
    /// Sets included
    pub set_count: usize,
    /// Entries included
    pub entry_count: usize,
}

/// One set, decoded entry-by-entry
#[derive(Debug, Serialize, Deserialize)]
pub struct SetBackup {
    /// Set name
    pub name: String,
    /// Key → decoded document
    pub data: HashMap<String, serde_json::Value>,
}

/// One index descriptor
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexBackup {
    /// Index name
    pub name: String,
    /// Covered set
    pub set_name: String,
    /// Equality field (primary field for sortable)
    pub field: String,
    /// `basic` or `sortable`
    pub kind: String,
    /// Sort fields, for sortable indexes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_fields: Option<Vec<String>>,
}

/// Credentials, carried so a restore reinstates them
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthBackup {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
    /// Whether the check is active
    pub enabled: bool,
}

/// One database
#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseBackup {
    /// Database name
    pub name: String,
    /// Sets by name
    pub sets: HashMap<String, SetBackup>,
    /// Index descriptors by name
    pub indexes: HashMap<String, IndexBackup>,
    /// Credentials, if configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthBackup>,
}

/// A full dump: metadata plus every database
#[derive(Debug, Serialize, Deserialize)]
pub struct FullBackup {
    /// Backup metadata
    pub metadata: BackupMetadata,
    /// Databases by name
    pub databases: HashMap<String, DatabaseBackup>,
}

// =============================================================================
// BackupManager
// =============================================================================

/// Drives snapshot dumps and restores between the manager and S3
pub struct BackupManager {
    s3: S3Client,
    manager: Arc<Manager>,
}

impl BackupManager {
    /// Create a backup manager
    pub fn new(s3: S3Client, manager: Arc<Manager>) -> Self {
        BackupManager { s3, manager }
    }

    fn timestamp() -> String {
        Utc::now()
            .to_rfc3339_opts(SecondsFormat::Secs, true)
            .replace(':', "-")
    }

    /// Back up one database; returns the object name written
    pub async fn backup_database(&self, name: &str) -> anyhow::Result<String> {
        let db = self
            .manager
            .get_database(name)
            .with_context(|| format!("cannot back up {name}"))?;
        let backup = snapshot_database(&db)?;

        let entry_count = backup.sets.values().map(|s| s.data.len()).sum();
        let full = FullBackup {
            metadata: BackupMetadata {
                timestamp: Utc::now(),
                version: BACKUP_VERSION.to_string(),
                database_count: 1,
                set_count: backup.sets.len(),
                entry_count,
            },
            databases: HashMap::from([(name.to_string(), backup)]),
        };

        let object = format!("backups/{}/{}.json", name, Self::timestamp());
        self.upload(&object, &full).await?;
        info!(database = %name, object = %object, "database backed up");
        Ok(object)
    }

    /// Back up every database into one object; returns the object name
    pub async fn backup_all(&self) -> anyhow::Result<String> {
        let names = self.manager.list_databases();
        let mut databases = HashMap::new();
        let (mut set_count, mut entry_count) = (0, 0);

        for name in &names {
            let db = match self.manager.get_database(name) {
                Ok(db) => db,
                // Dropped between list and get; skip it
                Err(_) => continue,
            };
            let backup = snapshot_database(&db)?;
            set_count += backup.sets.len();
            entry_count += backup.sets.values().map(|s| s.data.len()).sum::<usize>();
            databases.insert(name.clone(), backup);
        }

        let full = FullBackup {
            metadata: BackupMetadata {
                timestamp: Utc::now(),
                version: BACKUP_VERSION.to_string(),
                database_count: databases.len(),
                set_count,
                entry_count,
            },
            databases,
        };

        let object = format!("backups/full/{}.json", Self::timestamp());
        self.upload(&object, &full).await?;
        info!(databases = full.metadata.database_count, object = %object, "full backup written");
        Ok(object)
    }

    /// List backup object names
    pub async fn list_backups(&self) -> anyhow::Result<Vec<String>> {
        let mut objects = self.s3.list_objects("backups/").await?;
        objects.sort();
        Ok(objects)
    }

    /// Restore every database found in a backup object
    ///
    /// Existing databases with the same names are an error; restore into a
    /// clean manager or drop the conflicting databases first.
    pub async fn restore(&self, object: &str) -> anyhow::Result<()> {
        let bytes = self.s3.get_object(object).await?;
        let full: FullBackup =
            serde_json::from_slice(&bytes).with_context(|| format!("cannot parse {object}"))?;

        for (name, backup) in &full.databases {
            if self.manager.database_exists(name) {
                bail!("database {name} already exists; drop it before restoring");
            }
            restore_database(&self.manager, name, backup)?;
            info!(database = %name, "database restored");
        }
        Ok(())
    }

    async fn upload(&self, object: &str, full: &FullBackup) -> anyhow::Result<()> {
        let data = serde_json::to_vec_pretty(full).context("cannot serialize backup")?;
        self.s3.put_object(object, data, "application/json").await
    }
}

/// Run periodic full backups until the shutdown future resolves
pub async fn run_periodic_backups(
    backups: Arc<BackupManager>,
    interval_minutes: u64,
    shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let period = std::time::Duration::from_secs(interval_minutes * 60);
    let mut ticker = tokio::time::interval(period);
    // The first tick fires immediately; swallow it so the first backup
    // happens one full period after startup.
    ticker.tick().await;

    let mut shutdown = shutdown;
    info!(minutes = interval_minutes, "automatic backups enabled");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                info!("running scheduled backup");
                if let Err(e) = backups.backup_all().await {
                    error!(error = %e, "scheduled backup failed");
                }
            }
            _ = shutdown.changed() => {
                info!("stopping automatic backups");
                return;
            }
        }
    }
}

// =============================================================================
// Dump / load
// =============================================================================

fn snapshot_database(db: &Database) -> anyhow::Result<DatabaseBackup> {
    let mut sets = HashMap::new();
    for set_name in db.list_sets() {
        let set = match db.get_set(&set_name) {
            Ok(set) => set,
            Err(_) => continue,
        };
        let mut data = HashMap::new();
        for key in set.keys() {
            // Entries can vanish between keys() and get(); skip those
            if let Ok(value) = set.get(&key) {
                data.insert(key, serde_json::Value::from(value));
            }
        }
        sets.insert(set_name.clone(), SetBackup { name: set_name, data });
    }

    let mut indexes = HashMap::new();
    for index_name in db.list_indexes() {
        let index = match db.get_index(&index_name) {
            Ok(index) => index,
            Err(_) => continue,
        };
        indexes.insert(index_name, describe_index(&index));
    }

    Ok(DatabaseBackup {
        name: db.name().to_string(),
        sets,
        indexes,
        auth: db.auth().map(|a| AuthBackup {
            username: a.username.clone(),
            password: a.password.clone(),
            enabled: a.enabled,
        }),
    })
}

fn describe_index(index: &Index) -> IndexBackup {
    IndexBackup {
        name: index.name().to_string(),
        set_name: index.set_name().to_string(),
        field: index.field().to_string(),
        kind: index.kind().as_str().to_string(),
        sort_fields: index.sort_fields().map(|f| f.to_vec()),
    }
}

fn restore_database(manager: &Manager, name: &str, backup: &DatabaseBackup) -> anyhow::Result<()> {
    let auth = backup.auth.as_ref().map(|a| AuthConfig {
        username: a.username.clone(),
        password: a.password.clone(),
        enabled: a.enabled,
    });
    let db = manager.create_database(name, auth)?;

    for (set_name, set_backup) in &backup.sets {
        let set = db.create_set(set_name)?;
        for (key, json) in &set_backup.data {
            set.put(key, &Value::from(json.clone()))?;
        }
    }

    for index in backup.indexes.values() {
        match index.kind.as_str() {
            kind if kind == IndexKind::Basic.as_str() => {
                db.create_basic_index(&index.name, &index.set_name, &index.field)?;
            }
            kind if kind == IndexKind::Sortable.as_str() => {
                db.create_sortable_index(
                    &index.name,
                    &index.set_name,
                    &index.field,
                    index.sort_fields.clone().unwrap_or_default(),
                )?;
            }
            other => bail!("unknown index kind {other:?} in backup"),
        }
    }
    Ok(())
}
