//! Shared handler state

use crate::auth::AdminAuth;
use crate::backup::BackupManager;
use stash_engine::Manager;
use std::sync::Arc;
use std::time::Instant;

/// State cloned into every handler
#[derive(Clone)]
pub struct AppState {
    /// The engine's database registry
    pub manager: Arc<Manager>,
    /// Admin gate for database management and backups
    pub admin: AdminAuth,
    /// Backup driver, present only when S3 is configured
    pub backups: Option<Arc<BackupManager>>,
    /// Server start time, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Create state around a manager
    pub fn new(
        manager: Arc<Manager>,
        admin: AdminAuth,
        backups: Option<Arc<BackupManager>>,
    ) -> Self {
        AppState {
            manager,
            admin,
            backups,
            started_at: Instant::now(),
        }
    }
}
