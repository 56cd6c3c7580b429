//! StashDB server binary
//!
//! Wires the pieces together: parse config, init tracing, build the
//! manager, optionally connect S3 and start the backup ticker, then serve
//! until ctrl-c.

use anyhow::Context;
use clap::Parser;
use stash_engine::Manager;
use stash_server::auth::AdminAuth;
use stash_server::backup::{run_periodic_backups, BackupManager};
use stash_server::s3::S3Client;
use stash_server::{router, AppState, ServerConfig};
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &ServerConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {path}"))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_tracing(&config)?;

    let manager = Arc::new(Manager::new());
    let admin = AdminAuth::new(config.admin_credentials());
    if admin.enabled() {
        info!("admin authentication enabled");
    }

    // S3 is optional; a failed connection disables backups but does not
    // stop the server.
    let backups = match config.s3() {
        Some(s3_config) => match S3Client::connect(&s3_config).await {
            Ok(client) => {
                info!(bucket = %s3_config.bucket, "S3 client initialized");
                Some(Arc::new(BackupManager::new(client, Arc::clone(&manager))))
            }
            Err(e) => {
                error!(error = %e, "failed to initialize S3 client; backups disabled");
                None
            }
        },
        None => None,
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let mut backup_task = None;
    if let Some(backups) = &backups {
        if config.backup_interval > 0 {
            backup_task = Some(tokio::spawn(run_periodic_backups(
                Arc::clone(backups),
                config.backup_interval,
                shutdown_rx,
            )));
        }
    }

    let state = AppState::new(manager, admin, backups);
    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    info!(%addr, "starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .context("server error")?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = backup_task {
        let _ = task.await;
    }
    info!("server stopped");
    Ok(())
}
