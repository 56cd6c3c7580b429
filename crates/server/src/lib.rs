//! StashDB HTTP server
//!
//! The collaborator layer around the engine: JSON-over-POST routing,
//! flag/environment configuration, admin and per-database auth extraction,
//! and S3 snapshot backups with an optional periodic ticker.
//!
//! The engine itself (`stash-engine`) stays free of HTTP, logging and I/O;
//! everything in this crate can be replaced without touching it.

pub mod auth;
pub mod backup;
pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod s3;
pub mod state;

pub use config::ServerConfig;
pub use routes::router;
pub use state::AppState;
