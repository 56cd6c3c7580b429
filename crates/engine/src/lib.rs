//! StashDB storage + indexing engine
//!
//! The in-memory core: manager → database → (set, index).
//!
//! - [`Set`]: named key → encoded-document store
//! - [`BasicIndex`] / [`SortableIndex`] behind the [`Index`] dispatch enum
//! - [`Database`]: owns sets and indexes, provides the index-consistent
//!   `put`/`delete` mutators and per-database auth
//! - [`Manager`]: the process-wide database registry
//!
//! Locking is one `parking_lot::RwLock` per component, acquired in the
//! order manager → database → (set, index). The engine never logs and never
//! performs I/O; HTTP, snapshots and configuration live in collaborator
//! crates.

pub mod database;
pub mod index;
pub mod manager;
pub mod set;

pub use database::{AuthConfig, Database};
pub use index::{BasicIndex, Index, IndexKind, SortableIndex};
pub use manager::Manager;
pub use set::Set;
