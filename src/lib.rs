//! # StashDB
//!
//! A multi-tenant in-memory key/value store with secondary indexing.
//!
//! Clients create named databases, within each database create named sets
//! (key → document collections), store schemaless documents against string
//! keys, and build secondary indexes over declared document fields for
//! equality lookup and multi-field ordered retrieval with pagination.
//!
//! # Quick Start
//!
//! ```
//! use stashdb::{Manager, Value};
//!
//! fn main() -> stashdb::Result<()> {
//!     let manager = Manager::new();
//!     let db = manager.create_database("shop", None)?;
//!     db.create_set("products")?;
//!
//!     // Index-consistent writes go through the database
//!     db.put("products", "p1", &Value::from(serde_json::json!({
//!         "cat": "electronics", "price": 1200,
//!     })))?;
//!     db.put("products", "p2", &Value::from(serde_json::json!({
//!         "cat": "electronics", "price": 150,
//!     })))?;
//!
//!     let index = db.create_sortable_index(
//!         "by_cat", "products", "cat", vec!["price".to_string()],
//!     )?;
//!     let cheapest_first = index
//!         .as_sortable()
//!         .unwrap()
//!         .query_sorted("electronics", "price", true);
//!     assert_eq!(cheapest_first, vec!["p2", "p1"]);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The ownership chain is manager → database → (set, index). Indexes refer
//! to their set by name only; the database resolves the reference and keeps
//! every covering index consistent inside `put`/`delete`. The HTTP server,
//! configuration and S3 snapshots live in `stash-server` and touch the
//! engine only through this API.

pub use stash_core::{codec, EntityKind, Error, ErrorCode, Result, Value};
pub use stash_engine::{
    AuthConfig, BasicIndex, Database, Index, IndexKind, Manager, Set, SortableIndex,
};
