//! Core types for StashDB
//!
//! This crate holds the pieces every other layer builds on:
//!
//! - [`Value`]: the dynamic document model
//! - [`codec`]: MessagePack encode/decode plus indexed-field extraction
//! - [`Error`] / [`ErrorCode`]: the unified error taxonomy
//!
//! It contains no containers and no locks; those live in `stash-engine`.

pub mod codec;
pub mod error;
pub mod value;

pub use error::{EntityKind, Error, ErrorCode, Result};
pub use value::Value;
