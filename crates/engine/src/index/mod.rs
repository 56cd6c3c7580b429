//! Secondary indexes over sets
//!
//! Two index shapes share one capability set:
//!
//! - [`BasicIndex`]: equality-only lookup on a single field
//! - [`SortableIndex`]: equality buckets plus ordered, paginated retrieval
//!   over declared sort fields
//!
//! [`Index`] is the closed dispatch type the database stores; collaborators
//! that need shape-specific queries downcast with [`Index::as_sortable`] /
//! [`Index::as_basic`].

mod basic;
mod sortable;

pub use basic::BasicIndex;
pub use sortable::SortableIndex;

use crate::set::Set;
use stash_core::Result;

/// Which shape an index is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Equality-only index
    Basic,
    /// Equality plus ordered retrieval
    Sortable,
}

impl IndexKind {
    /// Get the lowercase name used in descriptors
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Basic => "basic",
            IndexKind::Sortable => "sortable",
        }
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An index of either shape
#[derive(Debug)]
pub enum Index {
    /// Equality-only index
    Basic(BasicIndex),
    /// Equality plus ordered retrieval
    Sortable(SortableIndex),
}

impl Index {
    /// The index's name
    pub fn name(&self) -> &str {
        match self {
            Index::Basic(i) => i.name(),
            Index::Sortable(i) => i.name(),
        }
    }

    /// The name of the set this index covers
    pub fn set_name(&self) -> &str {
        match self {
            Index::Basic(i) => i.set_name(),
            Index::Sortable(i) => i.set_name(),
        }
    }

    /// The equality field (the primary field for a sortable index)
    pub fn field(&self) -> &str {
        match self {
            Index::Basic(i) => i.field(),
            Index::Sortable(i) => i.primary_field(),
        }
    }

    /// Declared sort fields, if this index has any
    pub fn sort_fields(&self) -> Option<&[String]> {
        match self {
            Index::Basic(_) => None,
            Index::Sortable(i) => Some(i.sort_fields()),
        }
    }

    /// Which shape this index is
    pub fn kind(&self) -> IndexKind {
        match self {
            Index::Basic(_) => IndexKind::Basic,
            Index::Sortable(_) => IndexKind::Sortable,
        }
    }

    /// Rebuild from a full scan of the set
    pub fn build(&self, set: &Set) -> Result<()> {
        match self {
            Index::Basic(i) => i.build(set),
            Index::Sortable(i) => i.build(set),
        }
    }

    /// Add one entry from its encoded document
    pub fn add(&self, key: &str, raw: &[u8]) -> Result<()> {
        match self {
            Index::Basic(i) => i.add(key, raw),
            Index::Sortable(i) => i.add(key, raw),
        }
    }

    /// Remove one entry, locating it from the old encoded document
    pub fn remove(&self, key: &str, raw: &[u8]) -> Result<()> {
        match self {
            Index::Basic(i) => i.remove(key, raw),
            Index::Sortable(i) => i.remove(key, raw),
        }
    }

    /// Replace an entry
    pub fn update(&self, key: &str, old_raw: &[u8], new_raw: &[u8]) -> Result<()> {
        match self {
            Index::Basic(i) => i.update(key, old_raw, new_raw),
            Index::Sortable(i) => i.update(key, old_raw, new_raw),
        }
    }

    /// Keys whose indexed field equals `value`, in first-insertion order
    pub fn query_equal(&self, value: &str) -> Vec<String> {
        match self {
            Index::Basic(i) => i.query_equal(value),
            Index::Sortable(i) => i.query_equal(value),
        }
    }

    /// All distinct indexed values
    pub fn all_values(&self) -> Vec<String> {
        match self {
            Index::Basic(i) => i.all_values(),
            Index::Sortable(i) => i.all_values(),
        }
    }

    /// Number of distinct indexed values
    pub fn len(&self) -> usize {
        match self {
            Index::Basic(i) => i.len(),
            Index::Sortable(i) => i.len(),
        }
    }

    /// Whether the index holds no buckets
    pub fn is_empty(&self) -> bool {
        match self {
            Index::Basic(i) => i.is_empty(),
            Index::Sortable(i) => i.is_empty(),
        }
    }

    /// Drop all index state
    pub fn clear(&self) {
        match self {
            Index::Basic(i) => i.clear(),
            Index::Sortable(i) => i.clear(),
        }
    }

    /// Downcast to the basic shape
    pub fn as_basic(&self) -> Option<&BasicIndex> {
        match self {
            Index::Basic(i) => Some(i),
            Index::Sortable(_) => None,
        }
    }

    /// Downcast to the sortable shape
    pub fn as_sortable(&self) -> Option<&SortableIndex> {
        match self {
            Index::Basic(_) => None,
            Index::Sortable(i) => Some(i),
        }
    }
}
