//! Error types for the StashDB engine
//!
//! One unified error enum for the whole core, built on `thiserror`.
//!
//! ## Canonical error codes
//!
//! Every variant maps onto one of the seven frozen wire codes:
//!
//! | Code | Description |
//! |------|-------------|
//! | already_exists | Name conflict on a create operation |
//! | not_found | Database, set or index does not exist |
//! | key_not_found | Key absent from a set |
//! | codec_error | Document bytes could not be decoded |
//! | unsupported_type | An indexed field's value cannot be canonicalized |
//! | build_failed | Index build aborted on the first offending entry |
//! | auth_failed | Credential check rejected |
//!
//! ## Propagation policy
//!
//! Errors surface to the direct caller. The core never logs, never retries
//! and never recovers internally; collaborators decide what an error means
//! at their boundary.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// EntityKind: what a name refers to
// =============================================================================

/// The kind of named entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A database owned by the manager
    Database,
    /// A set inside a database
    Set,
    /// An index inside a database
    Index,
}

impl EntityKind {
    /// Get the lowercase name used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Database => "database",
            EntityKind::Set => "set",
            EntityKind::Index => "index",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// ErrorCode: frozen wire codes
// =============================================================================

/// Canonical error codes for the collaborator boundary
///
/// These seven codes are the stable representation of all engine errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Name conflict on create
    AlreadyExists,
    /// Named entity not found
    NotFound,
    /// Key absent from a set
    KeyNotFound,
    /// Undecodable document bytes
    CodecError,
    /// Field value cannot be canonicalized
    UnsupportedType,
    /// Index build aborted
    BuildFailed,
    /// Credential check rejected
    AuthFailed,
}

impl ErrorCode {
    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AlreadyExists => "already_exists",
            ErrorCode::NotFound => "not_found",
            ErrorCode::KeyNotFound => "key_not_found",
            ErrorCode::CodecError => "codec_error",
            ErrorCode::UnsupportedType => "unsupported_type",
            ErrorCode::BuildFailed => "build_failed",
            ErrorCode::AuthFailed => "auth_failed",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Error: unified engine error
// =============================================================================

/// Error type for all engine operations
#[derive(Debug, Error)]
pub enum Error {
    /// A create operation hit an existing name
    #[error("{kind} already exists: {name}")]
    AlreadyExists {
        /// What kind of entity collided
        kind: EntityKind,
        /// The conflicting name
        name: String,
    },

    /// A named database, set or index does not exist
    #[error("{kind} not found: {name}")]
    NotFound {
        /// What kind of entity is missing
        kind: EntityKind,
        /// The missing name
        name: String,
    },

    /// A key is absent from a set
    #[error("key not found: {key}")]
    KeyNotFound {
        /// The missing key
        key: String,
    },

    /// Document bytes could not be decoded
    #[error("codec error: {message}")]
    Codec {
        /// What went wrong
        message: String,
    },

    /// An indexed field holds a value that cannot be canonicalized
    /// (maps, sequences and null have no string form)
    #[error("unsupported type for field {field}: {type_name}")]
    UnsupportedType {
        /// The field being extracted
        field: String,
        /// The offending value's type
        type_name: &'static str,
    },

    /// Index build aborted on the first offending entry
    #[error("failed to build index {index}")]
    BuildFailed {
        /// The index whose build failed
        index: String,
        /// The entry-level error that aborted the build
        #[source]
        source: Box<Error>,
    },

    /// Credential check rejected
    #[error("authentication failed for database {database}")]
    AuthFailed {
        /// The database the credentials were checked against
        database: String,
    },
}

impl Error {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create an AlreadyExists error
    pub fn already_exists(kind: EntityKind, name: impl Into<String>) -> Self {
        Error::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create a KeyNotFound error
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Error::KeyNotFound { key: key.into() }
    }

    /// Create a Codec error
    pub fn codec(message: impl Into<String>) -> Self {
        Error::Codec {
            message: message.into(),
        }
    }

    /// Create an UnsupportedType error
    pub fn unsupported_type(field: impl Into<String>, type_name: &'static str) -> Self {
        Error::UnsupportedType {
            field: field.into(),
            type_name,
        }
    }

    /// Create a BuildFailed error wrapping the entry-level cause
    pub fn build_failed(index: impl Into<String>, source: Error) -> Self {
        Error::BuildFailed {
            index: index.into(),
            source: Box::new(source),
        }
    }

    /// Create an AuthFailed error
    pub fn auth_failed(database: impl Into<String>) -> Self {
        Error::AuthFailed {
            database: database.into(),
        }
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Get the canonical error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            Error::NotFound { .. } => ErrorCode::NotFound,
            Error::KeyNotFound { .. } => ErrorCode::KeyNotFound,
            Error::Codec { .. } => ErrorCode::CodecError,
            Error::UnsupportedType { .. } => ErrorCode::UnsupportedType,
            Error::BuildFailed { .. } => ErrorCode::BuildFailed,
            Error::AuthFailed { .. } => ErrorCode::AuthFailed,
        }
    }

    /// Check if this is a "missing entity" error (entity or key)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::KeyNotFound { .. })
    }

    /// Check if this is a name conflict
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }

    /// Check if this is a document-shape problem (codec or unsupported type)
    pub fn is_document_error(&self) -> bool {
        matches!(self, Error::Codec { .. } | Error::UnsupportedType { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::not_found(EntityKind::Set, "users");
        assert_eq!(err.to_string(), "set not found: users");

        let err = Error::key_not_found("k1");
        assert_eq!(err.to_string(), "key not found: k1");

        let err = Error::unsupported_type("tags", "Array");
        assert!(err.to_string().contains("tags"));
        assert!(err.to_string().contains("Array"));
    }

    #[test]
    fn test_code_mapping() {
        assert_eq!(
            Error::already_exists(EntityKind::Database, "d").code(),
            ErrorCode::AlreadyExists
        );
        assert_eq!(Error::key_not_found("k").code(), ErrorCode::KeyNotFound);
        assert_eq!(Error::codec("bad bytes").code(), ErrorCode::CodecError);
        assert_eq!(
            Error::build_failed("idx", Error::codec("bad")).code(),
            ErrorCode::BuildFailed
        );
    }

    #[test]
    fn test_code_strings_are_frozen() {
        assert_eq!(ErrorCode::AlreadyExists.as_str(), "already_exists");
        assert_eq!(ErrorCode::NotFound.as_str(), "not_found");
        assert_eq!(ErrorCode::KeyNotFound.as_str(), "key_not_found");
        assert_eq!(ErrorCode::CodecError.as_str(), "codec_error");
        assert_eq!(ErrorCode::UnsupportedType.as_str(), "unsupported_type");
        assert_eq!(ErrorCode::BuildFailed.as_str(), "build_failed");
        assert_eq!(ErrorCode::AuthFailed.as_str(), "auth_failed");
    }

    #[test]
    fn test_build_failed_preserves_source() {
        let err = Error::build_failed("by_name", Error::unsupported_type("n", "Object"));
        match &err {
            Error::BuildFailed { source, .. } => {
                assert!(matches!(**source, Error::UnsupportedType { .. }));
            }
            _ => panic!("wrong variant"),
        }
        // The source participates in the std::error::Error chain
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_classification() {
        assert!(Error::not_found(EntityKind::Index, "i").is_not_found());
        assert!(Error::key_not_found("k").is_not_found());
        assert!(!Error::codec("x").is_not_found());
        assert!(Error::codec("x").is_document_error());
        assert!(Error::unsupported_type("f", "Null").is_document_error());
        assert!(Error::already_exists(EntityKind::Set, "s").is_already_exists());
    }
}
