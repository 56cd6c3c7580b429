//! Request and response shapes for the HTTP API
//!
//! Every endpoint takes a JSON POST body and answers with the envelope
//! `{"status": "success", ...}` or `{"status": "error", "code", "message"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

// =============================================================================
// Envelope
// =============================================================================

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    /// Always `"success"`
    pub status: &'static str,
    /// Optional human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    /// A bare success
    pub fn success(message: impl Into<String>) -> Self {
        ApiResponse {
            status: "success",
            message: Some(message.into()),
            data: None,
        }
    }

    /// A success carrying a payload
    pub fn with_data(data: serde_json::Value) -> Self {
        ApiResponse {
            status: "success",
            message: None,
            data: Some(data),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Error envelope, carrying its HTTP status
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status to answer with
    pub status: StatusCode,
    /// Stable machine-readable code
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Create an error response
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 with `INVALID_REQUEST`
    pub fn invalid_request(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    /// 401 with `AUTH_FAILED`
    pub fn auth_failed() -> Self {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            "AUTH_FAILED",
            "Authentication failed",
        )
    }

    /// 401 with `ADMIN_AUTH_REQUIRED`
    pub fn admin_auth_required() -> Self {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            "ADMIN_AUTH_REQUIRED",
            "Admin authentication required",
        )
    }

    /// 500 with `INTERNAL_ERROR`
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<stash_core::Error> for ApiError {
    fn from(err: stash_core::Error) -> Self {
        use stash_core::{EntityKind, Error};
        let message = err.to_string();
        match &err {
            Error::NotFound { kind, .. } => {
                let code = match kind {
                    EntityKind::Database => "DB_NOT_FOUND",
                    EntityKind::Set => "SET_NOT_FOUND",
                    EntityKind::Index => "INDEX_NOT_FOUND",
                };
                ApiError::new(StatusCode::NOT_FOUND, code, message)
            }
            Error::KeyNotFound { .. } => {
                ApiError::new(StatusCode::NOT_FOUND, "KEY_NOT_FOUND", message)
            }
            Error::AlreadyExists { kind, .. } => {
                let code = match kind {
                    EntityKind::Database => "DB_EXISTS",
                    EntityKind::Set => "SET_EXISTS",
                    EntityKind::Index => "INDEX_EXISTS",
                };
                ApiError::new(StatusCode::CONFLICT, code, message)
            }
            Error::Codec { .. } => ApiError::new(StatusCode::BAD_REQUEST, "CODEC_ERROR", message),
            Error::UnsupportedType { .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, "UNSUPPORTED_TYPE", message)
            }
            Error::BuildFailed { .. } => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "BUILD_FAILED", message)
            }
            Error::AuthFailed { .. } => ApiError::auth_failed(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Shared request pieces
// =============================================================================

/// Username/password pair carried in request bodies
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Credentials {
    /// Username
    #[serde(default)]
    pub username: String,
    /// Password
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Database management
// =============================================================================

/// Body for `/create`
#[derive(Debug, Deserialize)]
pub struct CreateDatabaseRequest {
    /// Database name
    pub name: String,
    /// Optional per-database credentials to configure
    #[serde(default)]
    pub auth: Option<Credentials>,
    /// Admin credentials (body fallback)
    #[serde(default)]
    pub admin_auth: Option<Credentials>,
}

/// Body for `/drop`
#[derive(Debug, Deserialize)]
pub struct DropDatabaseRequest {
    /// Database name
    pub name: String,
    /// Admin credentials (body fallback)
    #[serde(default)]
    pub admin_auth: Option<Credentials>,
}

// =============================================================================
// Set operations
// =============================================================================

/// Body for `/set/create`
#[derive(Debug, Deserialize)]
pub struct CreateSetRequest {
    /// Database name
    pub database: String,
    /// Set name
    pub name: String,
    /// Database credentials (body fallback)
    #[serde(default)]
    pub auth: Option<Credentials>,
}

/// Body for `/set/put`
#[derive(Debug, Deserialize)]
pub struct PutRequest {
    /// Database name
    pub database: String,
    /// Set name
    pub set: String,
    /// Key to store under
    pub key: String,
    /// Document to store
    pub value: serde_json::Value,
    /// Database credentials (body fallback)
    #[serde(default)]
    pub auth: Option<Credentials>,
}

/// Body for `/set/get`
#[derive(Debug, Deserialize)]
pub struct GetRequest {
    /// Database name
    pub database: String,
    /// Set name
    pub set: String,
    /// Key to fetch
    pub key: String,
    /// Database credentials (body fallback)
    #[serde(default)]
    pub auth: Option<Credentials>,
}

/// Body for `/set/delete`
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    /// Database name
    pub database: String,
    /// Set name
    pub set: String,
    /// Key to remove
    pub key: String,
    /// Database credentials (body fallback)
    #[serde(default)]
    pub auth: Option<Credentials>,
}

/// Body for `/set/list`
#[derive(Debug, Deserialize)]
pub struct ListSetsRequest {
    /// Database name
    pub database: String,
    /// Database credentials (body fallback)
    #[serde(default)]
    pub auth: Option<Credentials>,
}

// =============================================================================
// Index operations
// =============================================================================

/// Body for `/index/create`
#[derive(Debug, Deserialize)]
pub struct CreateIndexRequest {
    /// Database name
    pub database: String,
    /// Set to cover
    pub set: String,
    /// Index name
    pub name: String,
    /// Field to index
    pub field: String,
    /// Database credentials (body fallback)
    #[serde(default)]
    pub auth: Option<Credentials>,
}

/// Body for `/index/create/sortable`
#[derive(Debug, Deserialize)]
pub struct CreateSortableIndexRequest {
    /// Database name
    pub database: String,
    /// Set to cover
    pub set: String,
    /// Index name
    pub name: String,
    /// Equality field
    pub primary_field: String,
    /// Declared sort fields
    pub sort_fields: Vec<String>,
    /// Database credentials (body fallback)
    #[serde(default)]
    pub auth: Option<Credentials>,
}

/// Body for `/index/drop`
#[derive(Debug, Deserialize)]
pub struct DropIndexRequest {
    /// Database name
    pub database: String,
    /// Index name
    pub name: String,
    /// Database credentials (body fallback)
    #[serde(default)]
    pub auth: Option<Credentials>,
}

/// Body for `/index/query`
#[derive(Debug, Deserialize)]
pub struct QueryIndexRequest {
    /// Database name
    pub database: String,
    /// Index name
    pub index: String,
    /// Value to match
    pub value: String,
    /// `"asc"`/`"desc"` key ordering for basic indexes
    #[serde(default)]
    pub sort: Option<String>,
    /// Page offset
    #[serde(default)]
    pub offset: Option<usize>,
    /// Page size; omitted or 0 means to the end
    #[serde(default)]
    pub limit: Option<usize>,
    /// Database credentials (body fallback)
    #[serde(default)]
    pub auth: Option<Credentials>,
}

/// Body for `/index/query/sorted`
#[derive(Debug, Deserialize)]
pub struct QuerySortedRequest {
    /// Database name
    pub database: String,
    /// Index name
    pub index: String,
    /// Value to match
    pub value: String,
    /// Single sort field (exclusive with `sort_fields`)
    #[serde(default)]
    pub sort_field: Option<String>,
    /// Multiple sort fields, lexicographic
    #[serde(default)]
    pub sort_fields: Option<Vec<String>>,
    /// Direction for `sort_field`
    #[serde(default = "default_true")]
    pub ascending: bool,
    /// Per-field directions for `sort_fields`
    #[serde(default)]
    pub ascending_fields: Option<Vec<bool>>,
    /// Page offset
    #[serde(default)]
    pub offset: Option<usize>,
    /// Page size; omitted or 0 means to the end
    #[serde(default)]
    pub limit: Option<usize>,
    /// Database credentials (body fallback)
    #[serde(default)]
    pub auth: Option<Credentials>,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Backups
// =============================================================================

/// Body for `/backup/create`
#[derive(Debug, Deserialize)]
pub struct BackupCreateRequest {
    /// Back up one database; all databases when omitted
    #[serde(default)]
    pub database: Option<String>,
    /// Admin credentials (body fallback)
    #[serde(default)]
    pub admin_auth: Option<Credentials>,
}

/// Body for `/backup/restore`
#[derive(Debug, Deserialize)]
pub struct BackupRestoreRequest {
    /// Object name of the backup to restore
    pub object: String,
    /// Admin credentials (body fallback)
    #[serde(default)]
    pub admin_auth: Option<Credentials>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::success("ok")).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "ok");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_data_envelope_shape() {
        let json =
            serde_json::to_value(ApiResponse::with_data(serde_json::json!({"keys": []}))).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["keys"], serde_json::json!([]));
    }

    #[test]
    fn test_engine_error_mapping() {
        use stash_core::{EntityKind, Error};

        let api: ApiError = Error::not_found(EntityKind::Database, "d").into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.code, "DB_NOT_FOUND");

        let api: ApiError = Error::key_not_found("k").into();
        assert_eq!(api.code, "KEY_NOT_FOUND");

        let api: ApiError = Error::already_exists(EntityKind::Index, "i").into();
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.code, "INDEX_EXISTS");

        let api: ApiError = Error::unsupported_type("f", "Array").into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);

        let api: ApiError = Error::build_failed("i", Error::codec("x")).into();
        assert_eq!(api.code, "BUILD_FAILED");
    }

    #[test]
    fn test_request_bodies_deserialize_without_auth() {
        let req: PutRequest = serde_json::from_value(serde_json::json!({
            "database": "d",
            "set": "s",
            "key": "k",
            "value": {"a": 1},
        }))
        .unwrap();
        assert!(req.auth.is_none());

        let req: QuerySortedRequest = serde_json::from_value(serde_json::json!({
            "database": "d",
            "index": "i",
            "value": "v",
        }))
        .unwrap();
        assert!(req.ascending);
        assert!(req.sort_field.is_none());
    }
}
