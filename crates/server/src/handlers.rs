//! HTTP handlers
//!
//! Every handler follows the same shape: validate the body, resolve the
//! database, check credentials, call the engine, wrap the result in the
//! envelope. Engine errors convert through `ApiError`, which fixes the
//! HTTP status and code string per error kind.

use crate::auth::{effective_credentials, AUTH_HEADER};
use crate::models::*;
use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use stash_engine::{AuthConfig, Database};
use std::sync::Arc;
use tracing::info;

type HandlerResult = Result<ApiResponse, ApiError>;

/// Resolve a database and check its credentials in one step
fn authorized_database(
    state: &AppState,
    headers: &HeaderMap,
    name: &str,
    body_auth: Option<&Credentials>,
) -> Result<Arc<Database>, ApiError> {
    if name.is_empty() {
        return Err(ApiError::invalid_request("Database name is required"));
    }
    let db = state.manager.get_database(name)?;
    let (user, pass) = effective_credentials(headers, AUTH_HEADER, body_auth);
    if !db.authenticate(&user, &pass) {
        return Err(stash_core::Error::auth_failed(name).into());
    }
    Ok(db)
}

fn require(value: &str, what: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::invalid_request(format!("{what} is required")));
    }
    Ok(())
}

// =============================================================================
// Database management
// =============================================================================

/// POST /create, admin-gated database creation
pub async fn database_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateDatabaseRequest>,
) -> HandlerResult {
    if !state.admin.check_request(&headers, req.admin_auth.as_ref()) {
        return Err(ApiError::admin_auth_required());
    }
    require(&req.name, "Database name")?;

    let auth = req
        .auth
        .filter(|c| !c.username.is_empty())
        .map(|c| AuthConfig::new(c.username, c.password));
    state.manager.create_database(&req.name, auth)?;

    info!(database = %req.name, "created database");
    Ok(ApiResponse::success("Database created successfully"))
}

/// POST /drop, admin-gated database removal
pub async fn database_drop(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DropDatabaseRequest>,
) -> HandlerResult {
    if !state.admin.check_request(&headers, req.admin_auth.as_ref()) {
        return Err(ApiError::admin_auth_required());
    }
    require(&req.name, "Database name")?;

    state.manager.delete_database(&req.name)?;
    info!(database = %req.name, "dropped database");
    Ok(ApiResponse::success("Database dropped successfully"))
}

// =============================================================================
// Set operations
// =============================================================================

/// POST /set/create
pub async fn set_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSetRequest>,
) -> HandlerResult {
    require(&req.name, "Set name")?;
    let db = authorized_database(&state, &headers, &req.database, req.auth.as_ref())?;
    db.create_set(&req.name)?;
    Ok(ApiResponse::success("Set created successfully"))
}

/// POST /set/put, the index-consistent write
///
/// Creates the set on first use, mirroring how clients stream data in
/// without a separate setup step.
pub async fn set_put(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PutRequest>,
) -> HandlerResult {
    require(&req.set, "Set name")?;
    require(&req.key, "Key")?;
    let db = authorized_database(&state, &headers, &req.database, req.auth.as_ref())?;

    if db.get_set(&req.set).is_err() {
        db.create_set(&req.set)?;
    }
    let value = stash_core::Value::from(req.value);
    db.put(&req.set, &req.key, &value)?;
    Ok(ApiResponse::success("Data stored successfully"))
}

/// POST /set/get
pub async fn set_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GetRequest>,
) -> HandlerResult {
    require(&req.set, "Set name")?;
    require(&req.key, "Key")?;
    let db = authorized_database(&state, &headers, &req.database, req.auth.as_ref())?;

    let value = db.get_set(&req.set)?.get(&req.key)?;
    Ok(ApiResponse::with_data(value.into()))
}

/// POST /set/delete, the index-consistent delete
pub async fn set_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DeleteRequest>,
) -> HandlerResult {
    require(&req.set, "Set name")?;
    require(&req.key, "Key")?;
    let db = authorized_database(&state, &headers, &req.database, req.auth.as_ref())?;

    db.delete(&req.set, &req.key)?;
    Ok(ApiResponse::success("Data deleted successfully"))
}

/// POST /set/list
pub async fn set_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ListSetsRequest>,
) -> HandlerResult {
    let db = authorized_database(&state, &headers, &req.database, req.auth.as_ref())?;
    let mut sets = db.list_sets();
    sets.sort();
    Ok(ApiResponse::with_data(serde_json::json!({ "sets": sets })))
}

// =============================================================================
// Index operations
// =============================================================================

/// POST /index/create
pub async fn index_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateIndexRequest>,
) -> HandlerResult {
    require(&req.name, "Index name")?;
    require(&req.set, "Set name")?;
    require(&req.field, "Field")?;
    let db = authorized_database(&state, &headers, &req.database, req.auth.as_ref())?;

    db.create_basic_index(&req.name, &req.set, &req.field)?;
    info!(database = %req.database, index = %req.name, "created index");
    Ok(ApiResponse::success("Index created successfully"))
}

/// POST /index/create/sortable
pub async fn index_create_sortable(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSortableIndexRequest>,
) -> HandlerResult {
    require(&req.name, "Index name")?;
    require(&req.set, "Set name")?;
    require(&req.primary_field, "Primary field")?;
    if req.sort_fields.is_empty() {
        return Err(ApiError::invalid_request(
            "At least one sort field is required",
        ));
    }
    let db = authorized_database(&state, &headers, &req.database, req.auth.as_ref())?;

    db.create_sortable_index(&req.name, &req.set, &req.primary_field, req.sort_fields)?;
    info!(database = %req.database, index = %req.name, "created sortable index");
    Ok(ApiResponse::success("Sortable index created successfully"))
}

/// POST /index/drop
pub async fn index_drop(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DropIndexRequest>,
) -> HandlerResult {
    require(&req.name, "Index name")?;
    let db = authorized_database(&state, &headers, &req.database, req.auth.as_ref())?;
    db.drop_index(&req.name)?;
    Ok(ApiResponse::success("Index dropped successfully"))
}

/// POST /index/query, equality lookup
///
/// For a basic index `sort` optionally orders the returned *keys*
/// (`asc`/`desc`); pagination is a plain slice over the result.
pub async fn index_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<QueryIndexRequest>,
) -> HandlerResult {
    require(&req.index, "Index name")?;
    let db = authorized_database(&state, &headers, &req.database, req.auth.as_ref())?;

    let index = db.get_index(&req.index)?;
    let mut keys = index.query_equal(&req.value);
    match req.sort.as_deref() {
        Some("asc") => keys.sort(),
        Some("desc") => {
            keys.sort();
            keys.reverse();
        }
        _ => {}
    }
    let keys = slice_page(keys, req.offset.unwrap_or(0), req.limit.unwrap_or(0));
    let count = keys.len();
    Ok(ApiResponse::with_data(serde_json::json!({
        "keys": keys,
        "count": count,
    })))
}

/// POST /index/query/sorted, sortable-index ordered retrieval
pub async fn index_query_sorted(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<QuerySortedRequest>,
) -> HandlerResult {
    require(&req.index, "Index name")?;
    let db = authorized_database(&state, &headers, &req.database, req.auth.as_ref())?;

    let index = db.get_index(&req.index)?;
    let Some(sortable) = index.as_sortable() else {
        return Err(ApiError::new(
            axum::http::StatusCode::BAD_REQUEST,
            "NOT_SORTABLE_INDEX",
            format!("index {} does not support sorted queries", req.index),
        ));
    };

    let offset = req.offset.unwrap_or(0);
    let limit = req.limit.unwrap_or(0);
    let keys = if let Some(fields) = &req.sort_fields {
        let directions = req.ascending_fields.clone().unwrap_or_default();
        sortable.query_multi_sorted_with_pagination(&req.value, fields, &directions, offset, limit)
    } else if let Some(field) = &req.sort_field {
        sortable.query_sorted_with_pagination(&req.value, field, req.ascending, offset, limit)
    } else {
        slice_page(sortable.query_equal(&req.value), offset, limit)
    };

    let count = keys.len();
    Ok(ApiResponse::with_data(serde_json::json!({
        "keys": keys,
        "count": count,
    })))
}

// =============================================================================
// Server info
// =============================================================================

/// GET /server/info
pub async fn server_info(State(state): State<AppState>) -> HandlerResult {
    Ok(ApiResponse::with_data(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "databases": state.manager.database_count(),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "backups_enabled": state.backups.is_some(),
    })))
}

// =============================================================================
// Backups
// =============================================================================

/// POST /backup/create
pub async fn backup_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BackupCreateRequest>,
) -> HandlerResult {
    if !state.admin.check_request(&headers, req.admin_auth.as_ref()) {
        return Err(ApiError::admin_auth_required());
    }
    let backups = state.backups.as_ref().ok_or_else(s3_not_enabled)?;

    let object = match &req.database {
        Some(name) => backups.backup_database(name).await,
        None => backups.backup_all().await,
    }
    .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(ApiResponse::with_data(serde_json::json!({ "object": object })))
}

/// POST /backup/list
pub async fn backup_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HandlerResult {
    if !state.admin.check_request(&headers, None) {
        return Err(ApiError::admin_auth_required());
    }
    let backups = state.backups.as_ref().ok_or_else(s3_not_enabled)?;
    let objects = backups
        .list_backups()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(ApiResponse::with_data(serde_json::json!({ "backups": objects })))
}

/// POST /backup/restore
pub async fn backup_restore(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BackupRestoreRequest>,
) -> HandlerResult {
    if !state.admin.check_request(&headers, req.admin_auth.as_ref()) {
        return Err(ApiError::admin_auth_required());
    }
    require(&req.object, "Backup object name")?;
    let backups = state.backups.as_ref().ok_or_else(s3_not_enabled)?;

    backups
        .restore(&req.object)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    info!(object = %req.object, "restored backup");
    Ok(ApiResponse::success("Backup restored successfully"))
}

fn s3_not_enabled() -> ApiError {
    ApiError::new(
        axum::http::StatusCode::SERVICE_UNAVAILABLE,
        "S3_NOT_ENABLED",
        "S3 is not configured on this server",
    )
}

/// Page a plain key list: offset past the end is empty, zero limit means to
/// the end.
fn slice_page(keys: Vec<String>, offset: usize, limit: usize) -> Vec<String> {
    if offset >= keys.len() {
        return Vec::new();
    }
    let end = if limit == 0 {
        keys.len()
    } else {
        (offset + limit).min(keys.len())
    };
    keys[offset..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_page() {
        let keys: Vec<String> = (0..6).map(|i| format!("k{i}")).collect();
        assert_eq!(slice_page(keys.clone(), 0, 2), vec!["k0", "k1"]);
        assert_eq!(slice_page(keys.clone(), 4, 10), vec!["k4", "k5"]);
        assert_eq!(slice_page(keys.clone(), 6, 1), Vec::<String>::new());
        assert_eq!(slice_page(keys.clone(), 2, 0).len(), 4);
    }
}
