//! Route table

use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the full router
///
/// Backup routes are registered only when S3 is configured; hitting them on
/// an unconfigured server is a 404 rather than a 503, matching the rest of
/// the "feature absent" surface.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        // Database management
        .route("/create", post(handlers::database_create))
        .route("/drop", post(handlers::database_drop))
        // Set operations
        .route("/set/create", post(handlers::set_create))
        .route("/set/get", post(handlers::set_get))
        .route("/set/put", post(handlers::set_put))
        .route("/set/delete", post(handlers::set_delete))
        .route("/set/list", post(handlers::set_list))
        // Index operations
        .route("/index/create", post(handlers::index_create))
        .route("/index/create/sortable", post(handlers::index_create_sortable))
        .route("/index/drop", post(handlers::index_drop))
        .route("/index/query", post(handlers::index_query))
        .route("/index/query/sorted", post(handlers::index_query_sorted))
        // Server info
        .route("/server/info", get(handlers::server_info));

    if state.backups.is_some() {
        router = router
            .route("/backup/create", post(handlers::backup_create))
            .route("/backup/list", post(handlers::backup_list))
            .route("/backup/restore", post(handlers::backup_restore));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
