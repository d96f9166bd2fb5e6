//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    browse_share, create_folder, create_permission, create_share, delete_file, delete_folder,
    download_blob, get_file_url, list_files, list_folders, list_permissions, list_shares,
    list_trash, login, me, move_file, move_folder, register, rename_file, rename_folder,
    resolve_share, restore_file, revoke_permission, revoke_share, trash_file, upload_file,
    AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};

/// Headroom on top of the upload limit for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let upload_limit = usize::try_from(app_state.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let file_routes = Router::new()
        .route(
            "/",
            get(list_files)
                .post(upload_file)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/:id", patch(rename_file).delete(delete_file))
        .route("/:id/url", get(get_file_url))
        .route("/:id/trash", post(trash_file))
        .route("/:id/restore", post(restore_file));

    let folder_routes = Router::new()
        .route("/", get(list_folders).post(create_folder))
        .route("/:id", patch(rename_folder).delete(delete_folder));

    let move_routes = Router::new()
        .route("/files/:id", patch(move_file))
        .route("/folders/:id", patch(move_folder));

    let permission_routes = Router::new()
        .route("/", get(list_permissions).post(create_permission))
        .route("/:id", delete(revoke_permission));

    let share_routes = Router::new()
        .route("/", get(list_shares).post(create_share))
        .route("/:id", delete(revoke_share));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .route("/me", get(me))
        .nest("/files", file_routes)
        .route("/trash", get(list_trash))
        .nest("/folders", folder_routes)
        .nest("/move", move_routes)
        .nest("/permissions", permission_routes)
        .nest("/shares", share_routes);

    // Public routes (the token or signature is the credential)
    let public_routes = Router::new()
        .route("/s/:token", get(resolve_share))
        .route("/s/:token/folders/:id", get(browse_share))
        .route("/blobs/*path", get(download_blob));

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .merge(public_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
