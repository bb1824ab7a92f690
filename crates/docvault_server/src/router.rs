//! Router construction for the document repository server.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_mw,
    routing::{get, post, put},
    Extension, Router,
};
use docvault_core::service::DocVaultService;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::UploadPolicy;
use crate::handlers;
use crate::middleware::jwt::{jwt_auth, JwtConfig};

/// Build the full axum router with all routes and middleware.
pub fn build_router(
    service: Arc<dyn DocVaultService>,
    pool: PgPool,
    jwt_config: JwtConfig,
    upload_policy: UploadPolicy,
) -> Router {
    // Routes that require JWT authentication
    let protected = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/documents",
            post(handlers::documents::create).get(handlers::documents::list),
        )
        .route(
            "/documents/:id",
            get(handlers::documents::get_one)
                .put(handlers::documents::update)
                .delete(handlers::documents::delete),
        )
        .route(
            "/documents/:id/versions",
            get(handlers::documents::list_versions),
        )
        .route(
            "/documents/:id/versions/:version_id/set-current",
            put(handlers::documents::set_current),
        )
        .route(
            "/documents/:id/download",
            get(handlers::documents::download),
        )
        .route(
            "/documents/:id/versions/:version_id/download",
            get(handlers::documents::download_version),
        )
        .route("/documents/:id/tags", post(handlers::documents::add_tags))
        .route("/tags", get(handlers::directory::list_tags))
        .route("/departments", get(handlers::directory::list_departments))
        .route("/roles", get(handlers::directory::list_roles))
        .layer(axum_mw::from_fn(jwt_auth));

    // Public routes (no auth)
    let public = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/db-health", get(handlers::health::db_health))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login));

    // Leave multipart framing headroom above the per-file cap.
    let max_body = upload_policy.max_file_size + 64 * 1024;

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api", public.merge(protected))
        .layer(Extension(service))
        .layer(Extension(pool))
        .layer(Extension(jwt_config))
        .layer(Extension(upload_policy))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
