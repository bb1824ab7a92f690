//! docvault_server — standalone REST server for the document repository.
//!
//! Reads config from env vars (see `config.rs` for the full list):
//!   DOCVAULT_DATABASE_URL — Postgres connection string (required)
//!   DOCVAULT_JWT_SECRET   — JWT HMAC secret (required)
//!   DOCVAULT_BIND_ADDR    — listen address (default: 0.0.0.0:8088)

use std::sync::Arc;

use docvault_core::service::{DocVaultService, DocVaultServiceImpl};
use docvault_postgres::PgStores;
use docvault_server::config::ServerConfig;
use docvault_server::middleware::jwt::JwtConfig;
use docvault_server::router::build_router;
use docvault_server::storage::LocalFileStore;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,docvault_server=debug".into()),
        )
        .init();

    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env().expect("invalid server configuration");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    tracing::info!("Connected to database");

    let stores = PgStores::new(pool.clone());
    let files = Arc::new(LocalFileStore::new(&config.upload_dir));

    let service: Arc<dyn DocVaultService> = Arc::new(
        DocVaultServiceImpl::new(
            Arc::new(stores.users),
            Arc::new(stores.directory),
            Arc::new(stores.documents),
            Arc::new(stores.consistency),
            Arc::new(stores.tags),
            Arc::new(stores.audit),
            files,
        )
        .with_bcrypt_cost(config.bcrypt_cost),
    );

    // Startup self-heal: repair documents left with multiple current
    // versions. Best-effort only; a failure here should not stop the server.
    match service.repair_current_versions().await {
        Ok(0) => tracing::info!("version-consistency check passed"),
        Ok(n) => tracing::warn!(
            repaired = n,
            "repaired documents with multiple current versions"
        ),
        Err(e) => tracing::error!(error = %e, "version-consistency startup repair failed"),
    }

    let jwt_config = JwtConfig::from_secret(config.jwt_secret.as_bytes())
        .with_ttl_minutes(config.token_ttl_minutes);

    let app = build_router(service, pool, jwt_config, config.upload_policy.clone());

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {}: {e}", config.bind_addr));
    tracing::info!("docvault_server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("server error");
}
