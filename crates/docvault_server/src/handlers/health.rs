//! Liveness and database health checks.

use anyhow::anyhow;
use axum::{Extension, Json};
use docvault_core::error::DocVaultError;
use sqlx::PgPool;

use crate::error::AppError;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "docvault" }))
}

/// Runs a trivial query so a broken pool shows up here instead of on the
/// first real request.
pub async fn db_health(
    Extension(pool): Extension<PgPool>,
) -> Result<Json<serde_json::Value>, AppError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&pool)
        .await
        .map_err(|e| DocVaultError::Internal(anyhow!(e)))?;
    Ok(Json(
        serde_json::json!({ "status": "ok", "database": "reachable" }),
    ))
}
