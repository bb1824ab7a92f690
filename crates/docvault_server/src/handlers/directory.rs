//! Directory listings: tags, departments, roles.

use std::sync::Arc;

use axum::{Extension, Json};
use docvault_core::{
    service::DocVaultService,
    types::{Department, Role, Tag},
};

use crate::error::AppError;

pub async fn list_tags(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
) -> Result<Json<Vec<Tag>>, AppError> {
    Ok(Json(service.list_tags().await?))
}

pub async fn list_departments(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
) -> Result<Json<Vec<Department>>, AppError> {
    Ok(Json(service.list_departments().await?))
}

pub async fn list_roles(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(service.list_roles().await?))
}
