//! Authentication handlers.
//!
//! POST /api/auth/register — create a user, return token + details
//! POST /api/auth/login    — verify credentials, return token + details
//! GET  /api/auth/me       — resolve the bearer token to user details

use std::sync::Arc;

use axum::{Extension, Json};
use docvault_core::{
    principal::Principal,
    proto::{LoginRequest, RegisterRequest, TokenResponse},
    service::DocVaultService,
    types::UserDetails,
};

use crate::{error::AppError, middleware::jwt::JwtConfig};

pub async fn register(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Extension(jwt): Extension<JwtConfig>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = service.register(req).await?;
    token_response(&jwt, user)
}

pub async fn login(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Extension(jwt): Extension<JwtConfig>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = service.authenticate(&req.email, &req.password).await?;
    token_response(&jwt, user)
}

pub async fn me(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<UserDetails>, AppError> {
    Ok(Json(service.current_user(&principal).await?))
}

fn token_response(jwt: &JwtConfig, user: UserDetails) -> Result<Json<TokenResponse>, AppError> {
    let access_token = jwt.issue(&user.email)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
        user,
    }))
}
