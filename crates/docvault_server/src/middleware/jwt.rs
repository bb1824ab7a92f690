//! JWT issue/verify and the bearer-auth middleware.
//!
//! Tokens are HS256 with `sub` = user email and a bounded `exp`. The
//! middleware validates the token and inserts a `Principal` extension;
//! nothing below the handler layer ever sees a raw token.

use anyhow::anyhow;
use axum::{extract::Request, http::header, middleware::Next, response::Response, Extension};
use chrono::Utc;
use docvault_core::{
    error::DocVaultError,
    principal::{JwtClaims, Principal},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::error::AppError;

const DEFAULT_TTL_MINUTES: i64 = 30;

#[derive(Clone)]
pub struct JwtConfig {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_minutes: i64,
}

impl JwtConfig {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_minutes: DEFAULT_TTL_MINUTES,
        }
    }

    pub fn with_ttl_minutes(mut self, minutes: i64) -> Self {
        self.ttl_minutes = minutes;
        self
    }

    /// Issue a bearer token for a user email.
    pub fn issue(&self, email: &str) -> Result<String, DocVaultError> {
        let claims = JwtClaims {
            sub: Some(email.to_string()),
            exp: (Utc::now() + chrono::Duration::minutes(self.ttl_minutes)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| DocVaultError::Internal(anyhow!(e)))
    }

    /// Decode and validate a token. Every failure mode (bad signature,
    /// expired, malformed) collapses into the same 401.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, DocVaultError> {
        decode::<JwtClaims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| DocVaultError::Unauthorized("could not validate credentials".into()))
    }
}

/// Middleware for protected routes: extract the bearer token, validate it,
/// and stash the `Principal` for handlers.
pub async fn jwt_auth(
    Extension(config): Extension<JwtConfig>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::from(DocVaultError::Unauthorized("missing bearer token".into()))
        })?;

    let claims = config.verify(token)?;
    let principal = Principal::from_jwt_claims(&claims)?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
