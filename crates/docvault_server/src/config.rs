//! Server configuration, read from env vars (a `.env` file is honoured):
//!
//!   DOCVAULT_DATABASE_URL      — Postgres connection string (required)
//!   DOCVAULT_JWT_SECRET        — JWT HMAC secret (required)
//!   DOCVAULT_BIND_ADDR         — listen address (default: 0.0.0.0:8088)
//!   DOCVAULT_UPLOAD_DIR        — file storage root (default: uploads)
//!   DOCVAULT_TOKEN_TTL_MINUTES — bearer token lifetime (default: 30)
//!   DOCVAULT_ENVIRONMENT       — "production" selects the slow bcrypt cost
//!   DOCVAULT_BCRYPT_COST       — explicit cost override
//!   DOCVAULT_MAX_FILE_SIZE     — upload cap in bytes (default: 10 MiB)

use anyhow::{anyhow, Context};
use docvault_core::{auth, error::DocVaultError, proto::FileUpload};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8088";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Content types accepted for upload.
const ALLOWED_FILE_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
    "image/jpeg",
    "image/png",
    "image/gif",
];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub upload_dir: String,
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub upload_policy: UploadPolicy,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DOCVAULT_DATABASE_URL")
            .context("DOCVAULT_DATABASE_URL must be set")?;
        let jwt_secret =
            std::env::var("DOCVAULT_JWT_SECRET").context("DOCVAULT_JWT_SECRET must be set")?;

        let bcrypt_cost = match std::env::var("DOCVAULT_BCRYPT_COST") {
            Ok(v) => v
                .parse()
                .map_err(|_| anyhow!("DOCVAULT_BCRYPT_COST must be an integer"))?,
            Err(_) => {
                if std::env::var("DOCVAULT_ENVIRONMENT").as_deref() == Ok("production") {
                    auth::PRODUCTION_BCRYPT_COST
                } else {
                    auth::FAST_BCRYPT_COST
                }
            }
        };

        let max_file_size = std::env::var("DOCVAULT_MAX_FILE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_FILE_SIZE);

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: std::env::var("DOCVAULT_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.into()),
            upload_dir: std::env::var("DOCVAULT_UPLOAD_DIR")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.into()),
            token_ttl_minutes: std::env::var("DOCVAULT_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES),
            bcrypt_cost,
            upload_policy: UploadPolicy::new(max_file_size),
        })
    }
}

/// Upload guards applied before a multipart file reaches the service.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_file_size: usize,
    pub allowed_types: Vec<String>,
}

impl UploadPolicy {
    pub fn new(max_file_size: usize) -> Self {
        Self {
            max_file_size,
            allowed_types: ALLOWED_FILE_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn check(&self, file: &FileUpload) -> Result<(), DocVaultError> {
        if file.bytes.len() > self.max_file_size {
            return Err(DocVaultError::InvalidInput(format!(
                "file exceeds the {} byte limit",
                self.max_file_size
            )));
        }
        if let Some(content_type) = &file.content_type {
            if !self.allowed_types.iter().any(|t| t == content_type) {
                return Err(DocVaultError::InvalidInput(format!(
                    "file type '{content_type}' is not allowed"
                )));
            }
        }
        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE)
    }
}
