//! Password hashing.
//!
//! bcrypt with an environment-tiered cost: production deployments run 12
//! rounds, development and test runs use a low cost so logins stay fast.

use anyhow::anyhow;

use crate::error::DocVaultError;

/// Cost for production deployments.
pub const PRODUCTION_BCRYPT_COST: u32 = 12;

/// Cost for development and test environments. bcrypt's floor is 4; 6 keeps
/// a margin while staying fast enough for interactive testing.
pub const FAST_BCRYPT_COST: u32 = 6;

pub fn hash_password(password: &str, cost: u32) -> Result<String, DocVaultError> {
    bcrypt::hash(password, cost).map_err(|e| DocVaultError::Internal(anyhow!(e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, DocVaultError> {
    bcrypt::verify(password, hash).map_err(|e| DocVaultError::Internal(anyhow!(e)))
}
