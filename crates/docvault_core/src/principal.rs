use crate::error::DocVaultError;

/// The authenticated caller, derived from a validated bearer token.
///
/// The server middleware constructs this from JWT claims; core logic never
/// reads raw tokens. The token carries only the subject email — user rows
/// (active flag, department, role) are looked up per request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub email: String,
}

impl Principal {
    /// Construct from validated JWT claims at the server boundary.
    pub fn from_jwt_claims(claims: &JwtClaims) -> Result<Self, DocVaultError> {
        let email = claims
            .sub
            .clone()
            .ok_or_else(|| DocVaultError::Unauthorized("missing sub claim".into()))?;
        Ok(Self { email })
    }
}

/// JWT claims shape: `sub` is the user email, `exp` a unix timestamp.
/// Serialised on issue and deserialised by the server JWT middleware.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct JwtClaims {
    pub sub: Option<String>,
    pub exp: i64,
}
