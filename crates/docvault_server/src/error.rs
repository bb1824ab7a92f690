//! AppError — maps domain errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docvault_core::error::DocVaultError;

/// Wrapper so handlers can return `Result<_, AppError>` and use `?` on any
/// service call.
#[derive(Debug)]
pub struct AppError(pub DocVaultError);

impl From<DocVaultError> for AppError {
    fn from(e: DocVaultError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(serde_json::json!({ "detail": self.0.to_string() }))).into_response()
    }
}
