//! Request and response DTOs for the HTTP surface.
//!
//! Kept separate from `types` so wire shapes can drift from storage shapes
//! without touching the ports.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{UserDetails, VersionSummary};

// ── Auth ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub department_id: Uuid,
    pub role_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued on register and login: bearer token plus the resolved user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserDetails,
}

// ── Documents ─────────────────────────────────────────────────

/// An uploaded file as parsed out of the multipart form.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct CreateDocumentInput {
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub file: FileUpload,
}

#[derive(Debug, Clone)]
pub struct UpdateDocumentInput {
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub file: Option<FileUpload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListDocumentsQuery {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub document_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub creator_name: String,
    pub department_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub current_version: Option<VersionSummary>,
    pub tags: Vec<String>,
}

/// Payload handed to the download handler: label plus bytes.
#[derive(Debug, Clone)]
pub struct DownloadPayload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddTagsRequest {
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
