//! Core domain types for the document repository.
//! These are pure value types — no sqlx, no DB dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Users and directory ───────────────────────────────────────

/// A `users` row as stored, password hash included. Never serialised to
/// clients; responses use [`UserDetails`].
#[derive(Debug, Clone)]
pub struct UserRow {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub department_id: Uuid,
    pub role_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// User joined with department and role names — the shape every auth
/// response carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetails {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub department_name: String,
    pub role_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub department_id: Uuid,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub role_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub tag_id: Uuid,
    pub name: String,
}

// ── Documents and versions ────────────────────────────────────

/// Input for inserting a `documents` row.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub document_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_by: Uuid,
}

/// Document joined with creator and department names.
#[derive(Debug, Clone)]
pub struct DocumentHead {
    pub document_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub creator_name: String,
    pub department_name: String,
}

/// One row of the document listing: head fields plus the current version,
/// when the document has one.
#[derive(Debug, Clone)]
pub struct DocumentListRow {
    pub head: DocumentHead,
    pub current_version: Option<VersionSummary>,
}

/// Input for inserting a `document_versions` row.
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub version_id: Uuid,
    pub document_id: Uuid,
    pub version_number: i32,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: Option<String>,
    pub checksum: String,
    pub uploaded_by: Uuid,
    pub is_current: bool,
}

/// The version fields exposed on document listings and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSummary {
    pub version_id: Uuid,
    pub version_number: i32,
    pub file_name: String,
    pub file_type: Option<String>,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
    pub is_current: bool,
}

/// A full version row for the versions listing, uploader resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionDetails {
    pub version_id: Uuid,
    pub version_number: i32,
    pub file_name: String,
    pub file_type: Option<String>,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
    pub is_current: bool,
    pub file_path: String,
    pub uploaded_by: Option<Uuid>,
    pub uploader_name: String,
}

/// What the download path needs: where the bytes live and how to label them.
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    pub version_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_type: Option<String>,
}

/// Result of persisting an uploaded file to blob storage.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: String,
    pub size: i64,
    pub checksum: String,
}

// ── Audit ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Download,
    View,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Download => "download",
            Self::View => "view",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "download" => Some(Self::Download),
            "view" => Some(Self::View),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only `document_audit` entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub action: AuditAction,
    pub details: Option<String>,
}
