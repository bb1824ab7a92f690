//! Port traits implemented by `docvault_postgres` (and by the local
//! filesystem store in the server crate for [`FileStore`]).
//!
//! All methods return `Result<T, DocVaultError>`; adapters map their driver
//! errors into `DocVaultError::Internal`. Traits are object-safe so the
//! service can hold them as `Arc<dyn Port>` and tests can substitute fakes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DocVaultError;
use crate::proto::ListDocumentsQuery;
use crate::types::*;

pub type Result<T> = std::result::Result<T, DocVaultError>;

/// Input for inserting a `users` row. The hash is produced by the service;
/// stores never see plaintext passwords.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub department_id: Uuid,
    pub role_id: Uuid,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, input: NewUser) -> Result<UserRow>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>>;

    /// User joined with department and role names.
    async fn get_details(&self, email: &str) -> Result<Option<UserDetails>>;
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn list_departments(&self) -> Result<Vec<Department>>;
    async fn list_roles(&self) -> Result<Vec<Role>>;
    async fn department_exists(&self, department_id: Uuid) -> Result<bool>;
    async fn role_exists(&self, role_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, input: NewDocument) -> Result<()>;

    /// Returns false when the document does not exist.
    async fn update_document(
        &self,
        document_id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<bool>;

    /// Referential cleanup in one transaction: audit, permissions, tag
    /// associations, current-version pointer, versions, then the document
    /// row. Returns false when the document does not exist.
    async fn delete_document(&self, document_id: Uuid) -> Result<bool>;

    async fn get_head(&self, document_id: Uuid) -> Result<Option<DocumentHead>>;

    async fn list_with_details(&self, query: &ListDocumentsQuery) -> Result<Vec<DocumentListRow>>;

    async fn insert_version(&self, version: NewVersion) -> Result<()>;

    /// All versions, newest first.
    async fn list_versions(&self, document_id: Uuid) -> Result<Vec<VersionDetails>>;

    /// The current version when `version_id` is `None`, otherwise that
    /// specific version — and only if it belongs to the document.
    async fn download_target(
        &self,
        document_id: Uuid,
        version_id: Option<Uuid>,
    ) -> Result<Option<DownloadTarget>>;
}

/// The single-current-version invariant lives behind this port.
#[async_trait]
pub trait VersionConsistencyStore: Send + Sync {
    /// Clear the current flag on every version of the document, then set it
    /// on the target, in one transaction. Returns false (state unchanged)
    /// when the target does not belong to the document.
    async fn set_current_version(&self, document_id: Uuid, version_id: Uuid) -> Result<bool>;

    /// Idempotent repair: more than one current version keeps the highest
    /// version number; zero promotes the highest; exactly one is a no-op.
    async fn ensure_single_current_version(&self, document_id: Uuid) -> Result<()>;

    /// Scan for documents with multiple current versions and repair each.
    /// Returns the number repaired. Startup self-heal, not a guarantee.
    async fn cleanup_current_versions(&self) -> Result<u32>;
}

#[async_trait]
pub trait TagStore: Send + Sync {
    async fn list_tags(&self) -> Result<Vec<Tag>>;

    /// Case-sensitive name lookup, inserting when absent.
    async fn get_or_create(&self, name: &str) -> Result<Tag>;

    /// Associate tags with a document, recording who added them. Existing
    /// associations are left untouched.
    async fn associate(&self, document_id: Uuid, tag_ids: &[Uuid], added_by: Uuid) -> Result<()>;

    /// Remove associations whose tag is not in `keep`.
    async fn dissociate_absent(&self, document_id: Uuid, keep: &[Uuid]) -> Result<()>;

    /// Tag names for a document, ordered by name.
    async fn names_for_document(&self, document_id: Uuid) -> Result<Vec<String>>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> Result<()>;
}

/// Blob storage for uploaded files. The local filesystem impl lives in the
/// server crate; the path written into `document_versions.file_path` is
/// whatever `save` returns.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist bytes under a per-document prefix with a randomised name,
    /// returning the storage path, size, and SHA-256 checksum.
    async fn save(&self, document_id: Uuid, original_name: &str, bytes: &[u8])
        -> Result<StoredFile>;

    /// `None` when the path no longer exists on disk.
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;

    async fn remove(&self, path: &str) -> Result<()>;
}
