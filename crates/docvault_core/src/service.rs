//! DocVaultService — the central domain service.
//!
//! Takes port traits via `Arc<dyn Port>` so the same logic works against
//! Postgres or test doubles. All authenticated operations take `&Principal`
//! explicitly — no implicit identity, no thread-local context. The server
//! crate wraps this behind axum handlers; JWT issuance and verification stay
//! at that boundary.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth,
    error::DocVaultError,
    ports::{
        AuditStore, DirectoryStore, DocumentStore, FileStore, NewUser, TagStore, UserStore,
        VersionConsistencyStore,
    },
    principal::Principal,
    proto::*,
    types::*,
};

pub type Result<T> = std::result::Result<T, DocVaultError>;

// ── DocVaultService trait ─────────────────────────────────────

#[async_trait]
pub trait DocVaultService: Send + Sync {
    /// Register a new user. Fails on duplicate email or unknown
    /// department/role, without touching stored data.
    async fn register(&self, req: RegisterRequest) -> Result<UserDetails>;

    /// Verify credentials. Unknown email and wrong password fail the same
    /// way; a deactivated account is reported distinctly.
    async fn authenticate(&self, email: &str, password: &str) -> Result<UserDetails>;

    /// Resolve the caller to an active user row.
    async fn current_user(&self, principal: &Principal) -> Result<UserDetails>;

    /// Create a document with its first version from an uploaded file.
    async fn create_document(
        &self,
        principal: &Principal,
        input: CreateDocumentInput,
    ) -> Result<DocumentResponse>;

    async fn list_documents(&self, query: ListDocumentsQuery) -> Result<Vec<DocumentResponse>>;

    async fn get_document(&self, document_id: Uuid) -> Result<DocumentResponse>;

    /// Update title/description; when a file is attached, append it as a new
    /// version and promote it to current.
    async fn update_document(
        &self,
        principal: &Principal,
        document_id: Uuid,
        input: UpdateDocumentInput,
    ) -> Result<DocumentResponse>;

    /// Referential cleanup in the database, then best-effort removal of the
    /// version files from blob storage.
    async fn delete_document(&self, principal: &Principal, document_id: Uuid) -> Result<()>;

    async fn list_versions(&self, document_id: Uuid) -> Result<Vec<VersionDetails>>;

    /// Promote a version to current. A version that does not belong to the
    /// document leaves state unchanged and reports failure.
    async fn set_current_version(&self, document_id: Uuid, version_id: Uuid) -> Result<()>;

    /// Fetch the bytes of the current version, or of a specific version.
    async fn download(
        &self,
        principal: &Principal,
        document_id: Uuid,
        version_id: Option<Uuid>,
    ) -> Result<DownloadPayload>;

    /// Get-or-create each tag name and associate it with the document.
    /// Returns the document's full tag list.
    async fn add_tags(
        &self,
        principal: &Principal,
        document_id: Uuid,
        names: Vec<String>,
    ) -> Result<Vec<String>>;

    async fn list_tags(&self) -> Result<Vec<Tag>>;
    async fn list_departments(&self) -> Result<Vec<Department>>;
    async fn list_roles(&self) -> Result<Vec<Role>>;

    /// Startup self-heal: repair every document holding more than one
    /// current version. Returns the number repaired.
    async fn repair_current_versions(&self) -> Result<u32>;
}

// ── DocVaultServiceImpl ───────────────────────────────────────

/// Concrete implementation holding port trait references.
/// Constructed at startup in `docvault_server/src/main.rs`.
pub struct DocVaultServiceImpl {
    pub users: Arc<dyn UserStore>,
    pub directory: Arc<dyn DirectoryStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub consistency: Arc<dyn VersionConsistencyStore>,
    pub tags: Arc<dyn TagStore>,
    pub audit: Arc<dyn AuditStore>,
    pub files: Arc<dyn FileStore>,
    bcrypt_cost: u32,
}

impl DocVaultServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserStore>,
        directory: Arc<dyn DirectoryStore>,
        documents: Arc<dyn DocumentStore>,
        consistency: Arc<dyn VersionConsistencyStore>,
        tags: Arc<dyn TagStore>,
        audit: Arc<dyn AuditStore>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            users,
            directory,
            documents,
            consistency,
            tags,
            audit,
            files,
            bcrypt_cost: auth::PRODUCTION_BCRYPT_COST,
        }
    }

    /// Override the bcrypt cost (builder pattern). Development and test
    /// configs pass a low cost so logins stay fast.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    async fn require_active_user(&self, principal: &Principal) -> Result<UserDetails> {
        let user = self
            .users
            .get_details(&principal.email)
            .await?
            .ok_or_else(|| DocVaultError::Unauthorized("could not validate credentials".into()))?;
        if !user.is_active {
            return Err(DocVaultError::InvalidInput("inactive user".into()));
        }
        Ok(user)
    }

    /// Assemble the full document response: head + current version + tags.
    async fn document_response(&self, document_id: Uuid) -> Result<DocumentResponse> {
        let head = self
            .documents
            .get_head(document_id)
            .await?
            .ok_or_else(|| DocVaultError::NotFound(format!("document {document_id} not found")))?;
        let versions = self.documents.list_versions(document_id).await?;
        let current_version = versions.iter().find(|v| v.is_current).map(summarize);
        let tags = self.tags.names_for_document(document_id).await?;
        Ok(DocumentResponse {
            document_id: head.document_id,
            title: head.title,
            description: head.description,
            created_by: head.created_by,
            creator_name: head.creator_name,
            department_name: head.department_name,
            created_at: head.created_at,
            current_version,
            tags,
        })
    }

    /// Get-or-create every non-empty name, returning tag ids in input order.
    async fn resolve_tag_ids(&self, names: &[String]) -> Result<Vec<Uuid>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            ids.push(self.tags.get_or_create(name).await?.tag_id);
        }
        Ok(ids)
    }
}

fn summarize(v: &VersionDetails) -> VersionSummary {
    VersionSummary {
        version_id: v.version_id,
        version_number: v.version_number,
        file_name: v.file_name.clone(),
        file_type: v.file_type.clone(),
        file_size: v.file_size,
        uploaded_at: v.uploaded_at,
        is_current: v.is_current,
    }
}

#[async_trait]
impl DocVaultService for DocVaultServiceImpl {
    async fn register(&self, req: RegisterRequest) -> Result<UserDetails> {
        if !req.email.contains('@') {
            return Err(DocVaultError::InvalidInput("invalid email address".into()));
        }
        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(DocVaultError::InvalidInput("email already registered".into()));
        }
        if !self.directory.department_exists(req.department_id).await? {
            return Err(DocVaultError::InvalidInput("invalid department".into()));
        }
        if !self.directory.role_exists(req.role_id).await? {
            return Err(DocVaultError::InvalidInput("invalid role".into()));
        }

        let password_hash = auth::hash_password(&req.password, self.bcrypt_cost)?;
        let user = self
            .users
            .create_user(NewUser {
                user_id: Uuid::new_v4(),
                email: req.email,
                password_hash,
                first_name: req.first_name,
                last_name: req.last_name,
                department_id: req.department_id,
                role_id: req.role_id,
            })
            .await?;

        self.users
            .get_details(&user.email)
            .await?
            .ok_or_else(|| DocVaultError::Internal(anyhow::anyhow!("registered user vanished")))
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserDetails> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| DocVaultError::Unauthorized("incorrect email or password".into()))?;

        if !auth::verify_password(password, &user.password_hash)? {
            return Err(DocVaultError::Unauthorized(
                "incorrect email or password".into(),
            ));
        }
        if !user.is_active {
            return Err(DocVaultError::InvalidInput(
                "user account is deactivated".into(),
            ));
        }

        self.users
            .get_details(email)
            .await?
            .ok_or_else(|| DocVaultError::Internal(anyhow::anyhow!("authenticated user vanished")))
    }

    async fn current_user(&self, principal: &Principal) -> Result<UserDetails> {
        self.require_active_user(principal).await
    }

    async fn create_document(
        &self,
        principal: &Principal,
        input: CreateDocumentInput,
    ) -> Result<DocumentResponse> {
        let actor = self.require_active_user(principal).await?;
        let document_id = Uuid::new_v4();

        self.documents
            .create_document(NewDocument {
                document_id,
                title: input.title,
                description: input.description,
                created_by: actor.user_id,
            })
            .await?;

        let stored = self
            .files
            .save(document_id, &input.file.file_name, &input.file.bytes)
            .await?;

        self.documents
            .insert_version(NewVersion {
                version_id: Uuid::new_v4(),
                document_id,
                version_number: 1,
                file_name: input.file.file_name,
                file_path: stored.path,
                file_size: stored.size,
                file_type: input.file.content_type,
                checksum: stored.checksum,
                uploaded_by: actor.user_id,
                is_current: true,
            })
            .await?;

        if !input.tags.is_empty() {
            let tag_ids = self.resolve_tag_ids(&input.tags).await?;
            self.tags
                .associate(document_id, &tag_ids, actor.user_id)
                .await?;
        }

        self.audit
            .append(AuditEntry {
                document_id,
                user_id: actor.user_id,
                action: AuditAction::Create,
                details: None,
            })
            .await?;

        self.document_response(document_id).await
    }

    async fn list_documents(&self, query: ListDocumentsQuery) -> Result<Vec<DocumentResponse>> {
        let rows = self.documents.list_with_details(&query).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let tags = self.tags.names_for_document(row.head.document_id).await?;
            out.push(DocumentResponse {
                document_id: row.head.document_id,
                title: row.head.title,
                description: row.head.description,
                created_by: row.head.created_by,
                creator_name: row.head.creator_name,
                department_name: row.head.department_name,
                created_at: row.head.created_at,
                current_version: row.current_version,
                tags,
            });
        }
        Ok(out)
    }

    async fn get_document(&self, document_id: Uuid) -> Result<DocumentResponse> {
        self.document_response(document_id).await
    }

    async fn update_document(
        &self,
        principal: &Principal,
        document_id: Uuid,
        input: UpdateDocumentInput,
    ) -> Result<DocumentResponse> {
        let actor = self.require_active_user(principal).await?;

        self.documents
            .get_head(document_id)
            .await?
            .ok_or_else(|| DocVaultError::NotFound(format!("document {document_id} not found")))?;

        let updated = self
            .documents
            .update_document(document_id, &input.title, input.description.as_deref())
            .await?;
        if !updated {
            return Err(DocVaultError::InvalidInput(
                "failed to update document".into(),
            ));
        }

        if let Some(file) = input.file {
            let stored = self
                .files
                .save(document_id, &file.file_name, &file.bytes)
                .await?;

            let versions = self.documents.list_versions(document_id).await?;
            let next_number = versions.iter().map(|v| v.version_number).max().unwrap_or(0) + 1;
            let version_id = Uuid::new_v4();

            // Inserted non-current, then promoted through the consistency
            // port so the clear-all/set-one sequence runs in one transaction.
            self.documents
                .insert_version(NewVersion {
                    version_id,
                    document_id,
                    version_number: next_number,
                    file_name: file.file_name,
                    file_path: stored.path,
                    file_size: stored.size,
                    file_type: file.content_type,
                    checksum: stored.checksum,
                    uploaded_by: actor.user_id,
                    is_current: false,
                })
                .await?;

            let promoted = self
                .consistency
                .set_current_version(document_id, version_id)
                .await?;
            if !promoted {
                tracing::warn!(%document_id, %version_id, "freshly inserted version failed promotion");
            }
            self.consistency
                .ensure_single_current_version(document_id)
                .await?;
        }

        if !input.tags.is_empty() {
            let tag_ids = self.resolve_tag_ids(&input.tags).await?;
            self.tags
                .associate(document_id, &tag_ids, actor.user_id)
                .await?;
            self.tags.dissociate_absent(document_id, &tag_ids).await?;
        }

        self.audit
            .append(AuditEntry {
                document_id,
                user_id: actor.user_id,
                action: AuditAction::Update,
                details: None,
            })
            .await?;

        self.document_response(document_id).await
    }

    async fn delete_document(&self, principal: &Principal, document_id: Uuid) -> Result<()> {
        self.require_active_user(principal).await?;

        self.documents
            .get_head(document_id)
            .await?
            .ok_or_else(|| DocVaultError::NotFound(format!("document {document_id} not found")))?;

        // Capture file paths before the rows go away.
        let versions = self.documents.list_versions(document_id).await?;

        let deleted = self.documents.delete_document(document_id).await?;
        if !deleted {
            return Err(DocVaultError::NotFound(format!(
                "document {document_id} not found"
            )));
        }

        // DB cleanup succeeded; file removal is best-effort. A failure here
        // orphans a file, never a row.
        for version in versions {
            if let Err(e) = self.files.remove(&version.file_path).await {
                tracing::warn!(path = %version.file_path, error = %e, "failed to remove version file");
            }
        }

        Ok(())
    }

    async fn list_versions(&self, document_id: Uuid) -> Result<Vec<VersionDetails>> {
        self.documents
            .get_head(document_id)
            .await?
            .ok_or_else(|| DocVaultError::NotFound(format!("document {document_id} not found")))?;
        self.documents.list_versions(document_id).await
    }

    async fn set_current_version(&self, document_id: Uuid, version_id: Uuid) -> Result<()> {
        self.documents
            .get_head(document_id)
            .await?
            .ok_or_else(|| DocVaultError::NotFound(format!("document {document_id} not found")))?;

        let promoted = self
            .consistency
            .set_current_version(document_id, version_id)
            .await?;
        if !promoted {
            return Err(DocVaultError::InvalidInput(
                "failed to set current version".into(),
            ));
        }
        Ok(())
    }

    async fn download(
        &self,
        principal: &Principal,
        document_id: Uuid,
        version_id: Option<Uuid>,
    ) -> Result<DownloadPayload> {
        let actor = self.require_active_user(principal).await?;

        let target = self
            .documents
            .download_target(document_id, version_id)
            .await?
            .ok_or_else(|| match version_id {
                Some(v) => DocVaultError::NotFound(format!("document version {v} not found")),
                None => DocVaultError::NotFound(format!("document {document_id} not found")),
            })?;

        let bytes = self
            .files
            .read(&target.file_path)
            .await?
            .ok_or_else(|| DocVaultError::NotFound("file not found on server".into()))?;

        self.audit
            .append(AuditEntry {
                document_id,
                user_id: actor.user_id,
                action: AuditAction::Download,
                details: Some(format!("version_id={}", target.version_id)),
            })
            .await?;

        Ok(DownloadPayload {
            file_name: target.file_name,
            content_type: target.file_type,
            bytes,
        })
    }

    async fn add_tags(
        &self,
        principal: &Principal,
        document_id: Uuid,
        names: Vec<String>,
    ) -> Result<Vec<String>> {
        let actor = self.require_active_user(principal).await?;

        self.documents
            .get_head(document_id)
            .await?
            .ok_or_else(|| DocVaultError::NotFound(format!("document {document_id} not found")))?;

        let tag_ids = self.resolve_tag_ids(&names).await?;
        if !tag_ids.is_empty() {
            self.tags
                .associate(document_id, &tag_ids, actor.user_id)
                .await?;
        }
        self.tags.names_for_document(document_id).await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.tags.list_tags().await
    }

    async fn list_departments(&self) -> Result<Vec<Department>> {
        self.directory.list_departments().await
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.directory.list_roles().await
    }

    async fn repair_current_versions(&self) -> Result<u32> {
        self.consistency.cleanup_current_versions().await
    }
}

// ── Tests ─────────────────────────────────────────────────────
