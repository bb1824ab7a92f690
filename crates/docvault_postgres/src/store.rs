//! Postgres implementations of the docvault_core port traits.
//!
//! Each adapter is a newtype wrapping PgPool. All SQL is runtime-checked
//! (sqlx::query, not sqlx::query!) to avoid a compile-time DB requirement.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use docvault_core::ports::{
    AuditStore, DirectoryStore, DocumentStore, NewUser, Result, TagStore, UserStore,
};
use docvault_core::proto::ListDocumentsQuery;
use docvault_core::types::*;

/// Listing caps mirror the HTTP defaults.
const DEFAULT_LIST_LIMIT: i64 = 100;

// ── PgUserStore ───────────────────────────────────────────────

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type UserTuple = (
    Uuid,
    String,
    String,
    String,
    String,
    Uuid,
    Uuid,
    bool,
    DateTime<Utc>,
);

fn user_row(t: UserTuple) -> UserRow {
    UserRow {
        user_id: t.0,
        email: t.1,
        password_hash: t.2,
        first_name: t.3,
        last_name: t.4,
        department_id: t.5,
        role_id: t.6,
        is_active: t.7,
        created_at: t.8,
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, input: NewUser) -> Result<UserRow> {
        let row = sqlx::query_as::<_, UserTuple>(
            r#"
            INSERT INTO users (
                user_id, email, password_hash, first_name, last_name,
                department_id, role_id, is_active
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, true)
            RETURNING user_id, email, password_hash, first_name, last_name,
                      department_id, role_id, is_active, created_at
            "#,
        )
        .bind(input.user_id)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.department_id)
        .bind(input.role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(user_row(row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserTuple>(
            r#"
            SELECT user_id, email, password_hash, first_name, last_name,
                   department_id, role_id, is_active, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(row.map(user_row))
    }

    async fn get_details(&self, email: &str) -> Result<Option<UserDetails>> {
        let row = sqlx::query_as::<
            _,
            (
                Uuid,
                String,
                String,
                String,
                bool,
                DateTime<Utc>,
                String,
                String,
            ),
        >(
            r#"
            SELECT u.user_id, u.email, u.first_name, u.last_name,
                   u.is_active, u.created_at,
                   d.name AS department_name, r.name AS role_name
            FROM users u
            JOIN departments d ON u.department_id = d.department_id
            JOIN roles r ON u.role_id = r.role_id
            WHERE u.email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(row.map(
            |(user_id, email, first_name, last_name, is_active, created_at, department_name, role_name)| {
                UserDetails {
                    user_id,
                    email,
                    first_name,
                    last_name,
                    department_name,
                    role_name,
                    is_active,
                    created_at,
                }
            },
        ))
    }
}

// ── PgDirectoryStore ──────────────────────────────────────────

pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn list_departments(&self) -> Result<Vec<Department>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String, Option<String>)>(
            r#"
            SELECT department_id, name, code, description
            FROM departments
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(rows
            .into_iter()
            .map(|(department_id, name, code, description)| Department {
                department_id,
                name,
                code,
                description,
            })
            .collect())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let rows = sqlx::query_as::<_, (Uuid, String, Option<String>)>(
            r#"
            SELECT role_id, name, description
            FROM roles
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(rows
            .into_iter()
            .map(|(role_id, name, description)| Role {
                role_id,
                name,
                description,
            })
            .collect())
    }

    async fn department_exists(&self, department_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM departments WHERE department_id = $1)"#,
        )
        .bind(department_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(exists)
    }

    async fn role_exists(&self, role_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM roles WHERE role_id = $1)"#,
        )
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(exists)
    }
}

// ── PgDocumentStore ───────────────────────────────────────────

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create_document(&self, input: NewDocument) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (document_id, title, description, created_by)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(input.document_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.created_by)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn update_document(
        &self,
        document_id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET title = $2, description = $3, updated_at = now()
            WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .bind(title)
        .bind(description)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_document(&self, document_id: Uuid) -> Result<bool> {
        // Referential cleanup in dependency order, one transaction.
        // The current_version_id pointer is cleared before the version rows
        // go so a future FK on it cannot block the delete.
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        sqlx::query(r#"DELETE FROM document_audit WHERE document_id = $1"#)
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;

        sqlx::query(r#"DELETE FROM document_permissions WHERE document_id = $1"#)
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;

        sqlx::query(r#"DELETE FROM document_tags WHERE document_id = $1"#)
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;

        sqlx::query(r#"UPDATE documents SET current_version_id = NULL WHERE document_id = $1"#)
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;

        sqlx::query(r#"DELETE FROM document_versions WHERE document_id = $1"#)
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;

        let result = sqlx::query(r#"DELETE FROM documents WHERE document_id = $1"#)
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_head(&self, document_id: Uuid) -> Result<Option<DocumentHead>> {
        let row = sqlx::query_as::<
            _,
            (
                Uuid,
                String,
                Option<String>,
                Uuid,
                DateTime<Utc>,
                String,
                String,
            ),
        >(
            r#"
            SELECT d.document_id, d.title, d.description, d.created_by, d.created_at,
                   u.first_name || ' ' || u.last_name AS creator_name,
                   dept.name AS department_name
            FROM documents d
            JOIN users u ON d.created_by = u.user_id
            JOIN departments dept ON u.department_id = dept.department_id
            WHERE d.document_id = $1
            "#,
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(row.map(
            |(document_id, title, description, created_by, created_at, creator_name, department_name)| {
                DocumentHead {
                    document_id,
                    title,
                    description,
                    created_by,
                    created_at,
                    creator_name,
                    department_name,
                }
            },
        ))
    }

    async fn list_with_details(&self, query: &ListDocumentsQuery) -> Result<Vec<DocumentListRow>> {
        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        let offset = query.offset.unwrap_or(0);

        let rows = sqlx::query_as::<
            _,
            (
                Uuid,
                String,
                Option<String>,
                Uuid,
                DateTime<Utc>,
                String,
                String,
                Option<Uuid>,
                Option<i32>,
                Option<String>,
                Option<String>,
                Option<i64>,
                Option<DateTime<Utc>>,
                Option<bool>,
            ),
        >(
            r#"
            SELECT d.document_id, d.title, d.description, d.created_by, d.created_at,
                   u.first_name || ' ' || u.last_name AS creator_name,
                   dept.name AS department_name,
                   dv.version_id, dv.version_number, dv.file_name, dv.file_type,
                   dv.file_size, dv.uploaded_at, dv.is_current
            FROM documents d
            JOIN users u ON d.created_by = u.user_id
            JOIN departments dept ON u.department_id = dept.department_id
            LEFT JOIN document_versions dv
                   ON d.document_id = dv.document_id AND dv.is_current = true
            WHERE ($1::text IS NULL
                   OR d.title ILIKE '%' || $1 || '%'
                   OR d.description ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL
                   OR EXISTS (
                        SELECT 1
                        FROM document_tags dt
                        JOIN tags t ON dt.tag_id = t.tag_id
                        WHERE dt.document_id = d.document_id AND t.name = $2))
            ORDER BY d.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&query.search)
        .bind(&query.tag)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let current_version = match (row.7, row.8, row.9, row.11, row.12, row.13) {
                    (
                        Some(version_id),
                        Some(version_number),
                        Some(file_name),
                        Some(file_size),
                        Some(uploaded_at),
                        Some(is_current),
                    ) => Some(VersionSummary {
                        version_id,
                        version_number,
                        file_name,
                        file_type: row.10.clone(),
                        file_size,
                        uploaded_at,
                        is_current,
                    }),
                    _ => None,
                };
                DocumentListRow {
                    head: DocumentHead {
                        document_id: row.0,
                        title: row.1,
                        description: row.2,
                        created_by: row.3,
                        created_at: row.4,
                        creator_name: row.5,
                        department_name: row.6,
                    },
                    current_version,
                }
            })
            .collect())
    }

    async fn insert_version(&self, version: NewVersion) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO document_versions (
                version_id, document_id, version_number, file_name, file_path,
                file_size, file_type, checksum, uploaded_by, is_current
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(version.version_id)
        .bind(version.document_id)
        .bind(version.version_number)
        .bind(&version.file_name)
        .bind(&version.file_path)
        .bind(version.file_size)
        .bind(&version.file_type)
        .bind(&version.checksum)
        .bind(version.uploaded_by)
        .bind(version.is_current)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn list_versions(&self, document_id: Uuid) -> Result<Vec<VersionDetails>> {
        let rows = sqlx::query_as::<
            _,
            (
                Uuid,
                i32,
                String,
                Option<String>,
                i64,
                DateTime<Utc>,
                bool,
                String,
                Option<Uuid>,
                Option<String>,
            ),
        >(
            r#"
            SELECT dv.version_id, dv.version_number, dv.file_name, dv.file_type,
                   dv.file_size, dv.uploaded_at, dv.is_current, dv.file_path,
                   dv.uploaded_by,
                   u.first_name || ' ' || u.last_name AS uploader_name
            FROM document_versions dv
            LEFT JOIN users u ON dv.uploaded_by = u.user_id
            WHERE dv.document_id = $1
            ORDER BY dv.version_number DESC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    version_id,
                    version_number,
                    file_name,
                    file_type,
                    file_size,
                    uploaded_at,
                    is_current,
                    file_path,
                    uploaded_by,
                    uploader_name,
                )| VersionDetails {
                    version_id,
                    version_number,
                    file_name,
                    file_type,
                    file_size,
                    uploaded_at,
                    is_current,
                    file_path,
                    uploaded_by,
                    uploader_name: uploader_name.unwrap_or_else(|| "Unknown".into()),
                },
            )
            .collect())
    }

    async fn download_target(
        &self,
        document_id: Uuid,
        version_id: Option<Uuid>,
    ) -> Result<Option<DownloadTarget>> {
        let row = sqlx::query_as::<_, (Uuid, String, String, Option<String>)>(
            r#"
            SELECT version_id, file_name, file_path, file_type
            FROM document_versions
            WHERE document_id = $1
              AND (($2::uuid IS NULL AND is_current = true) OR version_id = $2)
            LIMIT 1
            "#,
        )
        .bind(document_id)
        .bind(version_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(row.map(|(version_id, file_name, file_path, file_type)| DownloadTarget {
            version_id,
            file_name,
            file_path,
            file_type,
        }))
    }
}

// ── PgTagStore ────────────────────────────────────────────────

pub struct PgTagStore {
    pool: PgPool,
}

impl PgTagStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagStore for PgTagStore {
    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"SELECT tag_id, name FROM tags ORDER BY name"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(rows
            .into_iter()
            .map(|(tag_id, name)| Tag { tag_id, name })
            .collect())
    }

    async fn get_or_create(&self, name: &str) -> Result<Tag> {
        // Upsert so the RETURNING row is populated on conflict too.
        let (tag_id, name) = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            INSERT INTO tags (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET updated_at = now()
            RETURNING tag_id, name
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(Tag { tag_id, name })
    }

    async fn associate(&self, document_id: Uuid, tag_ids: &[Uuid], added_by: Uuid) -> Result<()> {
        for tag_id in tag_ids {
            sqlx::query(
                r#"
                INSERT INTO document_tags (document_id, tag_id, added_by)
                VALUES ($1, $2, $3)
                ON CONFLICT (document_id, tag_id) DO NOTHING
                "#,
            )
            .bind(document_id)
            .bind(tag_id)
            .bind(added_by)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        }
        Ok(())
    }

    async fn dissociate_absent(&self, document_id: Uuid, keep: &[Uuid]) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM document_tags
            WHERE document_id = $1 AND tag_id <> ALL($2)
            "#,
        )
        .bind(document_id)
        .bind(keep)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn names_for_document(&self, document_id: Uuid) -> Result<Vec<String>> {
        let rows = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT t.name
            FROM tags t
            JOIN document_tags dt ON t.tag_id = dt.tag_id
            WHERE dt.document_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

// ── PgAuditStore ──────────────────────────────────────────────

pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn append(&self, entry: AuditEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO document_audit (document_id, user_id, action, details)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.document_id)
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(&entry.details)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }
}
