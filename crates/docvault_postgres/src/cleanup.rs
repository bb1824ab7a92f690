//! PostgreSQL implementation of the version-consistency repair store.
//!
//! The single-current-version invariant is not enforced by a DB constraint;
//! this adapter owns the promotion transaction and the repair routines that
//! restore the invariant after the fact.

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use docvault_core::ports::{Result, VersionConsistencyStore};

pub struct PgVersionConsistency {
    pool: PgPool,
}

impl PgVersionConsistency {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionConsistencyStore for PgVersionConsistency {
    async fn set_current_version(&self, document_id: Uuid, version_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        sqlx::query(
            r#"
            UPDATE document_versions
            SET is_current = false
            WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        // The document_id predicate is what rejects versions belonging to a
        // different document: zero rows affected means the target is foreign
        // and the whole transaction is rolled back.
        let result = sqlx::query(
            r#"
            UPDATE document_versions
            SET is_current = true
            WHERE version_id = $1 AND document_id = $2
            "#,
        )
        .bind(version_id)
        .bind(document_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| anyhow!(e))?;
            return Ok(false);
        }

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(true)
    }

    async fn ensure_single_current_version(&self, document_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        let current: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT version_id
            FROM document_versions
            WHERE document_id = $1 AND is_current = true
            ORDER BY version_number DESC
            "#,
        )
        .bind(document_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        let keep = if current.len() == 1 {
            // Already consistent.
            tx.commit().await.map_err(|e| anyhow!(e))?;
            return Ok(());
        } else if current.len() > 1 {
            Some(current[0].0)
        } else {
            // No current version: promote the highest version number, if any.
            sqlx::query_as::<_, (Uuid,)>(
                r#"
                SELECT version_id
                FROM document_versions
                WHERE document_id = $1
                ORDER BY version_number DESC
                LIMIT 1
                "#,
            )
            .bind(document_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?
            .map(|(id,)| id)
        };

        if let Some(keep) = keep {
            sqlx::query(
                r#"
                UPDATE document_versions
                SET is_current = (version_id = $2)
                WHERE document_id = $1
                "#,
            )
            .bind(document_id)
            .bind(keep)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        }

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn cleanup_current_versions(&self) -> Result<u32> {
        let duplicated: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT document_id
            FROM document_versions
            WHERE is_current = true
            GROUP BY document_id
            HAVING COUNT(*) > 1
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        for (document_id,) in &duplicated {
            tracing::debug!(%document_id, "repairing current-version invariant");
            self.ensure_single_current_version(*document_id).await?;
        }

        Ok(duplicated.len() as u32)
    }
}
