//! Database-level tests for the single-current-version invariant and the
//! delete cascade.
//!
//! Requires a PostgreSQL server that allows CREATE/DROP DATABASE.
//! Run with: ADMIN_DATABASE_URL="postgresql:///postgres" cargo test -p docvault_postgres -- --ignored --nocapture

use docvault_core::ports::{
    AuditStore, DocumentStore, NewUser, TagStore, UserStore, VersionConsistencyStore,
};
use docvault_core::types::{AuditAction, AuditEntry, NewDocument, NewVersion};
use docvault_harness::{drop_db, isolated_db, IsolatedDb};
use docvault_postgres::PgStores;
use sqlx::PgPool;
use uuid::Uuid;

async fn setup() -> (IsolatedDb, PgStores, Uuid) {
    let url = std::env::var("ADMIN_DATABASE_URL")
        .expect("ADMIN_DATABASE_URL must be set for integration tests");
    let iso = isolated_db(&url).await;
    let stores = PgStores::new(iso.pool.clone());

    let (department_id,): (Uuid,) =
        sqlx::query_as("SELECT department_id FROM departments ORDER BY name LIMIT 1")
            .fetch_one(&iso.pool)
            .await
            .expect("seeded department missing");
    let (role_id,): (Uuid,) = sqlx::query_as("SELECT role_id FROM roles ORDER BY name LIMIT 1")
        .fetch_one(&iso.pool)
        .await
        .expect("seeded role missing");

    let user = stores
        .users
        .create_user(NewUser {
            user_id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            password_hash: "irrelevant".into(),
            first_name: "Test".into(),
            last_name: "User".into(),
            department_id,
            role_id,
        })
        .await
        .expect("create_user failed");

    (iso, stores, user.user_id)
}

async fn insert_document(stores: &PgStores, created_by: Uuid) -> Uuid {
    let document_id = Uuid::new_v4();
    stores
        .documents
        .create_document(NewDocument {
            document_id,
            title: "Fixture".into(),
            description: None,
            created_by,
        })
        .await
        .expect("create_document failed");
    document_id
}

async fn insert_version(
    stores: &PgStores,
    document_id: Uuid,
    uploaded_by: Uuid,
    version_number: i32,
    is_current: bool,
) -> Uuid {
    let version_id = Uuid::new_v4();
    stores
        .documents
        .insert_version(NewVersion {
            version_id,
            document_id,
            version_number,
            file_name: format!("fixture_v{version_number}.txt"),
            file_path: format!("uploads/{document_id}/v{version_number}"),
            file_size: 16,
            file_type: Some("text/plain".into()),
            checksum: "0".repeat(64),
            uploaded_by,
            is_current,
        })
        .await
        .expect("insert_version failed");
    version_id
}

/// (version_id, version_number) of every current-flagged version.
async fn current_versions(pool: &PgPool, document_id: Uuid) -> Vec<(Uuid, i32)> {
    sqlx::query_as(
        "SELECT version_id, version_number FROM document_versions \
         WHERE document_id = $1 AND is_current = true ORDER BY version_number",
    )
    .bind(document_id)
    .fetch_all(pool)
    .await
    .expect("current_versions query failed")
}

async fn count_rows(pool: &PgPool, table: &str, document_id: Uuid) -> i64 {
    sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {table} WHERE document_id = $1"
    ))
    .bind(document_id)
    .fetch_one(pool)
    .await
    .expect("count query failed")
}

// ── ensure_single_current_version ─────────────────────────────

#[tokio::test]
#[ignore] // requires ADMIN_DATABASE_URL
async fn ensure_single_keeps_highest_of_many_current() {
    let (iso, stores, user_id) = setup().await;
    let doc = insert_document(&stores, user_id).await;
    insert_version(&stores, doc, user_id, 1, true).await;
    insert_version(&stores, doc, user_id, 2, true).await;
    let v3 = insert_version(&stores, doc, user_id, 3, true).await;

    stores
        .consistency
        .ensure_single_current_version(doc)
        .await
        .unwrap();

    let current = current_versions(&iso.pool, doc).await;
    assert_eq!(current, vec![(v3, 3)]);

    drop_db(iso).await;
}

#[tokio::test]
#[ignore] // requires ADMIN_DATABASE_URL
async fn ensure_single_promotes_when_none_current() {
    let (iso, stores, user_id) = setup().await;
    let doc = insert_document(&stores, user_id).await;
    insert_version(&stores, doc, user_id, 1, false).await;
    let v2 = insert_version(&stores, doc, user_id, 2, false).await;

    stores
        .consistency
        .ensure_single_current_version(doc)
        .await
        .unwrap();

    assert_eq!(current_versions(&iso.pool, doc).await, vec![(v2, 2)]);

    drop_db(iso).await;
}

#[tokio::test]
#[ignore] // requires ADMIN_DATABASE_URL
async fn ensure_single_is_noop_without_versions() {
    let (iso, stores, user_id) = setup().await;
    let doc = insert_document(&stores, user_id).await;

    stores
        .consistency
        .ensure_single_current_version(doc)
        .await
        .unwrap();

    assert!(current_versions(&iso.pool, doc).await.is_empty());

    drop_db(iso).await;
}

#[tokio::test]
#[ignore] // requires ADMIN_DATABASE_URL
async fn ensure_single_is_idempotent() {
    let (iso, stores, user_id) = setup().await;
    let doc = insert_document(&stores, user_id).await;
    insert_version(&stores, doc, user_id, 1, true).await;
    let v2 = insert_version(&stores, doc, user_id, 2, true).await;

    for _ in 0..3 {
        stores
            .consistency
            .ensure_single_current_version(doc)
            .await
            .unwrap();
        assert_eq!(current_versions(&iso.pool, doc).await, vec![(v2, 2)]);
    }

    drop_db(iso).await;
}

// ── set_current_version ───────────────────────────────────────

#[tokio::test]
#[ignore] // requires ADMIN_DATABASE_URL
async fn set_current_promotes_and_demotes_in_one_step() {
    let (iso, stores, user_id) = setup().await;
    let doc = insert_document(&stores, user_id).await;
    let v1 = insert_version(&stores, doc, user_id, 1, true).await;
    insert_version(&stores, doc, user_id, 2, true).await;

    let promoted = stores
        .consistency
        .set_current_version(doc, v1)
        .await
        .unwrap();
    assert!(promoted);
    assert_eq!(current_versions(&iso.pool, doc).await, vec![(v1, 1)]);

    drop_db(iso).await;
}

#[tokio::test]
#[ignore] // requires ADMIN_DATABASE_URL
async fn set_current_rejects_foreign_version_and_leaves_state() {
    let (iso, stores, user_id) = setup().await;
    let doc_a = insert_document(&stores, user_id).await;
    let doc_b = insert_document(&stores, user_id).await;
    let v_a = insert_version(&stores, doc_a, user_id, 1, true).await;
    let v_b = insert_version(&stores, doc_b, user_id, 1, true).await;

    let promoted = stores
        .consistency
        .set_current_version(doc_a, v_b)
        .await
        .unwrap();
    assert!(!promoted);

    // Both documents keep their own current version.
    assert_eq!(current_versions(&iso.pool, doc_a).await, vec![(v_a, 1)]);
    assert_eq!(current_versions(&iso.pool, doc_b).await, vec![(v_b, 1)]);

    drop_db(iso).await;
}

// ── cleanup_current_versions ──────────────────────────────────

#[tokio::test]
#[ignore] // requires ADMIN_DATABASE_URL
async fn cleanup_repairs_every_duplicated_document() {
    let (iso, stores, user_id) = setup().await;

    let broken_a = insert_document(&stores, user_id).await;
    insert_version(&stores, broken_a, user_id, 1, true).await;
    let a2 = insert_version(&stores, broken_a, user_id, 2, true).await;

    let broken_b = insert_document(&stores, user_id).await;
    insert_version(&stores, broken_b, user_id, 1, true).await;
    let b2 = insert_version(&stores, broken_b, user_id, 2, true).await;

    let fine = insert_document(&stores, user_id).await;
    let f1 = insert_version(&stores, fine, user_id, 1, true).await;

    let repaired = stores.consistency.cleanup_current_versions().await.unwrap();
    assert_eq!(repaired, 2);

    assert_eq!(current_versions(&iso.pool, broken_a).await, vec![(a2, 2)]);
    assert_eq!(current_versions(&iso.pool, broken_b).await, vec![(b2, 2)]);
    assert_eq!(current_versions(&iso.pool, fine).await, vec![(f1, 1)]);

    // Second pass finds nothing to repair.
    assert_eq!(
        stores.consistency.cleanup_current_versions().await.unwrap(),
        0
    );

    drop_db(iso).await;
}

// ── delete cascade ────────────────────────────────────────────

#[tokio::test]
#[ignore] // requires ADMIN_DATABASE_URL
async fn delete_document_removes_all_referencing_rows() {
    let (iso, stores, user_id) = setup().await;
    let doc = insert_document(&stores, user_id).await;
    insert_version(&stores, doc, user_id, 1, true).await;
    insert_version(&stores, doc, user_id, 2, false).await;

    let tag = stores.tags.get_or_create("cascade-test").await.unwrap();
    stores
        .tags
        .associate(doc, &[tag.tag_id], user_id)
        .await
        .unwrap();

    sqlx::query(
        "INSERT INTO document_permissions (document_id, user_id, permission_type, granted_by) \
         VALUES ($1, $2, 'read', $2)",
    )
    .bind(doc)
    .bind(user_id)
    .execute(&iso.pool)
    .await
    .unwrap();

    stores
        .audit
        .append(AuditEntry {
            document_id: doc,
            user_id,
            action: AuditAction::Create,
            details: None,
        })
        .await
        .unwrap();

    let deleted = stores.documents.delete_document(doc).await.unwrap();
    assert!(deleted);

    for table in [
        "document_versions",
        "document_tags",
        "document_permissions",
        "document_audit",
        "documents",
    ] {
        assert_eq!(count_rows(&iso.pool, table, doc).await, 0, "{table} not empty");
    }

    // The tag itself survives; only the association goes.
    assert!(stores
        .tags
        .list_tags()
        .await
        .unwrap()
        .iter()
        .any(|t| t.name == "cascade-test"));

    drop_db(iso).await;
}

#[tokio::test]
#[ignore] // requires ADMIN_DATABASE_URL
async fn delete_missing_document_reports_false() {
    let (iso, stores, _user_id) = setup().await;

    let deleted = stores
        .documents
        .delete_document(Uuid::new_v4())
        .await
        .unwrap();
    assert!(!deleted);

    drop_db(iso).await;
}
