//! HTTP-level integration tests for the document repository server.
//!
//! These tests prove the deployed HTTP contract: JWT authentication,
//! registration/login, the document upload/versioning flow, and the
//! directory endpoints.
//!
//! Requires a running PostgreSQL database with migrations applied.
//! Run with: DATABASE_URL="postgresql:///docvault" cargo test -p docvault_server --test http_integration -- --ignored --nocapture

use std::sync::Arc;

use axum::body::Body;
use docvault_core::service::{DocVaultService, DocVaultServiceImpl};
use docvault_postgres::PgStores;
use docvault_server::config::UploadPolicy;
use docvault_server::middleware::jwt::JwtConfig;
use docvault_server::router::build_router;
use docvault_server::storage::LocalFileStore;
use http_body_util::BodyExt;
use hyper::{header, Request, StatusCode};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_JWT_SECRET: &[u8] = b"test-secret-for-integration-tests";
const BOUNDARY: &str = "docvault-test-boundary";

// ── Test app builder ───────────────────────────────────────────

async fn build_test_app() -> axum::Router {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to test database");

    let stores = PgStores::new(pool.clone());
    let upload_dir = std::env::temp_dir().join("docvault_test_uploads");
    let files = Arc::new(LocalFileStore::new(upload_dir));

    let service: Arc<dyn DocVaultService> = Arc::new(
        DocVaultServiceImpl::new(
            Arc::new(stores.users),
            Arc::new(stores.directory),
            Arc::new(stores.documents),
            Arc::new(stores.consistency),
            Arc::new(stores.tags),
            Arc::new(stores.audit),
            files,
        )
        // bcrypt's minimum cost keeps the suite fast.
        .with_bcrypt_cost(4),
    );

    let jwt_config = JwtConfig::from_secret(TEST_JWT_SECRET);
    build_router(service, pool, jwt_config, UploadPolicy::default())
}

// ── Request helpers ────────────────────────────────────────────

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(
        |_| serde_json::json!({ "raw": String::from_utf8_lossy(&bytes).to_string() }),
    )
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Hand-rolled multipart body with title/tags/file fields.
fn multipart_body(title: &str, tags: &str, file_name: &str, contents: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in [("title", title), ("tags", tags)] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(method: &str, uri: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

/// Register a fresh user against the seeded directory and return its token.
/// Directory ids come straight from the database since the listing
/// endpoints sit behind auth.
async fn register_user(app: &axum::Router) -> String {
    let database_url = std::env::var("DATABASE_URL").unwrap();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .unwrap();
    let (department_id,): (Uuid,) =
        sqlx::query_as("SELECT department_id FROM departments ORDER BY name LIMIT 1")
            .fetch_one(&pool)
            .await
            .expect("seeded department missing");
    let (role_id,): (Uuid,) = sqlx::query_as("SELECT role_id FROM roles ORDER BY name LIMIT 1")
        .fetch_one(&pool)
        .await
        .expect("seeded role missing");

    let email = format!("{}@example.com", Uuid::new_v4().simple());
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({
                "email": email,
                "password": "s3cret-pw",
                "first_name": "Test",
                "last_name": "User",
                "department_id": department_id,
                "role_id": role_id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    body["access_token"].as_str().unwrap().to_string()
}

// ── Tests ───────────────────────────────────────────────────────

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_health_no_auth() {
    let app = build_test_app().await;
    let resp = app
        .oneshot(bare_request("GET", "/health", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_db_health() {
    let app = build_test_app().await;
    let resp = app
        .oneshot(bare_request("GET", "/api/db-health", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_documents_require_auth() {
    let app = build_test_app().await;

    let resp = app
        .clone()
        .oneshot(bare_request("GET", "/api/documents", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(bare_request("GET", "/api/documents", Some("garbage")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_register_login_me_flow() {
    let app = build_test_app().await;
    let token = register_user(&app).await;

    // Token resolves to a user.
    let resp = app
        .clone()
        .oneshot(bare_request("GET", "/api/auth/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let me = body_json(resp).await;
    let email = me["email"].as_str().unwrap().to_string();
    assert!(me["department_name"].is_string());

    // Duplicate registration is rejected without side effects.
    let database_url = std::env::var("DATABASE_URL").unwrap();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .unwrap();
    let (department_id,): (Uuid,) =
        sqlx::query_as("SELECT department_id FROM departments ORDER BY name LIMIT 1")
            .fetch_one(&pool)
            .await
            .unwrap();
    let (role_id,): (Uuid,) = sqlx::query_as("SELECT role_id FROM roles ORDER BY name LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({
                "email": email,
                "password": "another-pw",
                "first_name": "Dup",
                "last_name": "User",
                "department_id": department_id,
                "role_id": role_id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Wrong password fails with 401.
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "email": email, "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Correct password succeeds.
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "email": email, "password": "s3cret-pw" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["email"], email.as_str());
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_document_lifecycle() {
    let app = build_test_app().await;
    let token = register_user(&app).await;

    // Create with tags.
    let resp = app
        .clone()
        .oneshot(multipart_request(
            "POST",
            "/api/documents",
            &token,
            multipart_body("Lifecycle Doc", "alpha, beta", "doc.txt", b"version one"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let doc = body_json(resp).await;
    let document_id = doc["document_id"].as_str().unwrap().to_string();
    assert_eq!(doc["current_version"]["version_number"], 1);
    assert_eq!(doc["tags"], serde_json::json!(["alpha", "beta"]));
    let v1 = doc["current_version"]["version_id"]
        .as_str()
        .unwrap()
        .to_string();

    // Update with a new file: version 2 becomes current.
    let resp = app
        .clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/documents/{document_id}"),
            &token,
            multipart_body("Lifecycle Doc v2", "alpha, beta", "doc.txt", b"version two"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let doc = body_json(resp).await;
    assert_eq!(doc["title"], "Lifecycle Doc v2");
    assert_eq!(doc["current_version"]["version_number"], 2);

    // Version history shows both, newest first.
    let resp = app
        .clone()
        .oneshot(bare_request(
            "GET",
            &format!("/api/documents/{document_id}/versions"),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let versions = body_json(resp).await;
    assert_eq!(versions.as_array().unwrap().len(), 2);
    assert_eq!(versions[0]["version_number"], 2);

    // Roll back to version 1.
    let resp = app
        .clone()
        .oneshot(bare_request(
            "PUT",
            &format!("/api/documents/{document_id}/versions/{v1}/set-current"),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // A foreign version id is rejected and changes nothing.
    let resp = app
        .clone()
        .oneshot(bare_request(
            "PUT",
            &format!(
                "/api/documents/{document_id}/versions/{}/set-current",
                Uuid::new_v4()
            ),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Download returns version 1 bytes after the rollback.
    let resp = app
        .clone()
        .oneshot(bare_request(
            "GET",
            &format!("/api/documents/{document_id}/download"),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("attachment"));
    assert_eq!(body_bytes(resp).await, b"version one");

    // Add a tag through the dedicated endpoint.
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/documents/{document_id}/tags"),
            Some(&token),
            serde_json::json!({ "tags": ["gamma"] }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let tags = body_json(resp).await;
    assert!(tags.as_array().unwrap().iter().any(|t| t == "gamma"));

    // Delete, then the document is gone.
    let resp = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/api/documents/{document_id}"),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(bare_request(
            "GET",
            &format!("/api/documents/{document_id}"),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_create_without_file_is_rejected() {
    let app = build_test_app().await;
    let token = register_user(&app).await;

    let mut body = Vec::new();
    body.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nNo File\r\n--{BOUNDARY}--\r\n")
            .as_bytes(),
    );
    let resp = app
        .oneshot(multipart_request("POST", "/api/documents", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_directory_listings() {
    let app = build_test_app().await;
    let token = register_user(&app).await;

    for uri in ["/api/departments", "/api/roles", "/api/tags"] {
        let resp = app
            .clone()
            .oneshot(bare_request("GET", uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{uri} failed");
        assert!(body_json(resp).await.is_array(), "{uri} not an array");
    }
}
