//! Isolated test database helpers.
//!
//! Each harness run creates a temporary database via CREATE DATABASE, runs
//! the repository migrations into it, and drops it on cleanup.

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::path::Path;
use std::str::FromStr;

/// Holds the test database pool, name, and admin connection for cleanup.
pub struct IsolatedDb {
    /// Pool connected to the isolated test database.
    pub pool: PgPool,
    /// Name of the temporary database.
    pub dbname: String,
    /// Admin pool connected to the control database (for CREATE/DROP).
    admin: PgPool,
}

/// Create an isolated test database, run migrations, and return handles.
///
/// `admin_url` should point to a database that allows CREATE/DROP DATABASE
/// (typically `postgresql:///postgres`).
pub async fn isolated_db(admin_url: &str) -> IsolatedDb {
    let dbname = format!("docvault_test_{}", uuid::Uuid::new_v4().simple());

    let admin_opts = PgConnectOptions::from_str(admin_url).expect("admin_url parse failed");
    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(admin_opts)
        .await
        .expect("admin connect failed");

    sqlx::query(&format!(r#"CREATE DATABASE "{}""#, dbname))
        .execute(&admin)
        .await
        .expect("CREATE DATABASE failed");

    let test_opts = PgConnectOptions::from_str(admin_url)
        .expect("admin_url parse failed")
        .database(&dbname);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(test_opts)
        .await
        .expect("test db connect failed");

    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    run_migrations(&pool, &migrations_dir).await;

    IsolatedDb {
        pool,
        dbname,
        admin,
    }
}

/// Run every `.sql` migration file in sorted order.
async fn run_migrations(pool: &PgPool, dir: &Path) {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("cannot read migrations dir {:?}: {}", dir, e))
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".sql") {
                Some((name, entry.path()))
            } else {
                None
            }
        })
        .collect();

    files.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, path) in &files {
        let sql = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("cannot read migration {}: {}", name, e));
        sqlx::raw_sql(&sql)
            .execute(pool)
            .await
            .unwrap_or_else(|e| panic!("migration {} failed: {}", name, e));
    }
}

/// Drop the isolated test database. Call this in cleanup, even on failure.
pub async fn drop_db(iso: IsolatedDb) {
    // Close the test pool first so connections don't block the DROP.
    iso.pool.close().await;

    // Postgres 13+ supports FORCE to drop even if connections linger.
    let drop_sql = format!(r#"DROP DATABASE IF EXISTS "{}" WITH (FORCE)"#, iso.dbname);
    let _ = sqlx::query(&drop_sql).execute(&iso.admin).await;

    iso.admin.close().await;
}
