//! docvault_postgres — Postgres implementations of the docvault_core ports.

pub mod cleanup;
pub mod store;

pub use cleanup::PgVersionConsistency;
pub use store::{PgAuditStore, PgDirectoryStore, PgDocumentStore, PgTagStore, PgUserStore};

use sqlx::PgPool;

/// Bundle of every Postgres-backed store, built from one pool.
/// Constructed once at startup and handed to the service as `Arc<dyn Port>`s.
pub struct PgStores {
    pub users: PgUserStore,
    pub directory: PgDirectoryStore,
    pub documents: PgDocumentStore,
    pub consistency: PgVersionConsistency,
    pub tags: PgTagStore,
    pub audit: PgAuditStore,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: PgUserStore::new(pool.clone()),
            directory: PgDirectoryStore::new(pool.clone()),
            documents: PgDocumentStore::new(pool.clone()),
            consistency: PgVersionConsistency::new(pool.clone()),
            tags: PgTagStore::new(pool.clone()),
            audit: PgAuditStore::new(pool),
        }
    }
}
