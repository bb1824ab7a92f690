//! Local filesystem blob storage.
//!
//! Layout: `{root}/{document_id}/{random_uuid}{ext}`. The randomised name
//! keeps concurrent uploads of the same filename from colliding; the
//! original name lives in the version row, not on disk.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use uuid::Uuid;

use docvault_core::{
    error::DocVaultError,
    ports::{FileStore, Result},
    types::StoredFile,
};

pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(
        &self,
        document_id: Uuid,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile> {
        let dir = self.root.join(document_id.to_string());
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| anyhow!("creating {dir:?}: {e}"))?;

        let ext = Path::new(original_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let path = dir.join(format!("{}{}", Uuid::new_v4(), ext));

        fs::write(&path, bytes)
            .await
            .map_err(|e| anyhow!("writing {path:?}: {e}"))?;

        Ok(StoredFile {
            path: path.to_string_lossy().into_owned(),
            size: bytes.len() as i64,
            checksum: hex::encode(Sha256::digest(bytes)),
        })
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DocVaultError::Internal(anyhow!("reading {path}: {e}"))),
        }
    }

    async fn remove(&self, path: &str) -> Result<()> {
        fs::remove_file(path)
            .await
            .map_err(|e| DocVaultError::Internal(anyhow!("removing {path}: {e}")))
    }
}
