//! Filesystem blob storage.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use super::LocatorSigner;
use crate::store::ObjectStorage;
use crate::{DriveError, Result};

/// Blob storage rooted at a local directory.
///
/// Blobs are stored at `{base_path}/{storage_path}`, where storage paths look like
/// `{owner_id}/{uuid}.{ext}`:
/// ```text
/// {base_path}/
/// ├── 0b6f.../
/// │   └── 8a1c9e2d-....pdf
/// └── ...
/// ```
/// Locators point at the `/blobs/...` route of this service and carry an HMAC
/// signature over the path and expiry.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    base_path: PathBuf,
    public_base_url: String,
    signer: LocatorSigner,
}

impl LocalObjectStorage {
    /// Create a new LocalObjectStorage.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
        signer: LocatorSigner,
    ) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            signer,
        })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a storage path below the base directory.
    ///
    /// Only plain path segments are accepted; `..`, absolute paths and the like are
    /// rejected.
    pub fn get_file_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(DriveError::InvalidRequest(format!(
                "invalid storage path: {path}"
            )));
        }
        Ok(self.base_path.join(relative))
    }

    /// Load a blob.
    pub async fn load(&self, path: &str) -> Result<Vec<u8>> {
        let file_path = self.get_file_path(path)?;

        match fs::read(&file_path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DriveError::NotFound("blob".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check a locator's signature and expiry, then load the blob.
    pub async fn load_signed(
        &self,
        path: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<u8>> {
        self.signer.verify(path, expires, signature, now)?;
        self.load(path).await
    }

    /// Build the locator URL for `path` expiring at the unix timestamp `expires`.
    pub fn locator_url(&self, path: &str, expires: i64) -> Result<String> {
        let signature = self.signer.sign(path, expires)?;
        let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
        Ok(format!(
            "{}/blobs/{}?expires={expires}&signature={signature}",
            self.public_base_url,
            encoded.join("/")
        ))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(&self, path: &str, content: &[u8]) -> Result<()> {
        let file_path = self.get_file_path(path)?;

        // Create the owner directory if it doesn't exist
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&file_path, content).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<bool> {
        let file_path = self.get_file_path(path)?;

        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_locator(&self, path: &str, ttl: Duration) -> Result<String> {
        self.get_file_path(path)?;
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = Utc::now().timestamp().saturating_add(ttl);
        self.locator_url(path, expires)
    }
}
