use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{validate_key, BlobError, BlobStore, StoredBlob};

type HmacSha256 = Hmac<Sha256>;

/// Filesystem blob store
///
/// Objects live at `<root>/<key>`. Writes go to a temp file first and are
/// renamed into place, so a reader never sees a partial object. Download URLs
/// point at `<public_base>/files/<key>` and carry an expiry and an
/// HMAC-SHA256 signature over `key\nexpires`, checked by [`verify`].
///
/// [`verify`]: LocalBlobStore::verify
#[derive(Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base: String,
    signing_key: Vec<u8>,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf, public_base: impl Into<String>, signing_key: impl Into<Vec<u8>>) -> Self {
        Self {
            root,
            public_base: public_base.into().trim_end_matches('/').to_string(),
            signing_key: signing_key.into(),
        }
    }

    /// Creates the root directory if needed
    pub async fn initialize(&self) -> Result<(), BlobError> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!(root = %self.root.display(), "Blob store initialized");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn canonical_url(&self, key: &str) -> String {
        format!("{}/files/{}", self.public_base, key)
    }

    fn signature(&self, key: &str, expires: i64) -> Result<HmacSha256, BlobError> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|e| BlobError::Unavailable(format!("Invalid signing key: {}", e)))?;
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    /// Checks a presigned link's expiry and signature
    pub fn verify(&self, key: &str, expires: i64, signature: &str) -> Result<(), BlobError> {
        validate_key(key)?;

        if Utc::now().timestamp() > expires {
            return Err(BlobError::Expired);
        }

        let provided = hex::decode(signature).map_err(|_| BlobError::InvalidSignature)?;
        self.signature(key, expires)?
            .verify_slice(&provided)
            .map_err(|_| BlobError::InvalidSignature)
    }

    /// Reads a whole object
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, BlobError> {
        let path = self.path_for(key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<StoredBlob, BlobError> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &path).await?;

        tracing::debug!(key, size = bytes.len(), content_type, "Stored blob");

        Ok(StoredBlob {
            key: key.to_string(),
            url: self.canonical_url(key),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, BlobError> {
        validate_key(key)?;

        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        let signature = hex::encode(self.signature(key, expires)?.finalize().into_bytes());

        Ok(format!(
            "{}?expires={}&signature={}",
            self.canonical_url(key),
            expires,
            signature
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (LocalBlobStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(
            temp_dir.path().join("blobs"),
            "http://localhost:3000/",
            b"test-signing-key".to_vec(),
        );
        store.initialize().await.unwrap();
        (store, temp_dir)
    }

    fn query_param<'a>(url: &'a str, name: &str) -> &'a str {
        let query = url.split_once('?').unwrap().1;
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{}=", name)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_and_read() {
        let (store, _temp) = create_test_store().await;

        let stored = store
            .put("task-attachments/a.txt", b"Hello, World!", "text/plain")
            .await
            .unwrap();
        assert_eq!(stored.key, "task-attachments/a.txt");
        assert_eq!(stored.url, "http://localhost:3000/files/task-attachments/a.txt");

        let data = store.read("task-attachments/a.txt").await.unwrap();
        assert_eq!(data, b"Hello, World!");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, _temp) = create_test_store().await;

        store.put("task-attachments/b.txt", b"bytes", "text/plain").await.unwrap();
        store.delete("task-attachments/b.txt").await.unwrap();
        store.delete("task-attachments/b.txt").await.unwrap();

        assert!(matches!(
            store.read("task-attachments/b.txt").await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let (store, _temp) = create_test_store().await;

        assert!(matches!(
            store.put("../outside.txt", b"x", "text/plain").await,
            Err(BlobError::InvalidKey(_))
        ));
        assert!(matches!(
            store.delete("/etc/passwd").await,
            Err(BlobError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_presigned_url_verifies() {
        let (store, _temp) = create_test_store().await;
        let key = "task-attachments/c.pdf";

        let url = store.presign(key, Duration::from_secs(900)).await.unwrap();
        assert!(url.starts_with("http://localhost:3000/files/task-attachments/c.pdf?"));

        let expires: i64 = query_param(&url, "expires").parse().unwrap();
        let signature = query_param(&url, "signature");

        store.verify(key, expires, signature).unwrap();
        assert!(matches!(
            store.verify("task-attachments/other.pdf", expires, signature),
            Err(BlobError::InvalidSignature)
        ));
        assert!(matches!(
            store.verify(key, expires + 1, signature),
            Err(BlobError::InvalidSignature)
        ));
        assert!(matches!(
            store.verify(key, expires, "zz"),
            Err(BlobError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn test_expired_link_rejected() {
        let (store, _temp) = create_test_store().await;
        let key = "task-attachments/d.pdf";
        let expires = Utc::now().timestamp() - 10;
        let signature = hex::encode(store.signature(key, expires).unwrap().finalize().into_bytes());

        assert!(matches!(
            store.verify(key, expires, &signature),
            Err(BlobError::Expired)
        ));
    }
}
