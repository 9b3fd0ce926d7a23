/// Blob storage for task attachments
///
/// Attachment bytes never touch the primary store: they go to a
/// [`BlobStore`] under a generated key, and only the key and URL are
/// embedded in the task. Downloads are served through short-lived
/// presigned URLs.
///
/// # Implementations
///
/// - [`LocalBlobStore`]: files under a root directory, HMAC-signed URLs
/// - `testing::RecordingBlobStore`: in-memory fake that counts calls

mod local;

pub use local::LocalBlobStore;

use async_trait::async_trait;
use std::time::Duration;

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub key: String,

    /// Canonical (unsigned) URL of the object
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Download link has expired")]
    Expired,

    #[error("Download link signature is invalid")]
    InvalidSignature,

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key`, replacing any existing object
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<StoredBlob, BlobError>;

    /// Removes the object; deleting a missing key succeeds
    async fn delete(&self, key: &str) -> Result<(), BlobError>;

    /// Issues a download URL for `key` that stops working after `ttl`
    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, BlobError>;
}

/// Rejects keys that could escape the storage root
pub fn validate_key(key: &str) -> Result<(), BlobError> {
    let well_formed = !key.is_empty()
        && !key.starts_with('/')
        && !key.contains("..")
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'));

    if well_formed {
        Ok(())
    } else {
        Err(BlobError::InvalidKey(key.to_string()))
    }
}

/// Best guess at a MIME type from a key's extension
pub fn guess_content_type(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "zip" => "application/zip",
        "rar" => "application/vnd.rar",
        "7z" => "application/x-7z-compressed",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}
