/// Attachment lifecycle: upload, delete, download
///
/// Bytes go to the blob store first and the metadata is appended to the task
/// afterwards in one atomic update, so a task never lists an attachment
/// whose upload did not finish. If the append fails, the uploaded blob is
/// removed again best-effort.

use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::effects::EffectRunner;
use super::{load_task, validation};
use crate::auth::access::{authorize, Action, Actor, Resource};
use crate::error::{ServiceError, ServiceResult};
use crate::models::project::Project;
use crate::models::task::{Attachment, Task};
use crate::storage::BlobStore;
use crate::store::Store;

/// Object key prefix for every attachment
pub const ATTACHMENT_KEY_PREFIX: &str = "task-attachments/";

/// Lifetime of a download link
pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// A file received from a client
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub original_name: String,
    /// MIME type declared by the client
    pub mime_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct AttachmentDownload {
    pub attachment: Attachment,
    /// Presigned, time-limited URL
    pub url: String,
}

fn storage_unavailable() -> ServiceError {
    ServiceError::UpstreamUnavailable("file storage is not configured".to_string())
}

/// Drops any client-side directory components
fn base_name(raw: &str) -> String {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim().to_string()
}

#[derive(Clone)]
pub struct AttachmentService {
    store: Arc<dyn Store>,
    blobs: Option<Arc<dyn BlobStore>>,
    effects: EffectRunner,
}

impl AttachmentService {
    pub fn new(store: Arc<dyn Store>, blobs: Option<Arc<dyn BlobStore>>, effects: EffectRunner) -> Self {
        Self {
            store,
            blobs,
            effects,
        }
    }

    async fn authorized_task(&self, actor: &Actor, task_id: Uuid) -> ServiceResult<(Task, Project)> {
        let (task, project) = load_task(self.store.as_ref(), task_id).await?;
        authorize(
            actor,
            Action::ManageAttachments,
            Resource::Task {
                task: &task,
                project: &project,
            },
        )
        .into_result()?;

        Ok((task, project))
    }

    /// Stores a file and attaches it to the task
    ///
    /// Size, extension, and MIME type are checked before the blob store is
    /// touched.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty, oversized, or disallowed file
    /// - `UpstreamUnavailable` if storage is not configured or the upload fails
    /// - `NotFound` if the task disappears before the metadata is saved
    pub async fn upload(&self, actor: &Actor, task_id: Uuid, upload: AttachmentUpload) -> ServiceResult<Task> {
        let (task, _project) = self.authorized_task(actor, task_id).await?;

        let original_name = base_name(&upload.original_name);
        let extension = validation::attachment(&original_name, &upload.mime_type, upload.bytes.len())?;
        let blobs = self.blobs.as_ref().ok_or_else(storage_unavailable)?;

        let id = Uuid::new_v4();
        let filename = format!("{}.{}", id, extension);
        let key = format!("{}{}", ATTACHMENT_KEY_PREFIX, filename);

        let stored = blobs.put(&key, &upload.bytes, &upload.mime_type).await.map_err(|e| {
            tracing::error!(task_id = %task.id, key = %key, error = %e, "Attachment upload failed");
            ServiceError::from(e)
        })?;

        let attachment = Attachment {
            id,
            filename,
            original_name,
            url: stored.url,
            key: stored.key,
            size: upload.bytes.len() as i64,
            mime_type: upload.mime_type,
            uploaded_at: Utc::now(),
        };

        match self.store.push_attachment(task.id, attachment).await {
            Ok(Some(updated)) => {
                tracing::info!(task_id = %task.id, attachment_id = %id, "Attachment uploaded");
                Ok(updated)
            }
            Ok(None) => {
                self.effects.delete_blob_best_effort(&key).await;
                Err(ServiceError::not_found("Task"))
            }
            Err(e) => {
                self.effects.delete_blob_best_effort(&key).await;
                Err(e.into())
            }
        }
    }

    /// Removes an attachment: blob first (best-effort), then the metadata
    pub async fn delete(&self, actor: &Actor, task_id: Uuid, attachment_id: Uuid) -> ServiceResult<Task> {
        let (task, _project) = self.authorized_task(actor, task_id).await?;

        let attachment = task
            .find_attachment(attachment_id)
            .ok_or_else(|| ServiceError::not_found("Attachment"))?;

        self.effects.delete_blob_best_effort(&attachment.key).await;

        let updated = self
            .store
            .pull_attachment(task.id, attachment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))?;

        tracing::info!(task_id = %task.id, attachment_id = %attachment_id, "Attachment deleted");
        Ok(updated)
    }

    /// Issues a short-lived download link for an attachment
    pub async fn download(
        &self,
        actor: &Actor,
        task_id: Uuid,
        attachment_id: Uuid,
    ) -> ServiceResult<AttachmentDownload> {
        let (task, _project) = self.authorized_task(actor, task_id).await?;

        let attachment = task
            .find_attachment(attachment_id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Attachment"))?;

        let blobs = self.blobs.as_ref().ok_or_else(storage_unavailable)?;
        let url = blobs.presign(&attachment.key, DOWNLOAD_URL_TTL).await?;

        Ok(AttachmentDownload { attachment, url })
    }
}
