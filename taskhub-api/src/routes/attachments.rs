/// Attachment endpoints
///
/// - `POST /v1/tasks/:id/attachments` - Multipart upload, field `file`
/// - `GET /v1/tasks/:id/attachments/:attachment_id` - `307` to a signed link
/// - `DELETE /v1/tasks/:id/attachments/:attachment_id`
///
/// Files are limited to 10 MB and to image, document, archive, audio, and
/// video types. Uploads answer `503` when storage is not configured.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::path_id,
};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::Redirect,
    Extension, Json,
};
use taskhub_shared::{auth::access::Actor, models::task::Task, services::AttachmentUpload};

const FILE_FIELD: &str = "file";

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::validation("File size cannot exceed 10MB");
    }
    ApiError::BadRequest(err.body_text())
}

/// Reads the `file` field; other fields are ignored
async fn read_upload(multipart: &mut Multipart) -> ApiResult<AttachmentUpload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        return Ok(AttachmentUpload {
            original_name,
            mime_type,
            bytes,
        });
    }

    Err(ApiError::validation("No file uploaded"))
}

pub async fn upload_attachment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task_id = path_id(&task_id, "Task")?;
    let upload = read_upload(&mut multipart).await?;

    let task = state.services.attachments.upload(&actor, task_id, upload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn download_attachment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((task_id, attachment_id)): Path<(String, String)>,
) -> ApiResult<Redirect> {
    let task_id = path_id(&task_id, "Task")?;
    let attachment_id = path_id(&attachment_id, "Attachment")?;

    let download = state
        .services
        .attachments
        .download(&actor, task_id, attachment_id)
        .await?;

    Ok(Redirect::temporary(&download.url))
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((task_id, attachment_id)): Path<(String, String)>,
) -> ApiResult<Json<Task>> {
    let task_id = path_id(&task_id, "Task")?;
    let attachment_id = path_id(&attachment_id, "Attachment")?;

    let task = state
        .services
        .attachments
        .delete(&actor, task_id, attachment_id)
        .await?;

    Ok(Json(task))
}
