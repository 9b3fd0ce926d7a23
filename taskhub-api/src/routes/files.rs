/// Signed attachment downloads
///
/// ```text
/// GET /files/task-attachments/<id>.pdf?expires=1735689600&signature=<hex>
/// ```
///
/// Links are issued by the attachment download endpoint and verified here
/// against the storage signing key. No bearer token is needed; the
/// signature is the credential.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use taskhub_shared::storage::{guess_content_type, BlobError};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct SignedLink {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

pub async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(link): Query<SignedLink>,
) -> ApiResult<impl IntoResponse> {
    let files = state
        .files
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    let (Some(expires), Some(signature)) = (link.expires, link.signature) else {
        return Err(ApiError::Forbidden("Download link is not signed".to_string()));
    };

    files.verify(&key, expires, &signature).map_err(|e| match e {
        BlobError::Expired => ApiError::Forbidden("Download link has expired".to_string()),
        BlobError::InvalidKey(_) => ApiError::NotFound("File not found".to_string()),
        _ => ApiError::Forbidden("Download link is invalid".to_string()),
    })?;

    let bytes = files.read(&key).await.map_err(|e| match e {
        BlobError::NotFound(_) | BlobError::InvalidKey(_) => ApiError::NotFound("File not found".to_string()),
        other => ApiError::InternalError(other.to_string()),
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, guess_content_type(&key)),
            (header::CONTENT_DISPOSITION, "attachment"),
        ],
        bytes,
    ))
}
