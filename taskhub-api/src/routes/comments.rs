/// Comment endpoints
///
/// - `GET|POST /v1/tasks/:id/comments`
/// - `PUT /v1/comments/:id` - Author only
/// - `DELETE /v1/comments/:id` - Author or project owner

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{path_id, ValidatedJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::{auth::access::Actor, models::comment::Comment};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 1000, message = "Comment must be between 1 and 1000 characters"))]
    pub content: String,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    let task_id = path_id(&task_id, "Task")?;
    Ok(Json(state.services.comments.list(&actor, task_id).await?))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let task_id = path_id(&task_id, "Task")?;
    let comment = state
        .services
        .comments
        .create(&actor, task_id, &req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<CommentRequest>,
) -> ApiResult<Json<Comment>> {
    let id = path_id(&id, "Comment")?;
    Ok(Json(state.services.comments.update(&actor, id, &req.content).await?))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = path_id(&id, "Comment")?;
    state.services.comments.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
