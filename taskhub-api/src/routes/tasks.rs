/// Task endpoints
///
/// - `GET /v1/projects/:id/tasks?status=&assignee=` - Board order
/// - `POST /v1/projects/:id/tasks`
/// - `GET|PUT|DELETE /v1/tasks/:id`
///
/// In updates, an explicit `null` clears `description`, `due_date`, or
/// `assignee_id`; an omitted field is left unchanged.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{double_option, path_id, ValidatedJson},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::{
    auth::access::Actor,
    models::task::Task,
    services::{TaskInput, TaskPatch},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, message = "Task title is required"))]
    pub title: String,

    pub description: Option<String>,

    /// `To Do`, `In Progress`, or `Done`
    pub status: Option<String>,

    /// `Low`, `Medium`, or `High`
    pub priority: Option<String>,

    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub due_date: Option<String>,

    pub assignee_id: Option<String>,

    pub position: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub status: Option<String>,

    pub priority: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub position: Option<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub assignee: Option<String>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(project_id): Path<String>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let project_id = path_id(&project_id, "Project")?;
    let tasks = state
        .services
        .tasks
        .list(
            &actor,
            project_id,
            query.status.as_deref().filter(|s| !s.is_empty()),
            query.assignee.as_deref().filter(|s| !s.is_empty()),
        )
        .await?;

    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(project_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let project_id = path_id(&project_id, "Project")?;
    let task = state
        .services
        .tasks
        .create(
            &actor,
            project_id,
            TaskInput {
                title: req.title,
                description: req.description,
                status: req.status,
                priority: req.priority,
                due_date: req.due_date,
                assignee: req.assignee_id,
                position: req.position,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = path_id(&id, "Task")?;
    Ok(Json(state.services.tasks.get(&actor, id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let id = path_id(&id, "Task")?;
    let task = state
        .services
        .tasks
        .update(
            &actor,
            id,
            TaskPatch {
                title: req.title,
                description: req.description,
                status: req.status,
                priority: req.priority,
                due_date: req.due_date,
                assignee: req.assignee_id,
                position: req.position,
            },
        )
        .await?;

    Ok(Json(task))
}

/// Any project member may delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = path_id(&id, "Task")?;
    state.services.tasks.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
