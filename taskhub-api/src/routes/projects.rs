/// Project endpoints
///
/// - `GET /v1/projects` - Projects the caller belongs to (all, for admins)
/// - `POST /v1/projects` - Create a project owned by the caller
/// - `GET|PUT|DELETE /v1/projects/:id`
/// - `POST /v1/projects/:id/members` - Add a member by user id
/// - `DELETE /v1/projects/:id/members/:user_id` - Remove a member

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
use taskhub_shared::{
    auth::access::Actor,
    models::project::Project,
    services::{ProjectInput, ProjectPatch},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Project name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,

    /// `#RRGGBB`
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Project name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,

    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    pub user_id: String,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.services.projects.list(&actor).await?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state
        .services
        .projects
        .create(
            &actor,
            ProjectInput {
                name: req.name,
                description: req.description,
                color: req.color,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    let id = path_id(&id, "Project")?;
    Ok(Json(state.services.projects.get(&actor, id).await?))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let id = path_id(&id, "Project")?;
    let project = state
        .services
        .projects
        .update(
            &actor,
            id,
            ProjectPatch {
                name: req.name,
                description: req.description,
                color: req.color,
            },
        )
        .await?;

    Ok(Json(project))
}

/// Owner only; removes tasks, comments, activities, and attachment files
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = path_id(&id, "Project")?;
    state.services.projects.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_member(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<AddMemberRequest>,
) -> ApiResult<Json<Project>> {
    let id = path_id(&id, "Project")?;
    let user_id = path_id(&req.user_id, "User")?;
    Ok(Json(state.services.projects.add_member(&actor, id, user_id).await?))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<Project>> {
    let id = path_id(&id, "Project")?;
    let user_id = path_id(&user_id, "User")?;
    Ok(Json(state.services.projects.remove_member(&actor, id, user_id).await?))
}
