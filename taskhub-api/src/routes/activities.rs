/// `GET /v1/projects/:id/activities?page=&limit=`
///
/// Newest first. Missing or unparsable paging parameters fall back to page 1
/// and 20 per page; `limit` is capped at 50.

use crate::{app::AppState, error::ApiResult, extract::path_id};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::{auth::access::Actor, services::ActivityPage};

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn lenient(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse().ok())
}

pub async fn list_activities(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(project_id): Path<String>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<ActivityPage>> {
    let project_id = path_id(&project_id, "Project")?;
    let page = state
        .services
        .activities
        .list(
            &actor,
            project_id,
            lenient(query.page.as_deref()),
            lenient(query.limit.as_deref()),
        )
        .await?;

    Ok(Json(page))
}
