/// Admin user management
///
/// - `GET /v1/users` - List every user
/// - `PUT /v1/users/:id/role` - Change a user's global role

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{path_id, ValidatedJson},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::{auth::access::Actor, models::user::User};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    /// `user` or `admin`
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.services.users.list(&actor).await?))
}

/// An admin cannot remove their own admin role (`400 conflict`)
pub async fn update_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateRoleRequest>,
) -> ApiResult<Json<User>> {
    let target_id = path_id(&id, "User")?;
    let user = state.services.users.set_role(&actor, target_id, &req.role).await?;

    tracing::info!(actor_id = %actor.id, user_id = %user.id, role = %user.role, "User role changed");
    Ok(Json(user))
}
