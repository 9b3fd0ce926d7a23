/// Bearer-token authentication
///
/// Resolves `Authorization: Bearer <jwt>` to the current state of the user
/// and stores it as an [`Actor`] request extension. Handlers behind this
/// layer take `Extension<Actor>`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use taskhub_shared::auth::access::Actor;

use crate::app::AppState;
use crate::error::ApiError;

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req)?.to_string();
    let actor: Actor = state.services.users.authenticate(&token).await?;

    tracing::debug!(user_id = %actor.id, "Request authenticated");
    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Result<&str, ApiError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Expected a Bearer token".to_string()))
}
