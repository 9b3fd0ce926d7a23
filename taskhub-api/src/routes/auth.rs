/// Authentication endpoints
///
/// - `POST /v1/auth/register` - Create an account and get a token
/// - `POST /v1/auth/login` - Exchange credentials for a token
/// - `GET /v1/auth/me` - The authenticated user

use crate::{app::AppState, error::ApiResult, extract::ValidatedJson};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use taskhub_shared::{
    auth::access::Actor,
    models::user::User,
    services::{AuthSession, LoginInput, RegisterInput},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    /// Checked for strength by the user service
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "password": "analytical1"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// { "token": "eyJ...", "user": { "id": "uuid", "name": "Ada Lovelace", ... } }
/// ```
///
/// # Errors
///
/// - `400 validation_error`: Invalid name, email, or weak password
/// - `400 conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthSession>)> {
    let session = state
        .services
        .users
        .register(RegisterInput {
            name: req.name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Login with email and password
///
/// Wrong email and wrong password produce the same `401`.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthSession>> {
    let session = state
        .services
        .users
        .login(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    tracing::info!(user_id = %session.user.id, "User logged in");
    Ok(Json(session))
}

pub async fn me(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> ApiResult<Json<User>> {
    Ok(Json(state.services.users.current_user(&actor).await?))
}
