/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; service errors convert with `?`.
///
/// Every error body has the same shape:
///
/// ```json
/// { "error": "not_found", "message": "Task not found" }
/// ```
///
/// Conflicts (duplicate email, duplicate member, self-demotion, owner
/// removal) are reported as `400` with the `conflict` code.
///
/// A `500` body says only "An internal error occurred". Outside production
/// the router installs [`expose_internal_detail`], which appends the
/// underlying error text.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskhub_shared::error::ServiceError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Underlying text of a 500, carried as a response extension
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (400)
    BadRequest(String),

    /// Input violates a domain constraint (400)
    ValidationError {
        message: String,
        details: Vec<ValidationErrorDetail>,
    },

    /// State conflict (400)
    Conflict(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "not_found", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Converts `validator` failures, leading with the first message
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let message = details
            .first()
            .map(|d| d.message.clone())
            .unwrap_or_else(|| "Request validation failed".to_string());

        ApiError::ValidationError { message, details }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError { message, .. } => write!(f, "Validation failed: {}", message),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::ValidationError { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                (!details.is_empty()).then_some(details),
            ),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, "conflict", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                let mut response = internal_error_response(INTERNAL_MESSAGE.to_string());
                response.extensions_mut().insert(InternalErrorDetail(msg));
                return response;
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!(error = %msg, "Upstream unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg, None)
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

fn internal_error_response(message: String) -> Response {
    let body = Json(ErrorResponse {
        error: "internal_error".to_string(),
        message,
        details: None,
    });
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}

/// Rewrites `500` bodies to include the underlying error text
///
/// For `axum::middleware::map_response`. Responses without an
/// [`InternalErrorDetail`] pass through untouched.
pub async fn expose_internal_detail(mut response: Response) -> Response {
    match response.extensions_mut().remove::<InternalErrorDetail>() {
        Some(InternalErrorDetail(detail)) => {
            internal_error_response(format!("{}: {}", INTERNAL_MESSAGE, detail))
        }
        None => response,
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::Validation(msg) => ApiError::validation(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            ServiceError::UpstreamUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            other @ (ServiceError::Store(_) | ServiceError::Password(_) | ServiceError::Token(_)) => {
                ApiError::InternalError(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_service_error_status_mapping() {
        let cases = [
            (ServiceError::not_found("Task"), StatusCode::NOT_FOUND),
            (ServiceError::Forbidden("no".to_string()), StatusCode::FORBIDDEN),
            (ServiceError::validation("bad"), StatusCode::BAD_REQUEST),
            (ServiceError::Conflict("dup".to_string()), StatusCode::BAD_REQUEST),
            (ServiceError::Unauthorized("who".to_string()), StatusCode::UNAUTHORIZED),
            (
                ServiceError::UpstreamUnavailable("down".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn failing_router(expose: bool) -> axum::Router {
        let router = axum::Router::new().route(
            "/boom",
            axum::routing::get(|| async {
                Err::<(), _>(ApiError::InternalError("connection reset".to_string()))
            }),
        );
        if expose {
            router.layer(axum::middleware::map_response(expose_internal_detail))
        } else {
            router
        }
    }

    async fn call_boom(router: axum::Router) -> Response {
        use tower::Service as _;

        let request = axum::http::Request::builder()
            .uri("/boom")
            .body(axum::body::Body::empty())
            .unwrap();
        router.clone().call(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail_by_default() {
        let response = ApiError::InternalError("connection reset".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "internal_error");
        assert_eq!(json["message"], "An internal error occurred");

        let response = call_boom(failing_router(false)).await;
        assert_eq!(body_json(response).await["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_detail_layer_exposes_internal_error_text() {
        let response = call_boom(failing_router(true)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "internal_error");
        assert_eq!(json["message"], "An internal error occurred: connection reset");

        // Other errors pass through the layer unchanged
        let not_found = ApiError::NotFound("Task not found".to_string()).into_response();
        let response = expose_internal_detail(not_found).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "Task not found");
    }

    #[tokio::test]
    async fn test_conflict_body_shape() {
        let response = ApiError::Conflict("Email already registered".to_string()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "conflict");
        assert_eq!(json["message"], "Email already registered");
        assert!(json.get("details").is_none());
    }
}
