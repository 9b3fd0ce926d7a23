/// Domain error type shared by every service
///
/// The variants form the outcome taxonomy callers branch on; the API crate
/// maps each one to an HTTP status. Store, password, and token failures are
/// carried through unchanged and surface as internal errors.

use crate::auth::access::DenyReason;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::storage::BlobError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Missing resource, or an identifier that is not a well-formed id
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    /// First failing input constraint
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    /// Missing or bad credentials
    #[error("{0}")]
    Unauthorized(String),

    /// A required external collaborator is missing or failed
    #[error("{0}")]
    UpstreamUnavailable(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{} not found", what))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => ServiceError::Conflict(message),
            other => ServiceError::Store(other),
        }
    }
}

impl From<DenyReason> for ServiceError {
    fn from(reason: DenyReason) -> Self {
        if reason.is_conflict() {
            ServiceError::Conflict(reason.message().to_string())
        } else {
            ServiceError::Forbidden(reason.message().to_string())
        }
    }
}

impl From<BlobError> for ServiceError {
    fn from(err: BlobError) -> Self {
        ServiceError::UpstreamUnavailable(format!("File storage failed: {}", err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
