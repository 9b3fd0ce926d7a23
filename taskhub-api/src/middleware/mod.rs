/// Middleware for the API server
///
/// - `auth`: Bearer-token authentication for `/v1` resources
/// - `security`: Security headers on every response

pub mod auth;
pub mod security;
