/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the registration password policy
/// - [`jwt`]: HS256 bearer token issue and validation
/// - [`access`]: the pure access-control evaluator every mutation consults

pub mod access;
pub mod jwt;
pub mod password;
