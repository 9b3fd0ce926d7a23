//! # TaskHub Shared Library
//!
//! Domain types, persistence, and business rules behind the TaskHub API.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `store`: Persistence trait with PostgreSQL and in-memory backends
//! - `services`: Use cases (projects, tasks, comments, attachments, activity)
//! - `auth`: Passwords, tokens, and the access policy
//! - `storage`: Blob storage for attachments
//! - `notify`: Assignment emails
//! - `db`: Connection pool and migrations
//! - `error`: Service error type

pub mod auth;
pub mod db;
pub mod error;
pub mod ids;
pub mod models;
pub mod notify;
pub mod services;
pub mod storage;
pub mod store;
pub mod testing;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
