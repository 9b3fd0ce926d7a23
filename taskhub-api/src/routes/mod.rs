/// API route handlers, organized by resource
///
/// - `health`: Health check
/// - `files`: Signed attachment downloads
/// - `auth`: Registration, login, current user
/// - `users`: Admin user management
/// - `projects`: Projects and membership
/// - `tasks`: Tasks within a project
/// - `attachments`: Task attachments
/// - `comments`: Task comments
/// - `activities`: Project activity feed

pub mod activities;
pub mod attachments;
pub mod auth;
pub mod comments;
pub mod files;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;
