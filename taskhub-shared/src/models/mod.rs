/// Domain models for TaskHub
///
/// Each model carries its PostgreSQL operations (used by
/// [`crate::store::PgStore`]); the in-memory store reuses the same structs.
///
/// # Models
///
/// - `user`: accounts and their global role
/// - `project`: projects with owner and member set
/// - `task`: tasks with embedded attachments
/// - `comment`: task comments
/// - `activity`: append-only project audit feed

pub mod activity;
pub mod comment;
pub mod project;
pub mod task;
pub mod user;
