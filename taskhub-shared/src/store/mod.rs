/// Persistence boundary
///
/// Services see storage only through [`Store`]. Two implementations exist:
///
/// - [`PgStore`]: PostgreSQL via sqlx, the production store
/// - [`MemoryStore`]: `tokio::sync::RwLock`-guarded maps for tests and local runs
///
/// Embedded-list mutations (`push_attachment`, `pull_attachment`,
/// `add_project_member`, `remove_project_member`) are single atomic updates
/// that return the document as it is after the update.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::activity::{Activity, NewActivity};
use crate::models::comment::{Comment, NewComment};
use crate::models::project::{NewProject, Project, ProjectChanges};
use crate::models::task::{Attachment, NewTask, Task, TaskChanges, TaskFilter};
use crate::models::user::{NewUser, User, UserRole};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        // 23505: unique_violation
        let is_unique_violation = err
            .as_database_error()
            .and_then(|db| db.code())
            .map_or(false, |code| code == "23505");

        if is_unique_violation {
            StoreError::Conflict("Record already exists".to_string())
        } else {
            StoreError::Database(err)
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness probe for health checks
    async fn ping(&self) -> StoreResult<()>;

    // Users

    /// Fails with [`StoreError::Conflict`] if the email is taken
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn set_user_role(&self, id: Uuid, role: UserRole) -> StoreResult<Option<User>>;

    // Projects

    async fn insert_project(&self, project: NewProject) -> StoreResult<Project>;
    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;
    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>>;
    async fn list_all_projects(&self) -> StoreResult<Vec<Project>>;
    async fn update_project(&self, id: Uuid, changes: ProjectChanges)
        -> StoreResult<Option<Project>>;

    /// Appends `user_id` unless already present
    ///
    /// Returns `None` when the user is already a member or the project is gone.
    async fn add_project_member(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Project>>;
    async fn remove_project_member(&self, id: Uuid, user_id: Uuid)
        -> StoreResult<Option<Project>>;

    /// Deletes the project with its tasks, their comments, and its activities
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    // Tasks

    async fn insert_task(&self, task: NewTask) -> StoreResult<Task>;
    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;
    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>>;
    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>>;

    /// Deletes the task and its comments
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    async fn push_attachment(&self, task_id: Uuid, attachment: Attachment)
        -> StoreResult<Option<Task>>;
    async fn pull_attachment(&self, task_id: Uuid, attachment_id: Uuid)
        -> StoreResult<Option<Task>>;

    // Comments

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment>;
    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>>;
    async fn list_comments(&self, task_id: Uuid) -> StoreResult<Vec<Comment>>;
    async fn update_comment_content(&self, id: Uuid, content: String)
        -> StoreResult<Option<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool>;

    // Activities

    async fn insert_activity(&self, activity: NewActivity) -> StoreResult<Activity>;

    /// Newest first
    async fn list_activities(
        &self,
        project_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Activity>>;
    async fn count_activities(&self, project_id: Uuid) -> StoreResult<i64>;
}
