use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::activity::{Activity, NewActivity};
use crate::models::comment::{Comment, NewComment};
use crate::models::project::{NewProject, Project, ProjectChanges};
use crate::models::task::{Attachment, NewTask, Task, TaskChanges, TaskFilter};
use crate::db::pool::health_check;
use crate::models::user::{NewUser, User, UserRole};

/// [`Store`] backed by PostgreSQL
///
/// A thin adapter over the model-level queries; cascades are enforced by
/// foreign keys (see `migrations/`).
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        User::create(&self.pool, user).await.map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => StoreError::Conflict("Email already registered".to_string()),
            other => other,
        })
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(User::list(&self.pool).await?)
    }

    async fn set_user_role(&self, id: Uuid, role: UserRole) -> StoreResult<Option<User>> {
        Ok(User::set_role(&self.pool, id, role).await?)
    }

    async fn insert_project(&self, project: NewProject) -> StoreResult<Project> {
        Ok(Project::create(&self.pool, project).await?)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(Project::list_for_user(&self.pool, user_id).await?)
    }

    async fn list_all_projects(&self) -> StoreResult<Vec<Project>> {
        Ok(Project::list_all(&self.pool).await?)
    }

    async fn update_project(
        &self,
        id: Uuid,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>> {
        Ok(Project::update(&self.pool, id, changes).await?)
    }

    async fn add_project_member(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::add_member(&self.pool, id, user_id).await?)
    }

    async fn remove_project_member(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Project>> {
        Ok(Project::remove_member(&self.pool, id, user_id).await?)
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Project::delete(&self.pool, id).await?)
    }

    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, task).await?)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        Ok(Task::list(&self.pool, filter).await?)
    }

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, changes).await?)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn push_attachment(
        &self,
        task_id: Uuid,
        attachment: Attachment,
    ) -> StoreResult<Option<Task>> {
        Ok(Task::push_attachment(&self.pool, task_id, &attachment).await?)
    }

    async fn pull_attachment(
        &self,
        task_id: Uuid,
        attachment_id: Uuid,
    ) -> StoreResult<Option<Task>> {
        Ok(Task::pull_attachment(&self.pool, task_id, attachment_id).await?)
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        Ok(Comment::create(&self.pool, comment).await?)
    }

    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(Comment::find_by_id(&self.pool, id).await?)
    }

    async fn list_comments(&self, task_id: Uuid) -> StoreResult<Vec<Comment>> {
        Ok(Comment::list_by_task(&self.pool, task_id).await?)
    }

    async fn update_comment_content(
        &self,
        id: Uuid,
        content: String,
    ) -> StoreResult<Option<Comment>> {
        Ok(Comment::update_content(&self.pool, id, content).await?)
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Comment::delete(&self.pool, id).await?)
    }

    async fn insert_activity(&self, activity: NewActivity) -> StoreResult<Activity> {
        Ok(Activity::create(&self.pool, activity).await?)
    }

    async fn list_activities(
        &self,
        project_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Activity>> {
        Ok(Activity::list_by_project(&self.pool, project_id, limit, offset).await?)
    }

    async fn count_activities(&self, project_id: Uuid) -> StoreResult<i64> {
        Ok(Activity::count_by_project(&self.pool, project_id).await?)
    }
}
