use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::activity::{Activity, NewActivity};
use crate::models::comment::{Comment, NewComment};
use crate::models::project::{NewProject, Project, ProjectChanges};
use crate::models::task::{Attachment, NewTask, Task, TaskChanges, TaskFilter};
use crate::models::user::{NewUser, User, UserRole};

/// Collections in insertion order
#[derive(Default)]
struct Collections {
    users: Vec<User>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    comments: Vec<Comment>,
    activities: Vec<Activity>,
}

/// In-process [`Store`]
///
/// Every mutation runs under a single write lock, which gives the same
/// per-document atomicity the PostgreSQL store gets from `UPDATE ... RETURNING`.
/// Cascades mirror the foreign keys of the SQL schema.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
    fail_activity_writes: AtomicBool,
    miss_next_email_lookup: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `insert_activity` fail until switched off
    pub fn set_activity_writes_failing(&self, failing: bool) {
        self.fail_activity_writes.store(failing, Ordering::SeqCst);
    }

    /// Makes the next `find_user_by_email` report no match
    ///
    /// Stands in for a registration that lands between a lookup and the
    /// insert that follows it.
    pub fn miss_next_email_lookup(&self) {
        self.miss_next_email_lookup.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, data: NewUser) -> StoreResult<User> {
        let mut db = self.data.write().await;

        if db.users.iter().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        db.users.push(user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let db = self.data.read().await;
        Ok(db.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        if self.miss_next_email_lookup.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }

        let db = self.data.read().await;
        Ok(db.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.data.read().await.users.clone())
    }

    async fn set_user_role(&self, id: Uuid, role: UserRole) -> StoreResult<Option<User>> {
        let mut db = self.data.write().await;

        Ok(db.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.role = role;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn insert_project(&self, data: NewProject) -> StoreResult<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            color: data.color,
            owner_id: data.owner_id,
            member_ids: vec![data.owner_id],
            created_at: now,
            updated_at: now,
        };

        self.data.write().await.projects.push(project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let db = self.data.read().await;
        Ok(db.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let db = self.data.read().await;
        let mut projects: Vec<Project> = db
            .projects
            .iter()
            .filter(|p| p.is_member(user_id))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(projects)
    }

    async fn list_all_projects(&self) -> StoreResult<Vec<Project>> {
        let mut projects = self.data.read().await.projects.clone();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(projects)
    }

    async fn update_project(
        &self,
        id: Uuid,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>> {
        let mut db = self.data.write().await;

        Ok(db.projects.iter_mut().find(|p| p.id == id).map(|project| {
            if let Some(name) = changes.name {
                project.name = name;
            }
            if let Some(description) = changes.description {
                project.description = description;
            }
            if let Some(color) = changes.color {
                project.color = color;
            }
            project.updated_at = Utc::now();
            project.clone()
        }))
    }

    async fn add_project_member(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Project>> {
        let mut db = self.data.write().await;

        let Some(project) = db.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if project.member_ids.contains(&user_id) {
            return Ok(None);
        }

        project.member_ids.push(user_id);
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn remove_project_member(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Project>> {
        let mut db = self.data.write().await;

        Ok(db.projects.iter_mut().find(|p| p.id == id).map(|project| {
            project.member_ids.retain(|m| *m != user_id);
            project.updated_at = Utc::now();
            project.clone()
        }))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut db = self.data.write().await;

        let before = db.projects.len();
        db.projects.retain(|p| p.id != id);
        if db.projects.len() == before {
            return Ok(false);
        }

        let task_ids: Vec<Uuid> = db
            .tasks
            .iter()
            .filter(|t| t.project_id == id)
            .map(|t| t.id)
            .collect();
        db.tasks.retain(|t| t.project_id != id);
        db.comments.retain(|c| !task_ids.contains(&c.task_id));
        db.activities.retain(|a| a.project_id != id);

        Ok(true)
    }

    async fn insert_task(&self, data: NewTask) -> StoreResult<Task> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            due_date: data.due_date,
            project_id: data.project_id,
            assignee_id: data.assignee_id,
            created_by: data.created_by,
            attachments: Vec::new(),
            position: data.position,
            created_at: now,
            updated_at: now,
        };

        self.data.write().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let db = self.data.read().await;
        Ok(db.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let db = self.data.read().await;
        let mut tasks: Vec<Task> = db.tasks.iter().filter(|t| filter.matches(t)).cloned().collect();

        // Stable sort keeps insertion order for equal keys
        tasks.sort_by(|a, b| {
            a.position
                .total_cmp(&b.position)
                .then(a.created_at.cmp(&b.created_at))
        });

        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        let mut db = self.data.write().await;

        Ok(db.tasks.iter_mut().find(|t| t.id == id).map(|task| {
            if let Some(title) = changes.title {
                task.title = title;
            }
            if let Some(description) = changes.description {
                task.description = description;
            }
            if let Some(status) = changes.status {
                task.status = status;
            }
            if let Some(priority) = changes.priority {
                task.priority = priority;
            }
            if let Some(due_date) = changes.due_date {
                task.due_date = due_date;
            }
            if let Some(assignee_id) = changes.assignee_id {
                task.assignee_id = assignee_id;
            }
            if let Some(position) = changes.position {
                task.position = position;
            }
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut db = self.data.write().await;

        let before = db.tasks.len();
        db.tasks.retain(|t| t.id != id);
        if db.tasks.len() == before {
            return Ok(false);
        }

        db.comments.retain(|c| c.task_id != id);
        Ok(true)
    }

    async fn push_attachment(
        &self,
        task_id: Uuid,
        attachment: Attachment,
    ) -> StoreResult<Option<Task>> {
        let mut db = self.data.write().await;

        Ok(db.tasks.iter_mut().find(|t| t.id == task_id).map(|task| {
            task.attachments.push(attachment);
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn pull_attachment(
        &self,
        task_id: Uuid,
        attachment_id: Uuid,
    ) -> StoreResult<Option<Task>> {
        let mut db = self.data.write().await;

        Ok(db.tasks.iter_mut().find(|t| t.id == task_id).map(|task| {
            task.attachments.retain(|a| a.id != attachment_id);
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn insert_comment(&self, data: NewComment) -> StoreResult<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            content: data.content,
            task_id: data.task_id,
            author_id: data.author_id,
            created_at: now,
            updated_at: now,
        };

        self.data.write().await.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let db = self.data.read().await;
        Ok(db.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments(&self, task_id: Uuid) -> StoreResult<Vec<Comment>> {
        let db = self.data.read().await;
        Ok(db.comments.iter().filter(|c| c.task_id == task_id).cloned().collect())
    }

    async fn update_comment_content(
        &self,
        id: Uuid,
        content: String,
    ) -> StoreResult<Option<Comment>> {
        let mut db = self.data.write().await;

        Ok(db.comments.iter_mut().find(|c| c.id == id).map(|comment| {
            comment.content = content;
            comment.updated_at = Utc::now();
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let mut db = self.data.write().await;

        let before = db.comments.len();
        db.comments.retain(|c| c.id != id);
        Ok(db.comments.len() != before)
    }

    async fn insert_activity(&self, data: NewActivity) -> StoreResult<Activity> {
        if self.fail_activity_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("activity writes disabled".to_string()));
        }

        let activity = Activity {
            id: Uuid::new_v4(),
            kind: data.kind,
            description: data.description,
            project_id: data.project_id,
            task_id: data.task_id,
            user_id: data.user_id,
            metadata: data.metadata,
            created_at: Utc::now(),
        };

        self.data.write().await.activities.push(activity.clone());
        Ok(activity)
    }

    async fn list_activities(
        &self,
        project_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Activity>> {
        let db = self.data.read().await;

        Ok(db
            .activities
            .iter()
            .rev()
            .filter(|a| a.project_id == project_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_activities(&self, project_id: Uuid) -> StoreResult<i64> {
        let db = self.data.read().await;
        Ok(db.activities.iter().filter(|a| a.project_id == project_id).count() as i64)
    }
}
