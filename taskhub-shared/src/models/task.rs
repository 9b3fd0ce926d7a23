/// Task model and database operations
///
/// Tasks live under exactly one project and inherit its access rules. File
/// attachments are embedded in the task row as a JSONB array so that adding
/// or removing one is a single atomic row update.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('To Do', 'In Progress', 'Done');
/// CREATE TYPE task_priority AS ENUM ('Low', 'Medium', 'High');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'To Do',
///     priority task_priority NOT NULL DEFAULT 'Medium',
///     due_date TIMESTAMPTZ,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     attachments JSONB NOT NULL DEFAULT '[]',
///     position DOUBLE PRECISION NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    #[sqlx(rename = "To Do")]
    Todo,

    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,

    #[serde(rename = "Done")]
    #[sqlx(rename = "Done")]
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "To Do" => Ok(TaskStatus::Todo),
            "In Progress" => Ok(TaskStatus::InProgress),
            "Done" => Ok(TaskStatus::Done),
            other => Err(format!("Invalid status '{}'", other)),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(TaskPriority::Low),
            "Medium" => Ok(TaskPriority::Medium),
            "High" => Ok(TaskPriority::High),
            other => Err(format!("Invalid priority '{}'", other)),
        }
    }
}

/// File attached to a task, embedded in the task document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Identifier used to address the attachment within its task
    pub id: Uuid,

    /// Generated unique file name (`<uuid>.<ext>`)
    pub filename: String,

    /// Name the file had on the uploader's machine
    pub original_name: String,

    /// Canonical blob-store URL
    pub url: String,

    /// Blob-store object key
    pub key: String,

    /// Size in bytes
    pub size: i64,

    /// Declared MIME type at upload time
    pub mime_type: String,

    pub uploaded_at: DateTime<Utc>,
}

/// Task document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,

    /// Attachments in upload order
    pub attachments: Vec<Attachment>,

    /// Drag-and-drop ordering within a board column
    pub position: f64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn find_attachment(&self, attachment_id: Uuid) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.id == attachment_id)
    }
}

/// Row shape as stored; `attachments` is decoded from JSONB
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: Option<DateTime<Utc>>,
    project_id: Uuid,
    assignee_id: Option<Uuid>,
    created_by: Uuid,
    attachments: Json<Vec<Attachment>>,
    position: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status,
            priority: row.priority,
            due_date: row.due_date,
            project_id: row.project_id,
            assignee_id: row.assignee_id,
            created_by: row.created_by,
            attachments: row.attachments.0,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
    pub position: f64,
}

/// Field-level partial update
///
/// Outer `None` leaves a field untouched; for nullable fields `Some(None)`
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub assignee_id: Option<Option<Uuid>>,
    pub position: Option<f64>,
}

/// Query filter for listing a project's tasks
#[derive(Debug, Clone)]
pub struct TaskFilter {
    pub project_id: Uuid,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
}

impl TaskFilter {
    pub fn project(project_id: Uuid) -> Self {
        Self {
            project_id,
            status: None,
            assignee_id: None,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        task.project_id == self.project_id
            && self.status.map_or(true, |s| task.status == s)
            && self.assignee_id.map_or(true, |a| task.assignee_id == Some(a))
    }
}

const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, project_id, \
     assignee_id, created_by, attachments, position, created_at, updated_at";

impl Task {
    pub async fn create(pool: &PgPool, data: NewTask) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO tasks (id, title, description, status, priority, due_date,
                               project_id, assignee_id, created_by, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {TASK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.project_id)
            .bind(data.assignee_id)
            .bind(data.created_by)
            .bind(data.position)
            .fetch_one(pool)
            .await?;

        Ok(row.into())
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Task::from))
    }

    /// Lists tasks matching the filter, in board order
    pub async fn list(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(TASK_COLUMNS);
        qb.push(" FROM tasks WHERE project_id = ");
        qb.push_bind(filter.project_id);

        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(assignee_id) = filter.assignee_id {
            qb.push(" AND assignee_id = ").push_bind(assignee_id);
        }

        qb.push(" ORDER BY position ASC, created_at ASC");

        let rows = qb.build_query_as::<TaskRow>().fetch_all(pool).await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    /// Applies only the fields present in `changes`
    ///
    /// Untouched columns keep whatever a concurrent writer stored, so two
    /// updates to different fields both land.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = changes.title {
            qb.push(", title = ").push_bind(title);
        }
        if let Some(description) = changes.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(status) = changes.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(priority) = changes.priority {
            qb.push(", priority = ").push_bind(priority);
        }
        if let Some(due_date) = changes.due_date {
            qb.push(", due_date = ").push_bind(due_date);
        }
        if let Some(assignee_id) = changes.assignee_id {
            qb.push(", assignee_id = ").push_bind(assignee_id);
        }
        if let Some(position) = changes.position {
            qb.push(", position = ").push_bind(position);
        }

        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(TASK_COLUMNS);

        let row = qb.build_query_as::<TaskRow>().fetch_optional(pool).await?;
        Ok(row.map(Task::from))
    }

    /// Appends an attachment in one statement; `None` if the task is gone
    pub async fn push_attachment(
        pool: &PgPool,
        id: Uuid,
        attachment: &Attachment,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE tasks
            SET attachments = attachments || jsonb_build_array($2::jsonb),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .bind(Json(attachment))
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Task::from))
    }

    /// Removes an attachment by id in one statement, preserving order of the rest
    pub async fn pull_attachment(
        pool: &PgPool,
        id: Uuid,
        attachment_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE tasks
            SET attachments = COALESCE(
                    (SELECT jsonb_agg(elem ORDER BY ord)
                     FROM jsonb_array_elements(attachments) WITH ORDINALITY AS a(elem, ord)
                     WHERE elem->>'id' <> $2),
                    '[]'::jsonb),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .bind(attachment_id.to_string())
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Task::from))
    }

    /// Deletes a task; its comments cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
