/// Activity model: the append-only audit feed of a project
///
/// Activities are written after (or, for deletions, just before) a
/// mutation and are never updated. They go away only when their project is
/// deleted. `task_id` is a historical reference with no foreign key, so a
/// `task_deleted` entry keeps pointing at the id of a task that no longer
/// exists.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE activity_type AS ENUM (
///     'task_created', 'task_updated', 'task_deleted', 'task_assigned',
///     'task_status_changed', 'comment_added', 'member_added', 'member_removed'
/// );
///
/// CREATE TABLE activities (
///     id UUID PRIMARY KEY,
///     activity_type activity_type NOT NULL,
///     description TEXT NOT NULL,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     task_id UUID,
///     user_id UUID NOT NULL,
///     metadata JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX activities_project_created_idx ON activities (project_id, created_at DESC);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

/// Kind of audited event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    TaskAssigned,
    TaskStatusChanged,
    CommentAdded,
    MemberAdded,
    MemberRemoved,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::TaskCreated => "task_created",
            ActivityType::TaskUpdated => "task_updated",
            ActivityType::TaskDeleted => "task_deleted",
            ActivityType::TaskAssigned => "task_assigned",
            ActivityType::TaskStatusChanged => "task_status_changed",
            ActivityType::CommentAdded => "comment_added",
            ActivityType::MemberAdded => "member_added",
            ActivityType::MemberRemoved => "member_removed",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    pub id: Uuid,

    #[serde(rename = "type")]
    #[sqlx(rename = "activity_type")]
    pub kind: ActivityType,

    /// Human-readable sentence rendered at write time
    pub description: String,

    pub project_id: Uuid,
    pub task_id: Option<Uuid>,

    /// Actor who triggered the event
    pub user_id: Uuid,

    /// Free-form details (e.g. `oldStatus` / `newStatus`)
    pub metadata: JsonValue,

    pub created_at: DateTime<Utc>,
}

/// Input for appending an activity
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub kind: ActivityType,
    pub description: String,
    pub project_id: Uuid,
    pub task_id: Option<Uuid>,
    pub user_id: Uuid,
    pub metadata: JsonValue,
}

impl Activity {
    pub async fn create(pool: &PgPool, data: NewActivity) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Activity>(
            r#"
            INSERT INTO activities (id, activity_type, description, project_id, task_id, user_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, activity_type, description, project_id, task_id, user_id, metadata, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.kind)
        .bind(data.description)
        .bind(data.project_id)
        .bind(data.task_id)
        .bind(data.user_id)
        .bind(data.metadata)
        .fetch_one(pool)
        .await
    }

    /// Lists a project's activities, newest first
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, activity_type, description, project_id, task_id, user_id, metadata, created_at
            FROM activities
            WHERE project_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_project(pool: &PgPool, project_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM activities WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_serializes_kind_as_type() {
        let activity = Activity {
            id: Uuid::new_v4(),
            kind: ActivityType::TaskStatusChanged,
            description: "Ada moved \"Ship\" from To Do to Done".to_string(),
            project_id: Uuid::new_v4(),
            task_id: None,
            user_id: Uuid::new_v4(),
            metadata: serde_json::json!({ "oldStatus": "To Do", "newStatus": "Done" }),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "task_status_changed");
        assert!(json.get("kind").is_none());
    }
}
