/// Project model and database operations
///
/// A project is the unit of tenancy: it owns its tasks and its activity
/// feed, and its owner/member set decides who may touch either.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     color VARCHAR(7) NOT NULL DEFAULT '#3B82F6',
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     member_ids UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Membership lives in the `member_ids` array so that adding or removing a
/// member is one conditional `UPDATE ... RETURNING` on a single row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Color assigned to projects created without one
pub const DEFAULT_PROJECT_COLOR: &str = "#3B82F6";

/// Project document
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,

    /// Hex color (`#RRGGBB`) used by clients for the project badge
    pub color: String,

    /// Creator of the project; immutable
    pub owner_id: Uuid,

    /// Explicit members. Creation seeds this with the owner, but access
    /// checks treat the owner as a member regardless.
    pub member_ids: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// True for the owner and for every explicit member
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.is_owner(user_id) || self.member_ids.contains(&user_id)
    }
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub color: String,
    pub owner_id: Uuid,
}

/// Partial update for a project; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

const PROJECT_COLUMNS: &str =
    "id, name, description, color, owner_id, member_ids, created_at, updated_at";

impl Project {
    /// Inserts a project with its owner as the first member
    pub async fn create(pool: &PgPool, data: NewProject) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO projects (id, name, description, color, owner_id, member_ids)
            VALUES ($1, $2, $3, $4, $5, ARRAY[$5]::UUID[])
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(Uuid::new_v4())
            .bind(data.name)
            .bind(data.description)
            .bind(data.color)
            .bind(data.owner_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");

        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists projects the user owns or belongs to, most recently updated first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE owner_id = $1 OR $1 = ANY(member_ids)
            ORDER BY updated_at DESC
            "#
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY updated_at DESC");

        sqlx::query_as::<_, Project>(&sql).fetch_all(pool).await
    }

    /// Applies a partial update; returns `None` if the project is gone
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                color = COALESCE($4, color),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.description)
            .bind(changes.color)
            .fetch_optional(pool)
            .await
    }

    /// Appends a member unless already present
    ///
    /// The membership test and the append happen in one statement, so two
    /// concurrent adds of the same user cannot both succeed. Returns `None`
    /// when the user is already a member or the project doesn't exist.
    pub async fn add_member(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE projects
            SET member_ids = array_append(member_ids, $2),
                updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(member_ids))
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Removes a member (no-op if absent); returns `None` if the project is gone
    pub async fn remove_member(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE projects
            SET member_ids = array_remove(member_ids, $2),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a project; tasks, comments, and activities cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
