/// Activity feed: description rendering and paginated listing
///
/// Descriptions are rendered once, at write time, from the names current at
/// that moment. Renaming a task later does not rewrite history.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::load_project;
use crate::auth::access::{authorize, Action, Actor, Resource};
use crate::error::ServiceResult;
use crate::models::activity::{Activity, ActivityType, NewActivity};
use crate::models::task::{Task, TaskStatus};
use crate::models::user::User;
use crate::store::Store;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 50;

/// Display name used when a removed member no longer exists
pub const FORMER_USER: &str = "a former user";

fn task_activity(kind: ActivityType, actor: &Actor, task: &Task, description: String) -> NewActivity {
    NewActivity {
        kind,
        description,
        project_id: task.project_id,
        task_id: Some(task.id),
        user_id: actor.id,
        metadata: json!({}),
    }
}

pub(crate) fn task_created(actor: &Actor, task: &Task) -> NewActivity {
    let description = format!("{} created task \"{}\"", actor.name, task.title);
    task_activity(ActivityType::TaskCreated, actor, task, description)
}

pub(crate) fn task_updated(actor: &Actor, task: &Task) -> NewActivity {
    let description = format!("{} updated task \"{}\"", actor.name, task.title);
    task_activity(ActivityType::TaskUpdated, actor, task, description)
}

pub(crate) fn task_deleted(actor: &Actor, task: &Task) -> NewActivity {
    let description = format!("{} deleted task \"{}\"", actor.name, task.title);
    task_activity(ActivityType::TaskDeleted, actor, task, description)
}

pub(crate) fn task_assigned(actor: &Actor, task: &Task, assignee: &User) -> NewActivity {
    let description = format!(
        "{} assigned task \"{}\" to {}",
        actor.name, task.title, assignee.name
    );
    NewActivity {
        metadata: json!({ "assigneeId": assignee.id }),
        ..task_activity(ActivityType::TaskAssigned, actor, task, description)
    }
}

pub(crate) fn task_status_changed(
    actor: &Actor,
    task: &Task,
    old_status: TaskStatus,
    new_status: TaskStatus,
) -> NewActivity {
    let description = format!(
        "{} moved task \"{}\" from {} to {}",
        actor.name, task.title, old_status, new_status
    );
    NewActivity {
        metadata: json!({
            "oldStatus": old_status.as_str(),
            "newStatus": new_status.as_str(),
        }),
        ..task_activity(ActivityType::TaskStatusChanged, actor, task, description)
    }
}

pub(crate) fn comment_added(actor: &Actor, task: &Task, comment_id: Uuid) -> NewActivity {
    let description = format!("{} commented on task \"{}\"", actor.name, task.title);
    NewActivity {
        metadata: json!({ "commentId": comment_id }),
        ..task_activity(ActivityType::CommentAdded, actor, task, description)
    }
}

pub(crate) fn member_added(actor: &Actor, project_id: Uuid, member: &User) -> NewActivity {
    NewActivity {
        kind: ActivityType::MemberAdded,
        description: format!("{} added {} to the project", actor.name, member.name),
        project_id,
        task_id: None,
        user_id: actor.id,
        metadata: json!({ "memberId": member.id }),
    }
}

pub(crate) fn member_removed(
    actor: &Actor,
    project_id: Uuid,
    member_id: Uuid,
    member_name: &str,
) -> NewActivity {
    NewActivity {
        kind: ActivityType::MemberRemoved,
        description: format!("{} removed {} from the project", actor.name, member_name),
        project_id,
        task_id: None,
        user_id: actor.id,
        metadata: json!({ "memberId": member_id }),
    }
}

/// One page of a project's feed
#[derive(Debug, Clone, Serialize)]
pub struct ActivityPage {
    pub activities: Vec<Activity>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn Store>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Lists a project's activities, newest first
    ///
    /// `page` is 1-based and clamped to at least 1; `limit` defaults to
    /// [`DEFAULT_PAGE_SIZE`] and is clamped to `1..=MAX_PAGE_SIZE`.
    pub async fn list(
        &self,
        actor: &Actor,
        project_id: Uuid,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> ServiceResult<ActivityPage> {
        let project = load_project(self.store.as_ref(), project_id).await?;
        authorize(actor, Action::ViewProject, Resource::Project(&project)).into_result()?;

        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(limit);

        let activities = self.store.list_activities(project.id, offset, limit).await?;
        let total = self.store.count_activities(project.id).await?;

        Ok(ActivityPage {
            activities,
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        })
    }
}
