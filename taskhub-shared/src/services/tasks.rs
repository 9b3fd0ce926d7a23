/// Task lifecycle: create, read, partial update, delete
///
/// Tasks have no ACL of their own; every operation authorizes against the
/// parent project. Assignment changes notify the assignee by email through
/// the detached dispatcher.

use std::sync::Arc;
use uuid::Uuid;

use super::effects::{Effect, EffectRunner};
use super::{activity, load_project, load_task, validation};
use crate::auth::access::{authorize, Action, Actor, Resource};
use crate::error::{ServiceError, ServiceResult};
use crate::ids::parse_id;
use crate::models::project::Project;
use crate::models::task::{NewTask, Task, TaskChanges, TaskFilter, TaskPriority, TaskStatus};
use crate::models::user::User;
use crate::notify::AssignmentNotice;
use crate::store::Store;

#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    /// Assignee user id
    pub assignee: Option<String>,
    pub position: Option<f64>,
}

/// Partial update
///
/// Outer `None` means "not sent". For `description`, `due_date`, and
/// `assignee`, `Some(None)` clears the field; `position: Some(None)` resets
/// it to 0.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<Option<String>>,
    pub assignee: Option<Option<String>>,
    pub position: Option<Option<f64>>,
}

fn parse_status(raw: &str) -> ServiceResult<TaskStatus> {
    raw.parse().map_err(|_| {
        ServiceError::validation("Status must be one of: To Do, In Progress, Done")
    })
}

fn parse_priority(raw: &str) -> ServiceResult<TaskPriority> {
    raw.parse()
        .map_err(|_| ServiceError::validation("Priority must be one of: Low, Medium, High"))
}

fn assignment_notice(actor: &Actor, task: &Task, project: &Project, assignee: &User) -> AssignmentNotice {
    AssignmentNotice {
        to: assignee.email.clone(),
        task_title: task.title.clone(),
        project_name: project.name.clone(),
        assigner_name: actor.name.clone(),
    }
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
    effects: EffectRunner,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>, effects: EffectRunner) -> Self {
        Self { store, effects }
    }

    /// Looks up an assignee by id
    ///
    /// Malformed or unknown ids resolve to `None`; the caller drops them
    /// rather than failing the request.
    async fn resolve_assignee(&self, raw: &str) -> ServiceResult<Option<User>> {
        let Ok(id) = parse_id(raw, "User") else {
            tracing::warn!(assignee = %raw, "Ignoring malformed assignee id");
            return Ok(None);
        };

        let user = self.store.find_user(id).await?;
        if user.is_none() {
            tracing::warn!(assignee_id = %id, "Ignoring unknown assignee");
        }
        Ok(user)
    }

    pub async fn create(&self, actor: &Actor, project_id: Uuid, input: TaskInput) -> ServiceResult<Task> {
        let project = load_project(self.store.as_ref(), project_id).await?;
        authorize(actor, Action::CreateTask, Resource::Project(&project)).into_result()?;

        let title = validation::task_title(&input.title)?;
        let description = input
            .description
            .as_deref()
            .map(validation::task_description)
            .transpose()?;
        let status = input.status.as_deref().map(parse_status).transpose()?;
        let priority = input.priority.as_deref().map(parse_priority).transpose()?;
        let due_date = input.due_date.as_deref().map(validation::due_date).transpose()?;

        let assignee = match input.assignee.as_deref().filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => self.resolve_assignee(raw).await?,
            None => None,
        };

        let task = self
            .store
            .insert_task(NewTask {
                title,
                description,
                status: status.unwrap_or(TaskStatus::Todo),
                priority: priority.unwrap_or(TaskPriority::Medium),
                due_date,
                project_id: project.id,
                assignee_id: assignee.as_ref().map(|u| u.id),
                created_by: actor.id,
                position: input.position.unwrap_or(0.0),
            })
            .await?;

        let mut effects = vec![Effect::RecordActivity(activity::task_created(actor, &task))];
        if let Some(assignee) = &assignee {
            effects.push(Effect::RecordActivity(activity::task_assigned(actor, &task, assignee)));
            effects.push(Effect::Notify(assignment_notice(actor, &task, &project, assignee)));
        }
        self.effects.run(effects).await?;

        tracing::info!(task_id = %task.id, project_id = %project.id, "Task created");
        Ok(task)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> ServiceResult<Task> {
        let (task, project) = load_task(self.store.as_ref(), id).await?;
        authorize(
            actor,
            Action::ViewTask,
            Resource::Task {
                task: &task,
                project: &project,
            },
        )
        .into_result()?;

        Ok(task)
    }

    /// Lists a project's tasks in board order, optionally filtered
    pub async fn list(
        &self,
        actor: &Actor,
        project_id: Uuid,
        status: Option<&str>,
        assignee: Option<&str>,
    ) -> ServiceResult<Vec<Task>> {
        let project = load_project(self.store.as_ref(), project_id).await?;
        authorize(actor, Action::ViewProject, Resource::Project(&project)).into_result()?;

        let filter = TaskFilter {
            project_id: project.id,
            status: status.map(parse_status).transpose()?,
            assignee_id: assignee
                .map(|raw| {
                    parse_id(raw, "User")
                        .map_err(|_| ServiceError::validation("Assignee filter must be a user id"))
                })
                .transpose()?,
        };

        Ok(self.store.list_tasks(&filter).await?)
    }

    /// Applies a partial update and records what changed
    ///
    /// A `task_updated` activity is recorded on every call, even when the
    /// patch changes nothing. A status change additionally records
    /// `task_status_changed`; a new, resolvable assignee records
    /// `task_assigned` and is notified.
    pub async fn update(&self, actor: &Actor, id: Uuid, patch: TaskPatch) -> ServiceResult<Task> {
        let (task, project) = load_task(self.store.as_ref(), id).await?;
        authorize(
            actor,
            Action::UpdateTask,
            Resource::Task {
                task: &task,
                project: &project,
            },
        )
        .into_result()?;

        let old_status = task.status;
        let old_assignee = task.assignee_id;

        // An assignee that does not resolve leaves the current one in place
        let new_assignee = match &patch.assignee {
            Some(Some(raw)) if !raw.trim().is_empty() => self.resolve_assignee(raw).await?.map(Some),
            Some(_) => Some(None),
            None => None,
        };

        let changes = TaskChanges {
            title: patch.title.as_deref().map(validation::task_title).transpose()?,
            description: match patch.description {
                Some(Some(raw)) => Some(Some(validation::task_description(&raw)?)),
                Some(None) => Some(None),
                None => None,
            },
            status: patch.status.as_deref().map(parse_status).transpose()?,
            priority: patch.priority.as_deref().map(parse_priority).transpose()?,
            due_date: match patch.due_date {
                Some(Some(raw)) => Some(Some(validation::due_date(&raw)?)),
                Some(None) => Some(None),
                None => None,
            },
            assignee_id: new_assignee
                .as_ref()
                .map(|assignee| assignee.as_ref().map(|u| u.id)),
            position: patch.position.map(|p| p.unwrap_or(0.0)),
        };

        let updated = self
            .store
            .update_task(task.id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))?;

        let mut effects = Vec::new();
        if updated.status != old_status {
            effects.push(Effect::RecordActivity(activity::task_status_changed(
                actor,
                &updated,
                old_status,
                updated.status,
            )));
        }
        if let Some(Some(assignee)) = &new_assignee {
            if old_assignee != Some(assignee.id) {
                effects.push(Effect::RecordActivity(activity::task_assigned(actor, &updated, assignee)));
                effects.push(Effect::Notify(assignment_notice(actor, &updated, &project, assignee)));
            }
        }
        effects.push(Effect::RecordActivity(activity::task_updated(actor, &updated)));
        self.effects.run(effects).await?;

        Ok(updated)
    }

    /// Deletes a task
    ///
    /// Order: `task_deleted` activity, best-effort blob delete for every
    /// attachment, then the task record (its comments go with it).
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        let (task, project) = load_task(self.store.as_ref(), id).await?;
        authorize(
            actor,
            Action::DeleteTask,
            Resource::Task {
                task: &task,
                project: &project,
            },
        )
        .into_result()?;

        let mut effects = vec![Effect::RecordActivity(activity::task_deleted(actor, &task))];
        effects.extend(task.attachments.iter().map(|a| Effect::DeleteBlob { key: a.key.clone() }));
        self.effects.run(effects).await?;

        if !self.store.delete_task(task.id).await? {
            return Err(ServiceError::not_found("Task"));
        }

        tracing::info!(task_id = %task.id, actor_id = %actor.id, "Task deleted");
        Ok(())
    }
}
