/// Projects and their member lists

use std::sync::Arc;
use uuid::Uuid;

use super::effects::{Effect, EffectRunner};
use super::{activity, load_project, validation};
use crate::auth::access::{authorize, Action, Actor, Resource};
use crate::error::{ServiceError, ServiceResult};
use crate::models::project::{NewProject, Project, ProjectChanges, DEFAULT_PROJECT_COLOR};
use crate::models::task::TaskFilter;
use crate::store::Store;

#[derive(Debug, Clone, Default)]
pub struct ProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Partial update; absent fields stay as they are
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn Store>,
    effects: EffectRunner,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>, effects: EffectRunner) -> Self {
        Self { store, effects }
    }

    /// Creates a project owned by the actor, who also becomes its first member
    pub async fn create(&self, actor: &Actor, input: ProjectInput) -> ServiceResult<Project> {
        let name = validation::project_name(&input.name)?;
        let description = validation::project_description(input.description.as_deref().unwrap_or(""))?;
        let color = match input.color.as_deref() {
            Some(raw) => validation::color(raw)?,
            None => DEFAULT_PROJECT_COLOR.to_string(),
        };

        let project = self
            .store
            .insert_project(NewProject {
                name,
                description,
                color,
                owner_id: actor.id,
            })
            .await?;

        tracing::info!(project_id = %project.id, owner_id = %actor.id, "Project created");
        Ok(project)
    }

    /// Projects the actor owns or belongs to; every project for admins
    pub async fn list(&self, actor: &Actor) -> ServiceResult<Vec<Project>> {
        if actor.is_admin() {
            Ok(self.store.list_all_projects().await?)
        } else {
            Ok(self.store.list_projects_for_user(actor.id).await?)
        }
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> ServiceResult<Project> {
        let project = load_project(self.store.as_ref(), id).await?;
        authorize(actor, Action::ViewProject, Resource::Project(&project)).into_result()?;
        Ok(project)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, patch: ProjectPatch) -> ServiceResult<Project> {
        let project = load_project(self.store.as_ref(), id).await?;
        authorize(actor, Action::UpdateProject, Resource::Project(&project)).into_result()?;

        let changes = ProjectChanges {
            name: patch.name.as_deref().map(validation::project_name).transpose()?,
            description: patch
                .description
                .as_deref()
                .map(validation::project_description)
                .transpose()?,
            color: patch.color.as_deref().map(validation::color).transpose()?,
        };

        self.store
            .update_project(project.id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project"))
    }

    /// Deletes the project with everything under it
    ///
    /// Attachment blobs of every task are removed best-effort first; the
    /// store then cascades tasks, comments, and activities.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        let project = load_project(self.store.as_ref(), id).await?;
        authorize(actor, Action::DeleteProject, Resource::Project(&project)).into_result()?;

        let tasks = self.store.list_tasks(&TaskFilter::project(project.id)).await?;
        let cleanup: Vec<Effect> = tasks
            .iter()
            .flat_map(|task| task.attachments.iter())
            .map(|attachment| Effect::DeleteBlob {
                key: attachment.key.clone(),
            })
            .collect();
        self.effects.run(cleanup).await?;

        if !self.store.delete_project(project.id).await? {
            return Err(ServiceError::not_found("Project"));
        }

        tracing::info!(project_id = %project.id, actor_id = %actor.id, tasks = tasks.len(), "Project deleted");
        Ok(())
    }

    /// Adds an existing user to the member list
    ///
    /// # Errors
    ///
    /// - `NotFound` if the project or the user doesn't exist
    /// - `Conflict` if the user is already a member (membership unchanged)
    pub async fn add_member(&self, actor: &Actor, id: Uuid, user_id: Uuid) -> ServiceResult<Project> {
        let project = load_project(self.store.as_ref(), id).await?;
        authorize(actor, Action::AddMember, Resource::Project(&project)).into_result()?;

        let member = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;

        let already_member = || ServiceError::Conflict("User is already a member of this project".to_string());
        if project.member_ids.contains(&member.id) {
            return Err(already_member());
        }

        // The store re-checks membership atomically
        let Some(updated) = self.store.add_project_member(project.id, member.id).await? else {
            return match self.store.find_project(project.id).await? {
                Some(_) => Err(already_member()),
                None => Err(ServiceError::not_found("Project")),
            };
        };

        self.effects
            .run(vec![Effect::RecordActivity(activity::member_added(
                actor, updated.id, &member,
            ))])
            .await?;

        Ok(updated)
    }

    /// Removes a member; the owner can never be removed
    pub async fn remove_member(&self, actor: &Actor, id: Uuid, user_id: Uuid) -> ServiceResult<Project> {
        let project = load_project(self.store.as_ref(), id).await?;
        authorize(
            actor,
            Action::RemoveMember { target: user_id },
            Resource::Project(&project),
        )
        .into_result()?;

        if !project.member_ids.contains(&user_id) {
            return Err(ServiceError::NotFound(
                "User is not a member of this project".to_string(),
            ));
        }

        let updated = self
            .store
            .remove_project_member(project.id, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project"))?;

        let member_name = match self.store.find_user(user_id).await {
            Ok(Some(user)) => user.name,
            Ok(None) => activity::FORMER_USER.to_string(),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Could not resolve removed member name");
                activity::FORMER_USER.to_string()
            }
        };

        self.effects
            .run(vec![Effect::RecordActivity(activity::member_removed(
                actor,
                updated.id,
                user_id,
                &member_name,
            ))])
            .await?;

        Ok(updated)
    }
}
