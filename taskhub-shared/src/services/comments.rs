use std::sync::Arc;
use uuid::Uuid;

use super::effects::{Effect, EffectRunner};
use super::{activity, load_task, validation};
use crate::auth::access::{authorize, Action, Actor, Resource};
use crate::error::{ServiceError, ServiceResult};
use crate::models::comment::{Comment, NewComment};
use crate::models::project::Project;
use crate::store::Store;

/// Task comments
///
/// Creating and listing follow project membership; editing belongs to the
/// author, deleting to the author or the project owner.
#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn Store>,
    effects: EffectRunner,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>, effects: EffectRunner) -> Self {
        Self { store, effects }
    }

    async fn load_with_project(&self, id: Uuid) -> ServiceResult<(Comment, Project)> {
        let comment = self
            .store
            .find_comment(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comment"))?;
        let (_task, project) = load_task(self.store.as_ref(), comment.task_id)
            .await
            .map_err(|e| match e {
                ServiceError::NotFound(_) => ServiceError::not_found("Comment"),
                other => other,
            })?;

        Ok((comment, project))
    }

    pub async fn create(&self, actor: &Actor, task_id: Uuid, content: &str) -> ServiceResult<Comment> {
        let (task, project) = load_task(self.store.as_ref(), task_id).await?;
        authorize(
            actor,
            Action::CreateComment,
            Resource::Task {
                task: &task,
                project: &project,
            },
        )
        .into_result()?;

        let content = validation::comment_content(content)?;
        let comment = self
            .store
            .insert_comment(NewComment {
                content,
                task_id: task.id,
                author_id: actor.id,
            })
            .await?;

        self.effects
            .run(vec![Effect::RecordActivity(activity::comment_added(actor, &task, comment.id))])
            .await?;

        Ok(comment)
    }

    /// A task's comments, oldest first
    pub async fn list(&self, actor: &Actor, task_id: Uuid) -> ServiceResult<Vec<Comment>> {
        let (task, project) = load_task(self.store.as_ref(), task_id).await?;
        authorize(
            actor,
            Action::ViewComments,
            Resource::Task {
                task: &task,
                project: &project,
            },
        )
        .into_result()?;

        Ok(self.store.list_comments(task.id).await?)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, content: &str) -> ServiceResult<Comment> {
        let (comment, project) = self.load_with_project(id).await?;
        authorize(
            actor,
            Action::EditComment,
            Resource::Comment {
                comment: &comment,
                project: &project,
            },
        )
        .into_result()?;

        let content = validation::comment_content(content)?;
        self.store
            .update_comment_content(comment.id, content)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comment"))
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        let (comment, project) = self.load_with_project(id).await?;
        authorize(
            actor,
            Action::DeleteComment,
            Resource::Comment {
                comment: &comment,
                project: &project,
            },
        )
        .into_result()?;

        if !self.store.delete_comment(comment.id).await? {
            return Err(ServiceError::not_found("Comment"));
        }
        Ok(())
    }
}
