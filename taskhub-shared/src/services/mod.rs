/// Domain services
///
/// Every operation follows the same shape: parse and load, ask
/// [`authorize`](crate::auth::access::authorize), validate, mutate through the
/// [`Store`], then hand the resulting side effects to the
/// [`EffectRunner`](effects::EffectRunner).
///
/// Services receive all collaborators at construction and are cheap to
/// clone; [`Services`] bundles one of each for the HTTP layer.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_shared::notify::{DisabledNotifier, NotificationDispatcher};
/// use taskhub_shared::services::{AuthSettings, Services};
/// use taskhub_shared::store::MemoryStore;
///
/// let services = Services::new(
///     Arc::new(MemoryStore::new()),
///     None,
///     NotificationDispatcher::new(Arc::new(DisabledNotifier)),
///     AuthSettings {
///         jwt_secret: "a-secret-of-at-least-thirty-two-bytes!".to_string(),
///         token_ttl_hours: 168,
///     },
/// );
/// # let _ = services;
/// ```

pub mod activity;
pub mod attachments;
pub mod comments;
pub mod effects;
pub mod projects;
pub mod tasks;
pub mod users;
pub mod validation;

pub use activity::{ActivityPage, ActivityService};
pub use attachments::{AttachmentDownload, AttachmentService, AttachmentUpload};
pub use comments::CommentService;
pub use projects::{ProjectInput, ProjectPatch, ProjectService};
pub use tasks::{TaskInput, TaskPatch, TaskService};
pub use users::{AuthSession, AuthSettings, LoginInput, RegisterInput, UserService};

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::project::Project;
use crate::models::task::Task;
use crate::models::user::User;
use crate::notify::NotificationDispatcher;
use crate::storage::BlobStore;
use crate::store::Store;
use effects::EffectRunner;

/// One instance of every service, sharing the same collaborators
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub projects: ProjectService,
    pub tasks: TaskService,
    pub attachments: AttachmentService,
    pub comments: CommentService,
    pub activities: ActivityService,
}

impl Services {
    pub fn new(
        store: Arc<dyn Store>,
        blobs: Option<Arc<dyn BlobStore>>,
        dispatcher: NotificationDispatcher,
        auth: AuthSettings,
    ) -> Self {
        let effects = EffectRunner::new(store.clone(), blobs.clone(), dispatcher);

        Self {
            users: UserService::new(store.clone(), auth),
            projects: ProjectService::new(store.clone(), effects.clone()),
            tasks: TaskService::new(store.clone(), effects.clone()),
            attachments: AttachmentService::new(store.clone(), blobs, effects.clone()),
            comments: CommentService::new(store.clone(), effects),
            activities: ActivityService::new(store),
        }
    }
}

pub(crate) async fn load_project(store: &dyn Store, id: Uuid) -> ServiceResult<Project> {
    store
        .find_project(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Project"))
}

/// Loads a task together with the project it belongs to
pub(crate) async fn load_task(store: &dyn Store, id: Uuid) -> ServiceResult<(Task, Project)> {
    let task = store
        .find_task(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Task"))?;

    // A task without its project is treated as already gone
    let project = store
        .find_project(task.project_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Task"))?;

    Ok((task, project))
}

pub(crate) async fn load_user(store: &dyn Store, id: Uuid) -> ServiceResult<User> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))
}
