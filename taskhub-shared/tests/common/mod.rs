/// Shared harness for the service tests
///
/// Builds a full [`Services`] bundle over the in-memory store with recording
/// fakes for blob storage and email, plus helpers for the usual fixtures.

use std::sync::Arc;
use taskhub_shared::auth::access::Actor;
use taskhub_shared::models::activity::{Activity, ActivityType};
use taskhub_shared::models::project::Project;
use taskhub_shared::models::task::Task;
use taskhub_shared::models::user::User;
use taskhub_shared::notify::NotificationDispatcher;
use taskhub_shared::services::{AuthSettings, ProjectInput, RegisterInput, Services, TaskInput};
use taskhub_shared::store::{MemoryStore, Store};
use taskhub_shared::testing::{RecordingBlobStore, RecordingNotifier};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";
pub const TEST_PASSWORD: &str = "password123";

pub struct TestContext {
    pub services: Services,
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<RecordingBlobStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub dispatcher: NotificationDispatcher,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(true)
    }

    /// A context whose file storage is not configured
    pub fn without_blob_store() -> Self {
        Self::build(false)
    }

    fn build(with_blobs: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(RecordingBlobStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = NotificationDispatcher::new(notifier.clone());

        let services = Services::new(
            store.clone(),
            with_blobs.then(|| blobs.clone() as Arc<dyn taskhub_shared::storage::BlobStore>),
            dispatcher.clone(),
            AuthSettings {
                jwt_secret: TEST_JWT_SECRET.to_string(),
                token_ttl_hours: 1,
            },
        );

        Self {
            services,
            store,
            blobs,
            notifier,
            dispatcher,
        }
    }

    /// Registers a regular user and returns it as an actor
    pub async fn user(&self, name: &str) -> Actor {
        let session = self
            .services
            .users
            .register(RegisterInput {
                name: name.to_string(),
                email: format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()),
                password: TEST_PASSWORD.to_string(),
            })
            .await
            .unwrap();
        Actor::from(&session.user)
    }

    pub async fn admin(&self, name: &str) -> Actor {
        let user = self
            .services
            .users
            .seed_admin(
                &format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()),
                TEST_PASSWORD,
                name,
            )
            .await
            .unwrap();
        Actor::from(&user)
    }

    pub async fn project(&self, owner: &Actor, name: &str) -> Project {
        self.services
            .projects
            .create(
                owner,
                ProjectInput {
                    name: name.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    pub async fn task(&self, actor: &Actor, project: &Project, title: &str) -> Task {
        self.services
            .tasks
            .create(
                actor,
                project.id,
                TaskInput {
                    title: title.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    pub async fn find_user(&self, id: Uuid) -> Option<User> {
        self.store.find_user(id).await.unwrap()
    }

    /// Every activity of a project, newest first
    pub async fn activities(&self, project_id: Uuid) -> Vec<Activity> {
        self.store.list_activities(project_id, 0, 1000).await.unwrap()
    }

    pub async fn activity_kinds(&self, project_id: Uuid) -> Vec<ActivityType> {
        self.activities(project_id)
            .await
            .into_iter()
            .map(|a| a.kind)
            .collect()
    }
}

impl TestContext {
    pub async fn store_task_count(&self, project_id: Uuid) -> usize {
        self.store
            .list_tasks(&taskhub_shared::models::task::TaskFilter::project(project_id))
            .await
            .unwrap()
            .len()
    }
}
