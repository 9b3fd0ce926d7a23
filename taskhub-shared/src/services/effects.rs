/// Post-mutation side effects
///
/// Services describe what should happen after a mutation as a list of
/// [`Effect`]s and hand it to the [`EffectRunner`], which executes them in
/// order. Each kind has a fixed failure policy:
///
/// | Effect           | Execution                 | On failure             |
/// |------------------|---------------------------|------------------------|
/// | `RecordActivity` | awaited                   | error propagates       |
/// | `DeleteBlob`     | awaited                   | logged, run continues  |
/// | `Notify`         | detached, time-bounded    | logged by dispatcher   |
///
/// There is no transaction around a mutation and its effects: an activity
/// write that fails after the primary write leaves the primary write in place.

use std::sync::Arc;

use crate::error::{ServiceError, ServiceResult};
use crate::models::activity::NewActivity;
use crate::notify::{AssignmentNotice, NotificationDispatcher};
use crate::storage::BlobStore;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RecordActivity(NewActivity),
    DeleteBlob { key: String },
    Notify(AssignmentNotice),
}

#[derive(Clone)]
pub struct EffectRunner {
    store: Arc<dyn Store>,
    blobs: Option<Arc<dyn BlobStore>>,
    dispatcher: NotificationDispatcher,
}

impl EffectRunner {
    pub fn new(
        store: Arc<dyn Store>,
        blobs: Option<Arc<dyn BlobStore>>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            blobs,
            dispatcher,
        }
    }

    /// Runs `effects` in order, stopping only at a failed activity write
    pub async fn run(&self, effects: Vec<Effect>) -> ServiceResult<()> {
        for effect in effects {
            match effect {
                Effect::RecordActivity(activity) => {
                    let kind = activity.kind;
                    self.store.insert_activity(activity).await.map_err(|e| {
                        tracing::error!(activity = %kind, error = %e, "Failed to record activity");
                        ServiceError::from(e)
                    })?;
                }
                Effect::DeleteBlob { key } => self.delete_blob_best_effort(&key).await,
                Effect::Notify(notice) => self.dispatcher.dispatch(notice),
            }
        }

        Ok(())
    }

    /// Deletes a blob, logging instead of failing
    pub async fn delete_blob_best_effort(&self, key: &str) {
        let Some(blobs) = &self.blobs else {
            tracing::warn!(key, "File storage is not configured; skipping blob delete");
            return;
        };

        if let Err(e) = blobs.delete(key).await {
            tracing::warn!(key, error = %e, "Failed to delete blob; continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::ActivityType;
    use crate::notify::DisabledNotifier;
    use crate::store::MemoryStore;
    use crate::testing::RecordingBlobStore;
    use uuid::Uuid;

    fn activity(project_id: Uuid) -> NewActivity {
        NewActivity {
            kind: ActivityType::TaskDeleted,
            description: "deleted".to_string(),
            project_id,
            task_id: None,
            user_id: Uuid::new_v4(),
            metadata: serde_json::json!({}),
        }
    }

    fn runner(store: Arc<MemoryStore>, blobs: Arc<RecordingBlobStore>) -> EffectRunner {
        EffectRunner::new(
            store,
            Some(blobs),
            NotificationDispatcher::new(Arc::new(DisabledNotifier)),
        )
    }

    #[tokio::test]
    async fn test_blob_failure_does_not_stop_later_effects() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(RecordingBlobStore::new());
        blobs.fail_deletes(true);
        let project_id = Uuid::new_v4();

        runner(store.clone(), blobs.clone())
            .run(vec![
                Effect::DeleteBlob { key: "task-attachments/a.txt".to_string() },
                Effect::RecordActivity(activity(project_id)),
            ])
            .await
            .unwrap();

        assert_eq!(blobs.delete_calls(), 1);
        assert_eq!(store.count_activities(project_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_activity_failure_propagates_and_stops() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(RecordingBlobStore::new());
        store.set_activity_writes_failing(true);

        let result = runner(store, blobs.clone())
            .run(vec![
                Effect::RecordActivity(activity(Uuid::new_v4())),
                Effect::DeleteBlob { key: "task-attachments/a.txt".to_string() },
            ])
            .await;

        assert!(matches!(result, Err(ServiceError::Store(_))));
        assert_eq!(blobs.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_blob_store_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let runner = EffectRunner::new(
            store,
            None,
            NotificationDispatcher::new(Arc::new(DisabledNotifier)),
        );

        runner
            .run(vec![Effect::DeleteBlob { key: "task-attachments/a.txt".to_string() }])
            .await
            .unwrap();
    }
}
