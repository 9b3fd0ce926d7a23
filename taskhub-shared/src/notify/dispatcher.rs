use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;

use super::{AssignmentNotice, Notifier};

/// Upper bound on a single send
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(8);

/// Fire-and-forget sender for assignment notices
///
/// Each dispatch runs on its own spawned task, tracked so that shutdown (and
/// tests) can wait for in-flight sends with [`drain`]. The caller never sees
/// the outcome.
///
/// [`drain`]: NotificationDispatcher::drain
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    tracker: TaskTracker,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_timeout(notifier, DEFAULT_NOTIFY_TIMEOUT)
    }

    pub fn with_timeout(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self {
            notifier,
            tracker: TaskTracker::new(),
            timeout,
        }
    }

    /// Starts sending `notice` in the background and returns immediately
    pub fn dispatch(&self, notice: AssignmentNotice) {
        let notifier = self.notifier.clone();
        let timeout = self.timeout;

        self.tracker.spawn(async move {
            match tokio::time::timeout(timeout, notifier.send_assignment_notice(&notice)).await {
                Ok(outcome) if outcome.success => {
                    tracing::info!(to = %notice.to, detail = %outcome.detail, "Assignment notice sent");
                }
                Ok(outcome) => {
                    tracing::warn!(to = %notice.to, detail = %outcome.detail, "Assignment notice not sent");
                }
                Err(_) => {
                    tracing::warn!(
                        to = %notice.to,
                        timeout_secs = timeout.as_secs(),
                        "Assignment notice timed out"
                    );
                }
            }
        });
    }

    /// Number of sends still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every dispatched send has finished or timed out
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
