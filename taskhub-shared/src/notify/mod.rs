/// Assignment notifications
///
/// Email is a side channel: a notice is handed to the
/// [`NotificationDispatcher`], which sends it on a detached task with a time
/// bound and only logs the outcome. Nothing a mail relay does can fail or
/// slow down the mutation that triggered it.

mod dispatcher;
mod mail;

pub use dispatcher::{NotificationDispatcher, DEFAULT_NOTIFY_TIMEOUT};
pub use mail::{DisabledNotifier, HttpMailNotifier, MailConfig};

use async_trait::async_trait;

/// Email telling a user they were assigned a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentNotice {
    /// Recipient address
    pub to: String,
    pub task_title: String,
    pub project_name: String,
    pub assigner_name: String,
}

impl AssignmentNotice {
    pub fn subject(&self) -> String {
        format!("You have been assigned: {}", self.task_title)
    }

    pub fn body(&self) -> String {
        format!(
            "{} assigned you the task \"{}\" in project \"{}\".",
            self.assigner_name, self.task_title, self.project_name
        )
    }
}

/// What happened to a send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOutcome {
    pub success: bool,
    pub detail: String,
}

impl NotificationOutcome {
    pub fn sent(detail: impl Into<String>) -> Self {
        Self {
            success: true,
            detail: detail.into(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: detail.into(),
        }
    }
}

/// Delivers notices; failures are reported in the outcome, never raised
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_assignment_notice(&self, notice: &AssignmentNotice) -> NotificationOutcome;
}
