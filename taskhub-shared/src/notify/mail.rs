use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{AssignmentNotice, NotificationOutcome, Notifier};

/// Mail relay settings
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Endpoint accepting `POST` of a JSON message
    pub relay_url: String,
    pub token: Option<String>,
    pub from: String,
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    text: String,
}

/// Sends notices through an HTTP mail relay
///
/// The relay receives `{from, to, subject, text}` as JSON with an optional
/// bearer token. Any non-2xx response counts as a failed send.
pub struct HttpMailNotifier {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailNotifier {
    pub fn new(config: MailConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("taskhub/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Notifier for HttpMailNotifier {
    async fn send_assignment_notice(&self, notice: &AssignmentNotice) -> NotificationOutcome {
        let message = RelayMessage {
            from: &self.config.from,
            to: &notice.to,
            subject: notice.subject(),
            text: notice.body(),
        };

        let mut request = self.client.post(&self.config.relay_url).json(&message);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return NotificationOutcome::failed(format!("mail relay unreachable: {}", e)),
        };

        let status = response.status();
        if status.is_success() {
            NotificationOutcome::sent(format!("mail relay accepted message ({})", status))
        } else {
            NotificationOutcome::failed(format!("mail relay returned {}", status))
        }
    }
}

/// Stand-in used when no mail relay is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send_assignment_notice(&self, _notice: &AssignmentNotice) -> NotificationOutcome {
        NotificationOutcome::failed("email not configured")
    }
}
