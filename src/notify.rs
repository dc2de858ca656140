//! Completion notifications via ntfy

use crate::config::NtfyConfig;
use crate::error::{Error, Result};
use crate::organizer::RunStatistics;
use std::time::Duration;
use tracing::{error, info};

/// Request timeout for the notification POST
const TIMEOUT: Duration = Duration::from_secs(10);

/// Publishes messages to an ntfy topic
#[derive(Debug, Clone)]
pub struct Notifier {
    config: NtfyConfig,
}

impl Notifier {
    pub fn new(config: NtfyConfig) -> Self {
        Self { config }
    }

    /// Full topic URL, e.g. `https://ntfy.sh/my-topic`
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.config.server.trim_end_matches('/'),
            self.config.topic.trim_start_matches('/')
        )
    }

    /// POST a message to the topic
    pub fn send(&self, message: &str) -> Result<()> {
        ureq::post(&self.url())
            .timeout(TIMEOUT)
            .set("Priority", &self.config.priority.to_string())
            .set("Tags", &self.config.tags)
            .send_bytes(message.as_bytes())
            .map_err(|e| Error::Notification(e.to_string()))?;
        Ok(())
    }

    /// Send the run summary; failures are logged and swallowed
    pub fn notify_completion(&self, stats: &RunStatistics) -> bool {
        match self.send(&stats.notification_message()) {
            Ok(()) => {
                info!(topic = %self.config.topic, "Sent completion notification");
                true
            }
            Err(e) => {
                error!(topic = %self.config.topic, error = %e, "Failed to send notification");
                false
            }
        }
    }
}
