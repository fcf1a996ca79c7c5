//! Notification seam between the queue engine's callers and the chat platform.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SlackError;

/// The chat-platform surface the dispatch layer depends on.
///
/// The match engine itself never sends anything. Handlers mutate state
/// first and notify from the returned outcomes, so a failed send can
/// never roll back a committed transition.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a plain-text direct message to a user.
    async fn notify(&self, user_id: &str, text: &str) -> Result<(), SlackError>;

    /// Send a Block Kit direct message to a user.
    async fn notify_blocks(&self, user_id: &str, blocks: Vec<Value>) -> Result<(), SlackError>;

    /// Publish a user's App Home view.
    async fn publish_home(&self, user_id: &str, view: Value) -> Result<(), SlackError>;

    /// Resolve a user id to a display name.
    async fn display_name(&self, user_id: &str) -> Result<String, SlackError>;
}
