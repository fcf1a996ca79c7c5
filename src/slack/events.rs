//! Inbound webhook payload types.

use serde::Deserialize;

/// Envelope for `POST /slack/events`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// Slack's endpoint-ownership handshake.
    UrlVerification { token: String, challenge: String },
    /// A subscribed event wrapped in a callback.
    EventCallback { token: String, event: InnerEvent },
}

/// Events the bot subscribes to.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InnerEvent {
    /// A user opened the App Home tab.
    AppHomeOpened { user: String },
    /// Anything else delivered to the endpoint; acknowledged and dropped.
    #[serde(other)]
    Ignored,
}

/// Form body of `POST /slack/interact`; `payload` holds JSON.
#[derive(Debug, Deserialize)]
pub struct InteractForm {
    pub payload: String,
}

/// A `block_actions` interactivity payload.
#[derive(Debug, Deserialize)]
pub struct InteractPayload {
    pub token: String,
    pub user: InteractUser,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
}

/// The user who pressed the button.
#[derive(Debug, Deserialize)]
pub struct InteractUser {
    pub id: String,
}

/// One pressed interactive component.
#[derive(Debug, Deserialize)]
pub struct BlockAction {
    pub action_id: String,
}
