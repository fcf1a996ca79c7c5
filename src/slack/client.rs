//! Slack Web API client.
//!
//! Thin wrapper over the handful of Web API methods the bot calls.
//! Display names and IM channel ids are cached for the lifetime of the
//! process; a lab section's roster is small and stable.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::SlackError;
use crate::notify::Notifier;

const SLACK_API_BASE: &str = "https://slack.com/api";

/// Slack Web API client. Implements [`Notifier`] for the dispatch layer.
pub struct SlackClient {
    token: SecretString,
    http: reqwest::Client,
    names: RwLock<HashMap<String, String>>,
    im_channels: RwLock<HashMap<String, String>>,
}

impl SlackClient {
    pub fn new(token: SecretString) -> Self {
        Self {
            token,
            http: reqwest::Client::new(),
            names: RwLock::new(HashMap::new()),
            im_channels: RwLock::new(HashMap::new()),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{SLACK_API_BASE}/{method}")
    }

    /// POST a Web API method and check both the HTTP status and Slack's
    /// own `ok` field.
    async fn call(&self, method: &str, body: Value) -> Result<Value, SlackError> {
        let response = self
            .http
            .post(self.api_url(method))
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| SlackError::RequestFailed {
                method: method.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SlackError::RequestFailed {
                method: method.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let payload: Value = response.json().await.map_err(|e| SlackError::RequestFailed {
            method: method.to_string(),
            reason: e.to_string(),
        })?;

        if !payload["ok"].as_bool().unwrap_or(false) {
            let error = payload["error"].as_str().unwrap_or("unknown").to_string();
            return Err(SlackError::Api {
                method: method.to_string(),
                error,
            });
        }

        debug!(method, "Slack call ok");
        Ok(payload)
    }

    /// Identity check. Returns the bot's own user id.
    pub async fn auth_test(&self) -> Result<String, SlackError> {
        let payload = self.call("auth.test", json!({})).await?;
        payload["user_id"]
            .as_str()
            .map(str::to_string)
            .ok_or(SlackError::MissingField {
                method: "auth.test".to_string(),
                field: "user_id",
            })
    }

    /// Open (or fetch the cached) direct-message channel with a user.
    pub async fn im_channel(&self, user_id: &str) -> Result<String, SlackError> {
        if let Some(channel) = self.im_channels.read().await.get(user_id) {
            return Ok(channel.clone());
        }

        let payload = self
            .call("conversations.open", json!({ "users": user_id }))
            .await?;
        let channel = payload["channel"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or(SlackError::MissingField {
                method: "conversations.open".to_string(),
                field: "channel.id",
            })?;

        self.im_channels
            .write()
            .await
            .insert(user_id.to_string(), channel.clone());
        Ok(channel)
    }

    /// Post plain text to a channel.
    pub async fn post_text(&self, channel_id: &str, text: &str) -> Result<(), SlackError> {
        self.call(
            "chat.postMessage",
            json!({ "channel": channel_id, "text": text }),
        )
        .await
        .map(|_| ())
    }

    /// Post Block Kit blocks to a channel.
    pub async fn post_blocks(&self, channel_id: &str, blocks: &[Value]) -> Result<(), SlackError> {
        self.call(
            "chat.postMessage",
            json!({ "channel": channel_id, "blocks": blocks }),
        )
        .await
        .map(|_| ())
    }
}

/// Pick a human-readable name out of a `users.info` response, falling back
/// to the real name and finally the raw id.
fn name_from_user_info(payload: &Value, user_id: &str) -> String {
    let profile = &payload["user"]["profile"];
    profile["display_name"]
        .as_str()
        .filter(|name| !name.is_empty())
        .or_else(|| payload["user"]["real_name"].as_str())
        .unwrap_or(user_id)
        .to_string()
}

#[async_trait]
impl Notifier for SlackClient {
    async fn notify(&self, user_id: &str, text: &str) -> Result<(), SlackError> {
        let channel = self.im_channel(user_id).await?;
        self.post_text(&channel, text).await
    }

    async fn notify_blocks(&self, user_id: &str, blocks: Vec<Value>) -> Result<(), SlackError> {
        let channel = self.im_channel(user_id).await?;
        self.post_blocks(&channel, &blocks).await
    }

    async fn publish_home(&self, user_id: &str, view: Value) -> Result<(), SlackError> {
        self.call(
            "views.publish",
            json!({ "user_id": user_id, "view": view }),
        )
        .await
        .map(|_| ())
    }

    async fn display_name(&self, user_id: &str) -> Result<String, SlackError> {
        if let Some(name) = self.names.read().await.get(user_id) {
            return Ok(name.clone());
        }

        let payload = self.call("users.info", json!({ "user": user_id })).await?;
        let name = name_from_user_info(&payload, user_id);
        self.names
            .write()
            .await
            .insert(user_id.to_string(), name.clone());
        Ok(name)
    }
}
