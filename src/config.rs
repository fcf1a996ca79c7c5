//! Configuration types.

use secrecy::SecretString;

use crate::error::{ConfigError, Result};

/// Port the webhook server binds on unless `LAB_ASSIST_PORT` overrides it.
const DEFAULT_PORT: u16 = 3000;

/// Service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the webhook server listens on.
    pub port: u16,
    /// Slack bot token (`xoxb-…`) used for Web API calls.
    pub bot_token: SecretString,
    /// Shared secret checked against the `token` field of every inbound payload.
    pub verification_token: SecretString,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let bot_token = require_env("SLACK_BOT_TOKEN")?;
        let verification_token = require_env("SLACK_VERIFICATION_TOKEN")?;

        let port = match std::env::var("LAB_ASSIST_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "LAB_ASSIST_PORT".into(),
                message: format!("not a port number: {raw}"),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            bot_token,
            verification_token,
        })
    }
}

fn require_env(key: &str) -> std::result::Result<SecretString, ConfigError> {
    std::env::var(key)
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}
