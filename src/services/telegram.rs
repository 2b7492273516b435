use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::services::notifier::Notifier;
use crate::utils::env_string;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Telegram Bot API notifier
pub struct TelegramNotifier {
    api_url: String,
    token: String,
    chat_id: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String, timeout_secs: u64) -> Result<Self> {
        if token.trim().is_empty() || chat_id.trim().is_empty() {
            return Err(Error::Config(
                "Telegram token and chat id must not be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_url: TELEGRAM_API_URL.to_string(),
            token,
            chat_id,
            client,
        })
    }

    /// Build from `TELEGRAM_TOKEN` / `TELEGRAM_CHAT_ID`, `None` when unset
    pub fn from_env(timeout_secs: u64) -> Result<Option<Self>> {
        match (env_string("TELEGRAM_TOKEN"), env_string("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => {
                info!("Telegram notifier configured");
                Self::new(token, chat_id, timeout_secs).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Point the notifier at another Bot API host (local bot server, tests)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, symbol: &str, message: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.token);
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "Markdown",
        };

        debug!(symbol, "Sending Telegram message");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            // The URL carries the bot token, keep it out of the error
            .map_err(|e| Error::Notification(format!("Telegram request failed: {}", e.without_url())))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Notification(format!("Invalid Telegram response: {}", e.without_url())))?;

        if !status.is_success() || body.get("ok").and_then(Value::as_bool) != Some(true) {
            let description = body
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("no description");
            return Err(Error::Notification(format!(
                "Telegram rejected message ({}): {}",
                status, description
            )));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
