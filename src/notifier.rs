//! Notification delivery for feedwatch.
//!
//! Messages are posted to a Discord channel through the REST API, one HTTP
//! request per message, each bounded by the configured delivery deadline.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::Serialize;

use crate::config::NotifyConfig;
use crate::{FeedwatchError, Result};

/// Discord REST API base URL.
const API_BASE: &str = "https://discord.com/api/v10";

/// Maximum Discord message content length in characters.
const MAX_MESSAGE_LENGTH: usize = 2000;

/// User agent string for API requests.
const USER_AGENT: &str = "feedwatch/0.1 (feed watcher)";

/// Delivery channel for watcher notifications.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Deliver a text message within the configured deadline.
    async fn send(&self, text: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    content: &'a str,
}

/// Notifier posting messages to a Discord channel.
#[derive(Debug)]
pub struct DiscordNotifier {
    client: Client,
    channel_id: String,
    timeout: Duration,
}

impl DiscordNotifier {
    /// Create a new notifier from the notify configuration.
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bot {}", config.bot_token))
            .map_err(|e| FeedwatchError::Notify(format!("invalid bot token: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FeedwatchError::Notify(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            channel_id: config.channel_id.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

impl Notifier for DiscordNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let content = truncate_message(text);
        let url = format!("{}/channels/{}/messages", API_BASE, self.channel_id);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&MessagePayload { content: &content })
            .send()
            .await
            .map_err(|e| FeedwatchError::Notify(format!("failed to send message: {}", e)))?;

        if !response.status().is_success() {
            return Err(FeedwatchError::Notify(format!(
                "Discord API error: {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Truncate a message to Discord's content limit.
fn truncate_message(text: &str) -> String {
    if text.len() <= MAX_MESSAGE_LENGTH {
        text.to_string()
    } else {
        text.chars().take(MAX_MESSAGE_LENGTH).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> NotifyConfig {
        NotifyConfig {
            bot_token: "test-token".to_string(),
            channel_id: "123456789".to_string(),
            timeout_secs: 10,
        }
    }

    #[test]
    fn test_new_notifier() {
        assert!(DiscordNotifier::new(&sample_config()).is_ok());
    }

    #[test]
    fn test_new_notifier_rejects_invalid_token() {
        let mut config = sample_config();
        config.bot_token = "bad\ntoken".to_string();

        let result = DiscordNotifier::new(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("invalid bot token"));
    }

    #[test]
    fn test_message_payload_shape() {
        let payload = MessagePayload { content: "hello" };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"content":"hello"}"#
        );
    }

    #[test]
    fn test_truncate_message_short() {
        assert_eq!(truncate_message("short"), "short");
    }

    #[test]
    fn test_truncate_message_exact() {
        let exact = "a".repeat(MAX_MESSAGE_LENGTH);
        assert_eq!(truncate_message(&exact), exact);
    }

    #[test]
    fn test_truncate_message_long() {
        let long = "a".repeat(MAX_MESSAGE_LENGTH + 100);
        let truncated = truncate_message(&long);
        assert_eq!(truncated.chars().count(), MAX_MESSAGE_LENGTH);
    }

    #[test]
    fn test_truncate_message_multibyte() {
        let long = "あ".repeat(MAX_MESSAGE_LENGTH);
        let truncated = truncate_message(&long);
        assert_eq!(truncated.chars().count(), MAX_MESSAGE_LENGTH);
    }
}
