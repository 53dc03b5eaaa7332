// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram delivery for Frilans notifications.
//!
//! Implements [`MessageSender`] over the Telegram Bot API via teloxide.
//! Subscribers are addressed by their Telegram user id, which doubles as
//! the private chat id. Messages are sent as plain text.

use async_trait::async_trait;
use frilans_config::model::TelegramConfig;
use frilans_core::types::{AdapterType, HealthStatus, MessageId, OutboundMessage};
use frilans_core::{Adapter, FrilansError, MessageSender};
use teloxide::prelude::*;
use teloxide::types::{ChatId, Recipient};
use tracing::{debug, warn};

/// Bot API limit on the length of one text message, in characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Telegram sender implementing [`MessageSender`].
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    /// Creates a sender from config. Requires `telegram.bot_token`.
    pub fn new(config: &TelegramConfig) -> Result<Self, FrilansError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            FrilansError::Config("telegram.bot_token is required to send notifications".into())
        })?;

        if token.trim().is_empty() {
            return Err(FrilansError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        Ok(Self {
            bot: Bot::new(token),
        })
    }
}

/// Cut `text` to at most `limit` characters, ending with an ellipsis when cut.
fn fit_message(text: &str, limit: usize) -> (String, bool) {
    if text.chars().count() <= limit {
        return (text.to_string(), false);
    }
    let mut cut: String = text.chars().take(limit.saturating_sub(1)).collect();
    cut.push('…');
    (cut, true)
}

#[async_trait]
impl Adapter for TelegramSender {
    fn name(&self) -> &str {
        "telegram"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Sender
    }

    async fn health_check(&self) -> Result<HealthStatus, FrilansError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    fn max_message_chars(&self) -> Option<usize> {
        Some(TELEGRAM_MESSAGE_LIMIT)
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, FrilansError> {
        let chat_id = ChatId(msg.user_id.0);
        let (text, truncated) = fit_message(&msg.text, TELEGRAM_MESSAGE_LIMIT);
        if truncated {
            warn!(
                user_id = %msg.user_id,
                chars = msg.text.chars().count(),
                "message exceeds Telegram limit, truncating"
            );
        }

        let sent = self
            .bot
            .send_message(Recipient::Id(chat_id), text)
            .await
            .map_err(|e| FrilansError::Delivery {
                message: format!("failed to send message: {e}"),
                source: Some(Box::new(e)),
            })?;

        debug!(user_id = %msg.user_id, message_id = sent.id.0, "telegram message sent");
        Ok(MessageId(sent.id.0.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_a_config_error() {
        let err = TelegramSender::new(&TelegramConfig::default()).err().unwrap();
        assert!(matches!(err, FrilansError::Config(_)));
    }

    #[test]
    fn blank_token_is_rejected() {
        let config = TelegramConfig {
            bot_token: Some("   ".into()),
        };
        assert!(TelegramSender::new(&config).is_err());
    }

    #[tokio::test]
    async fn adapter_metadata() {
        let config = TelegramConfig {
            bot_token: Some("123:ABC".into()),
        };
        let sender = TelegramSender::new(&config).unwrap();
        assert_eq!(sender.name(), "telegram");
        assert_eq!(sender.adapter_type(), AdapterType::Sender);
        assert_eq!(sender.max_message_chars(), Some(TELEGRAM_MESSAGE_LIMIT));
    }

    #[test]
    fn short_messages_pass_through() {
        let (text, cut) = fit_message("hello", TELEGRAM_MESSAGE_LIMIT);
        assert_eq!(text, "hello");
        assert!(!cut);
    }

    #[test]
    fn long_messages_are_cut_to_the_limit() {
        let long = "я".repeat(TELEGRAM_MESSAGE_LIMIT + 10);
        let (text, cut) = fit_message(&long, TELEGRAM_MESSAGE_LIMIT);
        assert!(cut);
        assert_eq!(text.chars().count(), TELEGRAM_MESSAGE_LIMIT);
        assert!(text.ends_with('…'));
    }
}
