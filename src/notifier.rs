use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use thiserror::Error;
use tracing::{debug, error, instrument};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Outbound text channel. Implemented over Telegram for the bot and by
/// recording fakes in tests.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat: &Recipient, text: &str) -> Result<(), DeliveryError>;
}

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat: &Recipient, text: &str) -> Result<(), DeliveryError> {
        self.bot.send_message(chat.clone(), text).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Duplicate,
    Failed,
}

/// Sends notifications to one chat, skipping text identical to the last
/// message that went through.
pub struct Notifier<M> {
    messenger: M,
    chat: Recipient,
    last_sent: Option<String>,
}

impl<M: Messenger> Notifier<M> {
    pub fn new(messenger: M, chat: impl Into<Recipient>) -> Self {
        Self {
            messenger,
            chat: chat.into(),
            last_sent: None,
        }
    }

    pub fn last_sent(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }

    /// Deliver `text` unless it repeats the last sent message. Delivery
    /// failures are logged and leave the last-sent state untouched.
    #[instrument(skip_all, fields(chat = ?self.chat))]
    pub async fn deliver(&mut self, text: &str) -> Delivery {
        if self.last_sent.as_deref() == Some(text) {
            debug!(text, "message already sent; skipping");
            return Delivery::Duplicate;
        }
        match self.messenger.send_text(&self.chat, text).await {
            Ok(()) => {
                debug!(text, "message sent to telegram");
                self.last_sent = Some(text.to_string());
                Delivery::Sent
            }
            Err(err) => {
                error!(?err, "failed to send message to telegram");
                Delivery::Failed
            }
        }
    }
}
