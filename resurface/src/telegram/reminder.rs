//! Telegram reminder sink: replies to the resurfaced post.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::payloads::{SendMessageSetters, SendPhotoSetters};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, MessageId, ReplyParameters};
use tracing::{info, instrument, warn};

use crate::capabilities::{ReminderSink, DEFAULT_REMINDER_TEXT};
use crate::core::Message;

/// Sends the stock image from `image_path` when it exists, else the text notice.
pub struct TelegramReminder {
    bot: Bot,
    image_path: PathBuf,
}

impl TelegramReminder {
    pub fn new(bot: Bot, image_path: impl Into<PathBuf>) -> Self {
        Self {
            bot,
            image_path: image_path.into(),
        }
    }

    async fn send_text(&self, chat: ChatId, reply_to: ReplyParameters) -> Result<()> {
        self.bot
            .send_message(chat, DEFAULT_REMINDER_TEXT)
            .reply_parameters(reply_to)
            .await
            .context("send reminder text")?;
        Ok(())
    }
}

#[async_trait]
impl ReminderSink for TelegramReminder {
    #[instrument(skip(self, message), fields(chat_id = message.chat.id, message_id = %message.id))]
    async fn remind(&self, message: &Message) -> Result<()> {
        let chat = ChatId(message.chat.id);
        let id: i32 = message
            .id
            .parse()
            .with_context(|| format!("invalid message id {}", message.id))?;
        let reply_to = ReplyParameters::new(MessageId(id));

        if tokio::fs::try_exists(&self.image_path).await.unwrap_or(false) {
            let sent = self
                .bot
                .send_photo(chat, InputFile::file(self.image_path.clone()))
                .reply_parameters(reply_to.clone())
                .await;
            match sent {
                Ok(_) => {
                    info!("step: reminder image sent");
                    return Ok(());
                }
                Err(e) => warn!(error = %e, "Reminder image failed, sending text"),
            }
        }
        self.send_text(chat, reply_to).await?;
        info!("step: reminder text sent");
        Ok(())
    }
}
