//! Reminder sink: the outbound "this is old news" reply.

use anyhow::Result;
use async_trait::async_trait;

use crate::core::Message;

/// Text sent when no reminder image is available.
pub const DEFAULT_REMINDER_TEXT: &str = "This topic has already been discussed here before~";

#[async_trait]
pub trait ReminderSink: Send + Sync {
    /// Replies to `message` with the stock image or the fallback text.
    async fn remind(&self, message: &Message) -> Result<()>;
}
