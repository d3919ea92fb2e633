//! Incoming message type for the core model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{chat::Chat, user::User};

/// A single incoming message: text (or caption) plus URLs of attached images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user: User,
    pub chat: Chat,
    pub content: String,
    /// Fetchable URLs of attached images, in message order.
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn has_images(&self) -> bool {
        !self.image_urls.is_empty()
    }
}
