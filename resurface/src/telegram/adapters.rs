//! teloxide → core type conversion.

use teloxide::prelude::*;
use tracing::warn;

use crate::core::{Chat, Message, ToCoreMessage, ToCoreUser, User};

pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl ToCoreUser for TelegramUserWrapper<'_> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
        }
    }
}

fn chat_type(chat: &teloxide::types::Chat) -> &'static str {
    if chat.is_supergroup() {
        "supergroup"
    } else if chat.is_group() {
        "group"
    } else if chat.is_channel() {
        "channel"
    } else {
        "private"
    }
}

/// Converts text or caption, sender and chat. Image URLs need a `getFile` round trip and are
/// filled in by [`resolve_image_urls`].
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl ToCoreMessage for TelegramMessageWrapper<'_> {
    fn to_core(&self) -> Message {
        let msg = self.0;
        Message {
            id: msg.id.to_string(),
            user: msg
                .from
                .as_ref()
                .map(|u| TelegramUserWrapper(u).to_core())
                .unwrap_or(User {
                    id: 0,
                    username: None,
                    first_name: None,
                    last_name: None,
                }),
            chat: Chat {
                id: msg.chat.id.0,
                chat_type: chat_type(&msg.chat).to_string(),
            },
            content: msg.text().or(msg.caption()).unwrap_or("").to_string(),
            image_urls: Vec::new(),
            created_at: msg.date,
        }
    }
}

/// Download URL of a file path returned by `getFile`.
pub fn file_url(api_url: &reqwest::Url, token: &str, file_path: &str) -> Option<String> {
    api_url
        .join(&format!("file/bot{}/{}", token, file_path))
        .ok()
        .map(|u| u.to_string())
}

/// URL of the largest photo size attached to `msg`, if any.
pub async fn resolve_image_urls(bot: &Bot, msg: &teloxide::types::Message) -> Vec<String> {
    let Some(largest) = msg
        .photo()
        .and_then(|sizes| sizes.iter().max_by_key(|p| u64::from(p.width) * u64::from(p.height)))
    else {
        return Vec::new();
    };
    match bot.get_file(largest.file.id.clone()).await {
        Ok(file) => file_url(&bot.api_url(), bot.token(), &file.path)
            .into_iter()
            .collect(),
        Err(e) => {
            warn!(error = %e, message_id = %msg.id, "getFile failed, photo skipped");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Test: user conversion keeps id and names.**
    #[test]
    fn test_telegram_user_wrapper_to_core() {
        let user = teloxide::types::User {
            id: teloxide::types::UserId(123),
            is_bot: false,
            first_name: "Test".to_string(),
            last_name: Some("User".to_string()),
            username: Some("testuser".to_string()),
            language_code: Some("en".to_string()),
            is_premium: false,
            added_to_attachment_menu: false,
        };

        let core_user = TelegramUserWrapper(&user).to_core();
        assert_eq!(core_user.id, 123);
        assert_eq!(core_user.username.as_deref(), Some("testuser"));
        assert_eq!(core_user.display_name(), "Test User");
    }

    /// **Test: file URLs are built under the API root with the bot token.**
    #[test]
    fn test_file_url() {
        let api = reqwest::Url::parse("https://api.telegram.org").unwrap();
        assert_eq!(
            file_url(&api, "123:abc", "photos/file_1.jpg").as_deref(),
            Some("https://api.telegram.org/file/bot123:abc/photos/file_1.jpg")
        );
    }
}
