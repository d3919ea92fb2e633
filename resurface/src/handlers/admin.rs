//! Admin chat commands: `/memory_status` and `/erase_memory`, restricted to ADMIN_USER_IDS.

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::admin::Admin;
use crate::core::{Handler, HandlerResponse, Message, Result};

use super::filter::command_name;

pub const STATUS_COMMAND: &str = "memory_status";
pub const ERASE_COMMAND: &str = "erase_memory";
pub const ADMIN_COMMANDS: [&str; 2] = [STATUS_COMMAND, ERASE_COMMAND];

pub struct AdminHandler {
    admin: Admin,
    bot_username: Option<String>,
}

impl AdminHandler {
    pub fn new(admin: Admin) -> Self {
        Self {
            admin,
            bot_username: None,
        }
    }

    /// Commands suffixed with another bot's `@name` are left alone.
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    fn is_admin(&self, message: &Message) -> bool {
        self.admin.is_admin(message.user.id)
    }
}

#[async_trait]
impl Handler for AdminHandler {
    #[instrument(skip(self, message))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let Some(command) = command_name(&message.content, self.bot_username.as_deref())
            .filter(|c| ADMIN_COMMANDS.contains(c))
        else {
            return Ok(HandlerResponse::Ignore);
        };
        if !self.is_admin(message) {
            warn!(user_id = message.user.id, command = %command, "Admin command from non-admin ignored");
            return Ok(HandlerResponse::Stop);
        }

        let conversation_id = message.chat.conversation_id();
        info!(user_id = message.user.id, command = %command, "step: admin command");
        match command {
            STATUS_COMMAND => {
                let report = self.admin.status(&conversation_id).await;
                Ok(HandlerResponse::Reply(report.to_string()))
            }
            _ => {
                // No chat reply either way; a failure surfaces in the chain's error log.
                self.admin.erase(&conversation_id).await?;
                Ok(HandlerResponse::Stop)
            }
        }
    }
}
