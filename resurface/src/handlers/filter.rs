//! Message filter: drops messages the detector must never see or record.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use tracing::{info, instrument};

use crate::config::DetectorConfig;
use crate::core::{Handler, Message, Result};

use super::admin::ADMIN_COMMANDS;

/// Why a message was filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    NotGroup,
    Blocked,
    Command,
}

impl FilterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterReason::NotGroup => "not a group",
            FilterReason::Blocked => "blocked conversation",
            FilterReason::Command => "command",
        }
    }
}

/// Compiled filter rules.
pub struct MessageFilter {
    config: DetectorConfig,
    commands: Vec<Regex>,
    bot_username: Option<String>,
}

fn command_pattern(command: &str) -> Option<Regex> {
    let name = command.trim().trim_start_matches(['/', '!', '#', '.', '。']);
    if name.is_empty() {
        return None;
    }
    RegexBuilder::new(&format!(r"^[/!#.。]?{}(?:$|\s.*$)", regex::escape(name)))
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .ok()
}

/// Name of a `/command` addressed to this bot, if `text` is one.
///
/// A `@name` suffix must match `bot_username` (case-insensitive); commands for other bots give
/// `None`. Without a known username every suffix is accepted.
pub fn command_name<'a>(text: &'a str, bot_username: Option<&str>) -> Option<&'a str> {
    let rest = text.trim().strip_prefix('/')?;
    let word = rest.split_whitespace().next()?;
    match word.split_once('@') {
        Some((name, target)) => {
            let ours = bot_username
                .map(|me| me.trim_start_matches('@').eq_ignore_ascii_case(target))
                .unwrap_or(true);
            ours.then_some(name)
        }
        None => Some(word),
    }
}

impl MessageFilter {
    pub fn new(config: DetectorConfig) -> Self {
        let commands = config
            .filtered_commands
            .iter()
            .filter_map(|c| command_pattern(c))
            .collect();
        Self {
            config,
            commands,
            bot_username: None,
        }
    }

    /// Only admin commands addressed to `username` bypass the command filter.
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    /// Returns why `message` must be dropped, or `None` to let it through.
    ///
    /// Minimum length and ignore patterns depend on the extracted content and are applied by
    /// the pipeline.
    pub fn check(&self, message: &Message) -> Option<FilterReason> {
        if !message.chat.is_group() {
            return Some(FilterReason::NotGroup);
        }
        if self.config.is_blocked(&message.chat.conversation_id()) {
            return Some(FilterReason::Blocked);
        }

        let text = message.content.trim();
        if command_name(text, self.bot_username.as_deref())
            .is_some_and(|c| ADMIN_COMMANDS.contains(&c))
        {
            return None;
        }
        if self.config.auto_filter_commands
            && (text.starts_with('/') || self.commands.iter().any(|re| re.is_match(text)))
        {
            return Some(FilterReason::Command);
        }
        None
    }
}

/// Stops the chain for filtered messages in before().
pub struct FilterHandler {
    filter: MessageFilter,
}

impl FilterHandler {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            filter: MessageFilter::new(config),
        }
    }

    pub fn with_bot_username(self, username: Option<String>) -> Self {
        Self {
            filter: self.filter.with_bot_username(username),
        }
    }
}

#[async_trait]
impl Handler for FilterHandler {
    #[instrument(skip(self, message))]
    async fn before(&self, message: &Message) -> Result<bool> {
        match self.filter.check(message) {
            Some(reason) => {
                info!(
                    user_id = message.user.id,
                    chat_id = message.chat.id,
                    reason = reason.as_str(),
                    "step: message filtered"
                );
                Ok(false)
            }
            None => Ok(true),
        }
    }
}
