//! Detector settings: thresholds, gates, filters, context windows and prompt overrides.

use std::collections::HashSet;
use std::str::FromStr;

use anyhow::{bail, Result};
use tracing::warn;

use super::env::{bool_or, list, optional, var_or};

/// How a text match and an image match for the same message are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPrecedence {
    /// Image match, unless the text match is chronologically earlier.
    #[default]
    Earliest,
    /// Image match whenever there is one.
    PreferImage,
    /// Text match whenever there is one.
    PreferText,
}

impl FromStr for MatchPrecedence {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "earliest" => Ok(Self::Earliest),
            "image" | "prefer_image" => Ok(Self::PreferImage),
            "text" | "prefer_text" => Ok(Self::PreferText),
            other => Err(format!("unknown match precedence: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// SIMILARITY_THRESHOLD
    pub similarity_threshold: f32,
    /// IMAGE_HASH_THRESHOLD
    pub image_hash_threshold: f32,
    /// MIN_UNIQUE_SENDERS
    pub min_unique_senders: usize,
    /// COOLDOWN_SECONDS
    pub cooldown_seconds: f64,
    /// DATA_RETENTION_DAYS
    pub retention_days: u32,
    /// MIN_TEXT_LENGTH (characters, text-only messages)
    pub min_text_length: usize,
    /// BLOCKED_CONVERSATIONS
    pub blocked_conversations: HashSet<String>,
    /// IGNORE_PATTERNS (JSON array of regexes)
    pub ignore_patterns: Vec<String>,
    /// AUTO_FILTER_COMMANDS
    pub auto_filter_commands: bool,
    /// FILTERED_COMMANDS
    pub filtered_commands: Vec<String>,
    /// ENABLE_JUDGE
    pub enable_judge: bool,
    /// MATCH_PRECEDENCE
    pub match_precedence: MatchPrecedence,
    /// CONTEXT_BEFORE
    pub context_before: usize,
    /// CONTEXT_AFTER
    pub context_after: usize,
    /// RECENT_CONTEXT
    pub recent_context: usize,
    /// Contents of JUDGE_PROMPT_FILE
    pub judge_prompt: Option<String>,
    /// Contents of VISION_PROMPT_FILE
    pub vision_prompt: Option<String>,
    /// ADMIN_USER_IDS
    pub admin_user_ids: HashSet<i64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.95,
            image_hash_threshold: 0.90,
            min_unique_senders: 3,
            cooldown_seconds: 3600.0,
            retention_days: 7,
            min_text_length: 2,
            blocked_conversations: HashSet::new(),
            ignore_patterns: Vec::new(),
            auto_filter_commands: true,
            filtered_commands: Vec::new(),
            enable_judge: true,
            match_precedence: MatchPrecedence::Earliest,
            context_before: 40,
            context_after: 40,
            recent_context: 40,
            judge_prompt: None,
            vision_prompt: None,
            admin_user_ids: HashSet::new(),
        }
    }
}

fn read_prompt_file(var: &str) -> Option<String> {
    let path = optional(var)?;
    match std::fs::read_to_string(&path) {
        Ok(s) if !s.trim().is_empty() => Some(s),
        Ok(_) => {
            warn!(var = %var, path = %path, "Prompt file is empty, using built-in prompt");
            None
        }
        Err(e) => {
            warn!(var = %var, path = %path, error = %e, "Prompt file unreadable, using built-in prompt");
            None
        }
    }
}

fn ignore_patterns_from_env() -> Vec<String> {
    let Some(raw) = optional("IGNORE_PATTERNS") else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(patterns) => patterns.into_iter().filter(|p| !p.is_empty()).collect(),
        Err(e) => {
            warn!(error = %e, "IGNORE_PATTERNS is not a JSON array of strings, ignoring it");
            Vec::new()
        }
    }
}

impl DetectorConfig {
    /// Load from environment variables; malformed values fall back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        let admin_user_ids = list("ADMIN_USER_IDS")
            .into_iter()
            .filter_map(|s| match s.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(value = %s, "Ignoring malformed ADMIN_USER_IDS entry");
                    None
                }
            })
            .collect();

        Self {
            similarity_threshold: var_or("SIMILARITY_THRESHOLD", d.similarity_threshold),
            image_hash_threshold: var_or("IMAGE_HASH_THRESHOLD", d.image_hash_threshold),
            min_unique_senders: var_or("MIN_UNIQUE_SENDERS", d.min_unique_senders),
            cooldown_seconds: var_or("COOLDOWN_SECONDS", d.cooldown_seconds),
            retention_days: var_or("DATA_RETENTION_DAYS", d.retention_days),
            min_text_length: var_or("MIN_TEXT_LENGTH", d.min_text_length),
            blocked_conversations: list("BLOCKED_CONVERSATIONS").into_iter().collect(),
            ignore_patterns: ignore_patterns_from_env(),
            auto_filter_commands: bool_or("AUTO_FILTER_COMMANDS", d.auto_filter_commands),
            filtered_commands: list("FILTERED_COMMANDS"),
            enable_judge: bool_or("ENABLE_JUDGE", d.enable_judge),
            match_precedence: var_or("MATCH_PRECEDENCE", d.match_precedence),
            context_before: var_or("CONTEXT_BEFORE", d.context_before),
            context_after: var_or("CONTEXT_AFTER", d.context_after),
            recent_context: var_or("RECENT_CONTEXT", d.recent_context),
            judge_prompt: read_prompt_file("JUDGE_PROMPT_FILE"),
            vision_prompt: read_prompt_file("VISION_PROMPT_FILE"),
            admin_user_ids,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("SIMILARITY_THRESHOLD", self.similarity_threshold),
            ("IMAGE_HASH_THRESHOLD", self.image_hash_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be within [0, 1], got {}", name, value);
            }
        }
        if self.retention_days == 0 {
            bail!("DATA_RETENTION_DAYS must be at least 1");
        }
        if self.cooldown_seconds < 0.0 {
            bail!("COOLDOWN_SECONDS must not be negative");
        }
        Ok(())
    }

    pub fn is_blocked(&self, conversation_id: &str) -> bool {
        self.blocked_conversations.contains(conversation_id)
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_user_ids.contains(&user_id)
    }
}
