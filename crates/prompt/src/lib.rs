//! # Prompt
//!
//! Builds the prompts the detector sends to its model providers.
//!
//! ## Contents
//!
//! - [`ChatMessage`] / [`MessageRole`]: provider-agnostic chat messages, optionally carrying
//!   image URLs for vision requests.
//! - [`render_template`]: `{placeholder}` substitution with `{{` / `}}` escapes.
//! - [`DEFAULT_VISION_PROMPT`]: sticker-vs-content image classification prompt.
//! - [`DEFAULT_JUDGE_PROMPT`] and [`JudgePromptVars`]: the resurfaced-content judgment prompt.
//! - [`format_context_line`] / [`format_time_ago`]: the line and relative-time formats the
//!   judgment prompt uses.
//!
//! ## External interactions
//!
//! - **AI models**: output is sent to OpenAI-compatible chat APIs by `llm-client`.

mod judge;
mod template;
mod vision;

pub use judge::{
    format_context_line, format_time_ago, format_timestamp, JudgePromptVars,
    DEFAULT_JUDGE_PROMPT, MATCHED_CONTENT_PREVIEW_CHARS,
};
pub use template::{render_template, TemplateError};
pub use vision::DEFAULT_VISION_PROMPT;

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
///
/// `image_urls` is only honoured for user messages; the client sends them as image parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub image_urls: Vec<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            image_urls: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            image_urls: Vec::new(),
        }
    }

    /// User message with attached images (vision request).
    pub fn user_with_images<I, S>(content: impl Into<String>, image_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role: MessageRole::User,
            content: content.into(),
            image_urls: image_urls.into_iter().map(Into::into).collect(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            image_urls: Vec::new(),
        }
    }

    pub fn has_images(&self) -> bool {
        !self.image_urls.is_empty()
    }
}
