//! Vision capability: classify an image as sticker or content and describe it.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use llm_client::LlmClient;
use prompt::{ChatMessage, DEFAULT_VISION_PROMPT};
use tracing::{debug, instrument};

use super::json_reply::{lenient_bool, parse_object};

/// Sticker keywords checked when the reply is not JSON.
const STICKER_KEYWORDS: [&str; 4] = ["\"is_sticker\": true", "sticker", "emoji", "reaction image"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionVerdict {
    /// Purely expressive image; not recorded.
    pub is_sticker: bool,
    /// Description / OCR text. Empty for stickers.
    pub content: String,
}

#[async_trait]
pub trait VisionCapability: Send + Sync {
    async fn describe(&self, image_url: &str) -> Result<VisionVerdict>;
}

/// Interprets a vision reply.
///
/// JSON (optionally fenced): `is_sticker` as bool or string, `"type": "emoji"` also means sticker.
/// Anything else: sticker keywords mean sticker, otherwise the whole reply is the description.
pub fn parse_vision_reply(reply: &str) -> VisionVerdict {
    if let Some(obj) = parse_object(reply) {
        let mut is_sticker = obj.get("is_sticker").and_then(lenient_bool).unwrap_or(false);
        if obj
            .get("type")
            .and_then(|t| t.as_str())
            .is_some_and(|t| t.eq_ignore_ascii_case("emoji"))
        {
            is_sticker = true;
        }
        let content = obj
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .trim()
            .to_string();
        return VisionVerdict {
            is_sticker,
            content: if is_sticker { String::new() } else { content },
        };
    }

    let reply = reply.trim();
    let lower = reply.to_lowercase();
    if STICKER_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return VisionVerdict {
            is_sticker: true,
            content: String::new(),
        };
    }
    VisionVerdict {
        is_sticker: false,
        content: reply.to_string(),
    }
}

/// Vision over an OpenAI-compatible chat model with image input.
pub struct LlmVision {
    client: Arc<dyn LlmClient>,
    prompt: String,
}

impl LlmVision {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            prompt: DEFAULT_VISION_PROMPT.to_string(),
        }
    }

    /// Replaces the built-in prompt; blank prompts keep the default.
    pub fn with_prompt(mut self, prompt: Option<String>) -> Self {
        if let Some(p) = prompt.filter(|p| !p.trim().is_empty()) {
            self.prompt = p;
        }
        self
    }
}

#[async_trait]
impl VisionCapability for LlmVision {
    #[instrument(skip(self), fields(model = %self.client.model()))]
    async fn describe(&self, image_url: &str) -> Result<VisionVerdict> {
        let messages = vec![ChatMessage::user_with_images(
            self.prompt.clone(),
            [image_url.to_string()],
        )];
        let reply = self.client.complete(messages).await?;
        let verdict = parse_vision_reply(&reply);
        debug!(
            is_sticker = verdict.is_sticker,
            content_len = verdict.content.len(),
            "step: vision reply parsed"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json_content() {
        let v = parse_vision_reply(
            "```json\n{\"is_sticker\": false, \"content\": \"[news screenshot] metro closed\"}\n```",
        );
        assert!(!v.is_sticker);
        assert_eq!(v.content, "[news screenshot] metro closed");
    }

    #[test]
    fn test_string_flag_and_emoji_type() {
        assert!(parse_vision_reply(r#"{"is_sticker": "yes", "content": "cat"}"#).is_sticker);
        assert!(parse_vision_reply(r#"{"type": "Emoji", "content": "smile"}"#).is_sticker);
        let v = parse_vision_reply(r#"{"is_sticker": "false", "content": "chart"}"#);
        assert!(!v.is_sticker);
        assert_eq!(v.content, "chart");
    }

    #[test]
    fn test_plain_text_fallbacks() {
        assert!(parse_vision_reply("This is a sticker of a crying cat").is_sticker);
        let v = parse_vision_reply("A screenshot of a train timetable");
        assert!(!v.is_sticker);
        assert_eq!(v.content, "A screenshot of a train timetable");
    }
}
