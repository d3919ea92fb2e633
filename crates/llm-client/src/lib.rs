//! # LLM client abstraction
//!
//! Defines the [`LlmClient`] trait and an OpenAI-compatible implementation. Transport-agnostic;
//! the detector's vision and judgment capabilities are built on top of it.

use anyhow::Result;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart, ImageDetail,
    ImageUrlArgs,
};
use async_trait::async_trait;
use prompt::{ChatMessage, MessageRole};

mod config;
mod openai_llm;

pub use config::{EnvLlmConfig, LlmConfig, DEFAULT_OPENAI_BASE_URL};
pub use openai_llm::OpenAILlmClient;

/// LLM client interface: request a completion from a list of messages.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the model reply text for the given messages (system/user/assistant).
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Model name, for logs.
    fn model(&self) -> &str;
}

/// Masks an API key/token for safe logging: shows first 7 chars + "***" + last 4 chars.
/// If length <= 11, returns "***" to avoid leaking any part of the key.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_ascii() {
        return "***".to_string();
    }
    format!("{}***{}", &token[..7], &token[len - 4..])
}

/// Converts a single [`ChatMessage`] into OpenAI API message format.
///
/// User messages with image URLs become multi-part content (text part, then one image part per URL).
fn chat_message_to_openai(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let content = msg.content.clone();
    let openai_msg: ChatCompletionRequestMessage = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User if msg.has_images() => {
            let mut parts: Vec<ChatCompletionRequestUserMessageContentPart> =
                Vec::with_capacity(msg.image_urls.len() + 1);
            parts.push(
                ChatCompletionRequestMessageContentPartTextArgs::default()
                    .text(content)
                    .build()?
                    .into(),
            );
            for url in &msg.image_urls {
                parts.push(
                    ChatCompletionRequestMessageContentPartImageArgs::default()
                        .image_url(
                            ImageUrlArgs::default()
                                .url(url.as_str())
                                .detail(ImageDetail::Auto)
                                .build()?,
                        )
                        .build()?
                        .into(),
                );
            }
            ChatCompletionRequestUserMessageArgs::default()
                .content(parts)
                .build()?
                .into()
        }
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    };
    Ok(openai_msg)
}
