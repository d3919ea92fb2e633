//! OpenAI-compatible [`LlmClient`]: async-openai chat completions with an optional system prompt.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_openai::{config::OpenAIConfig, types::CreateChatCompletionRequestArgs, Client};
use async_trait::async_trait;
use prompt::ChatMessage;
use tracing::{info, instrument, warn};

use super::{chat_message_to_openai, mask_token, LlmClient, LlmConfig};

/// Timeout for one completion request.
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

/// LlmClient backed by async-openai.
#[derive(Clone)]
pub struct OpenAILlmClient {
    client: Arc<Client<OpenAIConfig>>,
    api_key_masked: String,
    model: String,
    system_prompt: Option<String>,
}

impl OpenAILlmClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::build(api_key, None, model)
    }

    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        Self::build(api_key, Some(base_url), model)
    }

    /// Client for `model` using the key and base URL from `config`.
    pub fn from_config(config: &dyn LlmConfig, model: &str) -> Self {
        Self::build(
            config.api_key().to_string(),
            Some(config.base_url().to_string()),
            model.to_string(),
        )
    }

    fn build(api_key: String, base_url: Option<String>, model: String) -> Self {
        let api_key_masked = mask_token(&api_key);
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url.filter(|u| !u.is_empty()) {
            config = config.with_api_base(url);
        }
        Self {
            client: Arc::new(Client::with_config(config)),
            api_key_masked,
            model,
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

#[async_trait]
impl LlmClient for OpenAILlmClient {
    #[instrument(skip(self, messages), fields(model = %self.model))]
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let mut openai_messages = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = &self.system_prompt {
            openai_messages.push(chat_message_to_openai(&ChatMessage::system(system.clone()))?);
        }
        for msg in &messages {
            openai_messages.push(chat_message_to_openai(msg)?);
        }

        info!(
            message_count = openai_messages.len(),
            api_key = %self.api_key_masked,
            "OpenAI chat completion request"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(openai_messages)
            .build()?;

        let chat = self.client.chat();
        let response = match tokio::time::timeout(COMPLETION_TIMEOUT, chat.create(request)).await {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                warn!(error = %e, "OpenAI chat completion failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    timeout_secs = COMPLETION_TIMEOUT.as_secs(),
                    "OpenAI chat completion timed out"
                );
                anyhow::bail!(
                    "OpenAI chat completion timed out after {} seconds",
                    COMPLETION_TIMEOUT.as_secs()
                );
            }
        };

        if let Some(ref u) = response.usage {
            info!(
                prompt_tokens = u.prompt_tokens,
                completion_tokens = u.completion_tokens,
                total_tokens = u.total_tokens,
                "OpenAI chat completion usage"
            );
        }

        match response.choices.into_iter().next() {
            Some(choice) => Ok(choice.message.content.unwrap_or_default()),
            None => anyhow::bail!("No response from OpenAI"),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
