//! # OpenAI Embedding Service
//!
//! Implements [`EmbeddingService`] on top of OpenAI's embeddings API (or any OpenAI-compatible
//! endpoint via a custom base URL). The detector uses it to fingerprint message text.
//!
//! ```rust,no_run
//! use openai_embedding::OpenAIEmbedding;
//! use embedding::EmbeddingService;
//!
//! async fn example() -> Result<(), anyhow::Error> {
//!     let service = OpenAIEmbedding::new("sk-...".to_string(), "text-embedding-3-small".to_string());
//!     let vector = service.embed("the same meme again").await?;
//!     println!("dimension: {}", vector.len());
//!     Ok(())
//! }
//! ```

use async_openai::{types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;
use embedding::{EmbeddingConfig, EmbeddingService};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default model when none is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Timeout for a single embed request (connect + request + response).
const EMBED_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters of input echoed into logs.
const LOG_PREVIEW_CHARS: usize = 80;

/// OpenAI embedding service. Holds the async-openai client and model name.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedding {
    client: Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAIEmbedding {
    /// Creates a service for `model` against the default OpenAI endpoint.
    ///
    /// An empty `api_key` falls back to the OPENAI_API_KEY environment variable.
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_base_url(api_key, model, None)
    }

    /// Creates a service with an optional base URL for OpenAI-compatible endpoints.
    pub fn new_with_base_url(api_key: String, model: String, base_url: Option<&str>) -> Self {
        let api_key = if api_key.is_empty() {
            std::env::var("OPENAI_API_KEY").unwrap_or_default()
        } else {
            api_key
        };

        let mut openai_config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url.filter(|s| !s.is_empty()) {
            openai_config = openai_config.with_api_base(url);
        }
        let client = Client::with_config(openai_config);

        Self { client, model }
    }

    /// Builds the service from an [`EmbeddingConfig`].
    pub fn from_config(config: &dyn EmbeddingConfig) -> Self {
        let model = if config.model().is_empty() {
            DEFAULT_EMBEDDING_MODEL.to_string()
        } else {
            config.model().to_string()
        };
        Self::new_with_base_url(config.api_key().to_string(), model, config.base_url())
    }

    /// Sets a different embedding model.
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl EmbeddingService for OpenAIEmbedding {
    /// Sends one embeddings request and returns the first vector of the response.
    ///
    /// Errors on timeout, transport/API failure, or a response without data.
    #[instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        if text.trim().is_empty() {
            anyhow::bail!("refusing to embed blank text");
        }
        debug!(text_preview = %preview(text), "step: embedding OpenAI embed request");

        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.clone())
            .input(vec![text])
            .build()?;

        let embeddings = self.client.embeddings();
        let response = match tokio::time::timeout(EMBED_TIMEOUT, embeddings.create(request)).await
        {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                warn!(error = %e, "OpenAI embed request failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    timeout_secs = EMBED_TIMEOUT.as_secs(),
                    "OpenAI embed request timed out"
                );
                return Err(anyhow::anyhow!(
                    "OpenAI embed request timed out after {} seconds",
                    EMBED_TIMEOUT.as_secs()
                ));
            }
        };

        let Some(embedding) = response
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .filter(|v| !v.is_empty())
        else {
            warn!("OpenAI embed response has no usable vector");
            anyhow::bail!("No embedding in response");
        };

        info!(dimension = embedding.len(), "step: embedding OpenAI embed done");
        Ok(embedding)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Test: preview keeps short text and truncates long text on a char boundary.**
    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short"), "short");
        let long = "旧".repeat(LOG_PREVIEW_CHARS + 5);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), LOG_PREVIEW_CHARS + 3);
    }

    /// **Test: blank input fails before any request is made.**
    #[tokio::test]
    async fn test_blank_text_is_rejected() {
        let service = OpenAIEmbedding::new("sk-test".to_string(), DEFAULT_EMBEDDING_MODEL.to_string());
        assert!(service.embed("   \n").await.is_err());
    }
}
