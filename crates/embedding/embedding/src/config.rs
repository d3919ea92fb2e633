//! Embedding configuration: trait and env-based implementation.

use anyhow::Result;
use std::env;

/// Provider name for OpenAI-compatible embedding endpoints.
pub const PROVIDER_OPENAI: &str = "openai";
/// Provider name that disables text fingerprints entirely.
pub const PROVIDER_NONE: &str = "none";

/// Embedding service configuration interface.
pub trait EmbeddingConfig: Send + Sync {
    fn provider(&self) -> &str;
    /// API key for OpenAI-compatible embedding (EMBEDDING_API_KEY, falling back to OPENAI_API_KEY).
    fn api_key(&self) -> &str;
    /// Optional base URL for OpenAI-compatible endpoints (EMBEDDING_BASE_URL or OPENAI_BASE_URL).
    fn base_url(&self) -> Option<&str>;
    fn model(&self) -> &str;

    /// True when a provider is selected and has credentials.
    fn is_enabled(&self) -> bool {
        !self.provider().eq_ignore_ascii_case(PROVIDER_NONE) && !self.api_key().is_empty()
    }
}

/// Embedding config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvEmbeddingConfig {
    pub embedding_provider: String,
    pub embedding_api_key: String,
    pub embedding_base_url: Option<String>,
    pub embedding_model: String,
}

impl EmbeddingConfig for EnvEmbeddingConfig {
    fn provider(&self) -> &str {
        &self.embedding_provider
    }
    fn api_key(&self) -> &str {
        &self.embedding_api_key
    }
    fn base_url(&self) -> Option<&str> {
        self.embedding_base_url.as_deref().filter(|s| !s.is_empty())
    }
    fn model(&self) -> &str {
        &self.embedding_model
    }
}

impl EnvEmbeddingConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self> {
        let embedding_provider =
            env::var("EMBEDDING_PROVIDER").unwrap_or_else(|_| PROVIDER_OPENAI.to_string());
        let embedding_api_key = env::var("EMBEDDING_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .unwrap_or_default();
        let embedding_base_url = env::var("EMBEDDING_BASE_URL")
            .or_else(|_| env::var("OPENAI_BASE_URL"))
            .ok()
            .filter(|s| !s.trim().is_empty());
        let embedding_model = env::var("EMBEDDING_MODEL")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());
        Ok(Self {
            embedding_provider,
            embedding_api_key,
            embedding_base_url,
            embedding_model,
        })
    }

    /// Validate config: only `openai` and `none` providers are known.
    pub fn validate(&self) -> Result<()> {
        let provider = self.embedding_provider.to_ascii_lowercase();
        if provider != PROVIDER_OPENAI && provider != PROVIDER_NONE {
            anyhow::bail!(
                "EMBEDDING_PROVIDER={} is not supported (expected `openai` or `none`)",
                self.embedding_provider
            );
        }
        Ok(())
    }
}
