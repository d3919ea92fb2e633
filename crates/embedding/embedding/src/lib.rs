//! # Text Embeddings
//!
//! Defines the embedding capability used to fingerprint message text. The detector only
//! depends on [`EmbeddingService`]; each provider adapter implements it once.

use async_trait::async_trait;

mod config;
pub use config::{EmbeddingConfig, EnvEmbeddingConfig, PROVIDER_NONE, PROVIDER_OPENAI};

/// Service for generating text embeddings.
///
/// Vector dimensionality is provider-defined and must stay constant within a deployment.
/// Callers treat any error as "no text fingerprint" rather than a failure.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generates an embedding vector for a single text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error>;

    /// Model identifier, for status output and logs.
    fn model(&self) -> &str;
}
