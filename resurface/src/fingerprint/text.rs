//! Text fingerprints: embedding vectors from the configured provider.

use embedding::EmbeddingService;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::similarity::cosine_similarity;

/// Embedding vector of a record's content. Serialized as a bare numeric array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextFingerprint(pub Vec<f32>);

impl TextFingerprint {
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Cosine similarity, or `None` when the dimensions differ or either vector is empty.
    pub fn similarity(&self, other: &TextFingerprint) -> Option<f32> {
        if self.0.is_empty() || self.0.len() != other.0.len() {
            return None;
        }
        Some(cosine_similarity(&self.0, &other.0))
    }
}

/// Embeds `content`. Absent service, empty content, provider failure or an empty vector
/// all yield `None`.
pub async fn text_fingerprint(
    service: Option<&dyn EmbeddingService>,
    content: &str,
) -> Option<TextFingerprint> {
    let service = service?;
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    match service.embed(content).await {
        Ok(v) if !v.is_empty() => {
            debug!(dimension = v.len(), model = %service.model(), "step: text fingerprint computed");
            Some(TextFingerprint(v))
        }
        Ok(_) => {
            warn!(model = %service.model(), "Embedding provider returned an empty vector");
            None
        }
        Err(e) => {
            warn!(error = %e, model = %service.model(), "Text fingerprint failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(Result<Vec<f32>, &'static str>);

    #[async_trait]
    impl EmbeddingService for Fixed {
        async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            self.0.clone().map_err(anyhow::Error::msg)
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    /// **Test: provider failures, empty vectors and blank text all give no fingerprint.**
    #[tokio::test]
    async fn test_text_fingerprint_degrades_to_none() {
        let ok = Fixed(Ok(vec![0.6, 0.8]));
        assert_eq!(
            text_fingerprint(Some(&ok), " hi ").await,
            Some(TextFingerprint(vec![0.6, 0.8]))
        );
        assert_eq!(text_fingerprint(Some(&ok), "   ").await, None);
        assert_eq!(text_fingerprint(None, "hi").await, None);
        assert_eq!(text_fingerprint(Some(&Fixed(Ok(vec![]))), "hi").await, None);
        assert_eq!(text_fingerprint(Some(&Fixed(Err("down"))), "hi").await, None);
    }

    #[test]
    fn test_similarity_requires_same_dimension() {
        let a = TextFingerprint(vec![1.0, 0.0]);
        assert_eq!(a.similarity(&TextFingerprint(vec![1.0, 0.0, 0.0])), None);
        assert_eq!(a.similarity(&TextFingerprint(vec![])), None);
        assert!((a.similarity(&a).unwrap() - 1.0).abs() < 1e-6);
    }
}
