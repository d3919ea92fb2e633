//! Integration tests for the OpenAI embedding service.
//!
//! Tests that call the API are marked `#[ignore]` and need OPENAI_API_KEY (and quota):
//! `cargo test -p openai-embedding -- --ignored`. Quota/billing errors count as a skip.

use std::path::Path;

use embedding::{EmbeddingService, EnvEmbeddingConfig};
use openai_embedding::{OpenAIEmbedding, DEFAULT_EMBEDDING_MODEL};

/// Loads `.env` from the workspace root: `crates/embedding/openai-embedding` → `../../../.env`.
fn load_root_env() {
    let root_env = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../.env");
    let _ = dotenvy::from_path(root_env);
}

fn is_quota_or_billing_error(e: &anyhow::Error) -> bool {
    let s = e.to_string();
    s.contains("insufficient_quota")
        || s.contains("quota")
        || s.contains("billing")
        || s.contains("rate_limit")
}

/// **Test: from_config with an empty model falls back to the default model.**
#[test]
fn test_from_config_defaults_model() {
    let config = EnvEmbeddingConfig {
        embedding_provider: "openai".to_string(),
        embedding_api_key: "sk-test".to_string(),
        embedding_base_url: Some("http://localhost:9999/v1".to_string()),
        embedding_model: String::new(),
    };
    let service = OpenAIEmbedding::from_config(&config);
    assert_eq!(service.model(), DEFAULT_EMBEDDING_MODEL);
}

/// **Test: with_model overrides the configured model.**
#[test]
fn test_with_model() {
    let service = OpenAIEmbedding::new("sk-test".to_string(), DEFAULT_EMBEDDING_MODEL.to_string())
        .with_model("text-embedding-3-large".to_string());
    assert_eq!(service.model(), "text-embedding-3-large");
}

/// **Test: identical texts embed to the same dimensionality against the real API.**
#[tokio::test]
#[ignore]
async fn test_openai_embedding_dimension_is_stable() {
    load_root_env();
    let api_key = std::env::var("OPENAI_API_KEY")
        .expect("OPENAI_API_KEY must be set for this test (or set in root .env)");
    let service = OpenAIEmbedding::new(api_key, DEFAULT_EMBEDDING_MODEL.to_string());

    let first = service.embed("breaking: the cafeteria is closed").await;
    let second = service.embed("the cafeteria is closed today").await;
    match (first, second) {
        (Ok(a), Ok(b)) => {
            assert!(!a.is_empty());
            assert_eq!(a.len(), b.len());
        }
        (Err(e), _) | (_, Err(e)) if is_quota_or_billing_error(&e) => {
            eprintln!("skipped: OpenAI quota/billing limit ({})", e);
        }
        (Err(e), _) | (_, Err(e)) => panic!("OpenAI embed request failed: {}", e),
    }
}
