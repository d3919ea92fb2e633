//! LLM configuration: trait and env-based implementation.

use anyhow::{bail, Result};
use std::env;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// LLM configuration interface for OpenAI-compatible APIs.
///
/// A capability is enabled by configuring its model; unset means the capability is absent.
pub trait LlmConfig: Send + Sync {
    fn api_key(&self) -> &str;
    fn base_url(&self) -> &str;
    fn vision_model(&self) -> Option<&str>;
    fn judge_model(&self) -> Option<&str>;
}

/// LLM config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub vision_model: Option<String>,
    pub judge_model: Option<String>,
}

impl LlmConfig for EnvLlmConfig {
    fn api_key(&self) -> &str {
        &self.openai_api_key
    }
    fn base_url(&self) -> &str {
        &self.openai_base_url
    }
    fn vision_model(&self) -> Option<&str> {
        self.vision_model.as_deref()
    }
    fn judge_model(&self) -> Option<&str> {
        self.judge_model.as_deref()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl EnvLlmConfig {
    /// Load from environment variables (OPENAI_API_KEY, OPENAI_BASE_URL, VISION_MODEL, JUDGE_MODEL).
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: non_empty_var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            vision_model: non_empty_var("VISION_MODEL"),
            judge_model: non_empty_var("JUDGE_MODEL"),
        })
    }

    /// An API key is required once any model is configured.
    pub fn validate(&self) -> Result<()> {
        if (self.vision_model.is_some() || self.judge_model.is_some())
            && self.openai_api_key.trim().is_empty()
        {
            bail!("OPENAI_API_KEY is required when VISION_MODEL or JUDGE_MODEL is set");
        }
        Ok(())
    }
}
