//! BotConfig: everything the binary needs, loaded from env in one place.

use anyhow::{bail, Result};
use embedding::{EmbeddingConfig, EnvEmbeddingConfig};
use llm_client::EnvLlmConfig;

use super::{BaseConfig, DetectorConfig};

/// Full config. Use [`BotConfig::load`] then [`BotConfig::validate`].
pub struct BotConfig {
    pub base: BaseConfig,
    pub detector: DetectorConfig,
    pub embedding: EnvEmbeddingConfig,
    pub llm: EnvLlmConfig,
}

impl BotConfig {
    /// Load full config from environment variables. If `token` is provided it overrides BOT_TOKEN.
    pub fn load(token: Option<String>) -> Result<Self> {
        Ok(Self {
            base: BaseConfig::load(token)?,
            detector: DetectorConfig::from_env(),
            embedding: EnvEmbeddingConfig::from_env()?,
            llm: EnvLlmConfig::from_env()?,
        })
    }

    /// Validate config. Call after load() to fail fast before init.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        self.detector.validate()?;
        self.embedding.validate()?;
        self.llm.validate()?;
        Ok(())
    }

    /// Running the bot additionally needs a token.
    pub fn validate_for_run(&self) -> Result<()> {
        self.validate()?;
        if self.base.bot_token.trim().is_empty() {
            bail!("BOT_TOKEN not set");
        }
        Ok(())
    }

    pub fn bot_token(&self) -> &str {
        &self.base.bot_token
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn telegram_api_url(&self) -> Option<&str> {
        self.base.telegram_api_url.as_deref()
    }
    pub fn detector(&self) -> &DetectorConfig {
        &self.detector
    }
    pub fn embedding_enabled(&self) -> bool {
        self.embedding.is_enabled()
    }
}
