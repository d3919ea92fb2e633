//! Base config: Telegram connection, logging, data directory. Loaded from env.

use anyhow::Result;
use std::env;
use std::path::PathBuf;

/// Base config: Telegram-related, logging and on-disk locations.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// BOT_TOKEN (may be empty for offline admin commands)
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// LOG_FILE
    pub log_file: String,
    /// DATA_DIR: partitions and image cache live here
    pub data_dir: PathBuf,
    /// REMINDER_IMAGE_PATH: stock image attached to reminders
    pub reminder_image_path: PathBuf,
}

impl BaseConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = token
            .or_else(|| env::var("BOT_TOKEN").ok())
            .unwrap_or_default();
        let log_file =
            env::var("LOG_FILE").unwrap_or_else(|_| "logs/resurface-bot.log".to_string());
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()));
        let reminder_image_path = env::var("REMINDER_IMAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("reminder.jpg"));

        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
            data_dir,
            reminder_image_path,
        })
    }

    /// Validate config (e.g. telegram_api_url must be valid URL if set).
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        Ok(())
    }

    /// Partitions root.
    pub fn conversations_dir(&self) -> PathBuf {
        self.data_dir.join("conversations")
    }

    /// Image cache root.
    pub fn image_cache_dir(&self) -> PathBuf {
        self.data_dir.join("image_cache")
    }
}
