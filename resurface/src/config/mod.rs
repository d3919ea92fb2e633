//! Bot configuration: BaseConfig (Telegram + log + data dir) + DetectorConfig (thresholds and
//! gates) + provider configs from their crates (embedding, LLM).

mod base;
mod bot_config;
mod detector;
mod env;


pub use base::BaseConfig;
pub use bot_config::BotConfig;
pub use detector::{DetectorConfig, MatchPrecedence};
