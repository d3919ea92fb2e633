//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::BotConfig;

#[derive(Parser)]
#[command(name = "resurface-bot")]
#[command(about = "Resurfaced-content detector for Telegram groups", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Print the stored-memory summary of one conversation.
    Status {
        /// Conversation id; Telegram group ids are negative (`-100…`).
        #[arg(short, long, allow_hyphen_values = true)]
        conversation: String,
    },
    /// Erase one conversation's records and cached images.
    Erase {
        #[arg(short, long, allow_hyphen_values = true)]
        conversation: String,
    },
}

/// Load BotConfig from environment. If `token` is provided it overrides BOT_TOKEN.
pub fn load_config(token: Option<String>) -> Result<BotConfig> {
    BotConfig::load(token)
}
