//! Bot entry points: init logging, build components, run the REPL, flush on shutdown.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::Requester;
use tracing::{info, instrument, warn};

use crate::clock::SystemClock;
use crate::components::{build_bot_components, build_handler_chain, BotComponents};
use crate::config::BotConfig;
use crate::core::init_tracing;
use crate::telegram::{build_bot, run_repl, TelegramReminder};

/// Runs the bot until the REPL stops, then flushes every cached conversation.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate_for_run()?;
    init_tracing(Some(Path::new(config.log_file())))?;

    let bot = build_bot(config.bot_token(), config.telegram_api_url());
    let reminder = Arc::new(TelegramReminder::new(
        bot.clone(),
        config.base.reminder_image_path.clone(),
    ));
    let components = build_bot_components(&config, Arc::new(SystemClock), Some(reminder))?;
    let bot_username = match bot.get_me().await {
        Ok(me) => me.user.username.clone(),
        Err(e) => {
            warn!(error = %e, "getMe failed, accepting commands for any @bot suffix");
            None
        }
    };
    info!(username = ?bot_username, "Bot identity fetched");
    let chain = build_handler_chain(&components, bot_username.as_deref());

    info!(
        data_dir = %config.base.data_dir.display(),
        retention_days = config.detector().retention_days,
        embedding = config.embedding_enabled(),
        "Bot started successfully"
    );

    run_repl(bot, chain).await?;

    let written = components.store.flush_all().await;
    info!(partitions = written, "Bot stopped, store flushed");
    Ok(())
}

/// Builds components for offline admin commands: no transport, no reminders.
pub fn build_offline(config: &BotConfig) -> Result<BotComponents> {
    config.validate()?;
    init_tracing(None)?;
    build_bot_components(config, Arc::new(SystemClock), None)
}
