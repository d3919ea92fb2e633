//! Telegram transport: adapters, reminder sink, REPL runner.

mod adapters;
mod reminder;
mod runner;

pub use adapters::{file_url, resolve_image_urls, TelegramMessageWrapper, TelegramUserWrapper};
pub use reminder::TelegramReminder;
pub use runner::run_repl;

/// Builds a teloxide bot, pointing it at `api_url` when given and valid.
pub fn build_bot(token: &str, api_url: Option<&str>) -> teloxide::Bot {
    let bot = teloxide::Bot::new(token);
    match api_url {
        Some(url_str) => match reqwest::Url::parse(url_str) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                tracing::error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        },
        None => bot,
    }
}
