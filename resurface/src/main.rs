//! resurface-bot: run the detector on Telegram, or inspect/erase stored conversations.

use anyhow::Result;
use clap::Parser;
use resurface::{build_offline, load_config, run_bot, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => run_bot(load_config(token)?).await,
        Commands::Status { conversation } => {
            let components = build_offline(&load_config(None)?)?;
            println!("{}", components.admin.status(&conversation).await);
            Ok(())
        }
        Commands::Erase { conversation } => {
            let components = build_offline(&load_config(None)?)?;
            components.admin.erase(&conversation).await?;
            println!("Erased conversation {}", conversation);
            Ok(())
        }
    }
}
