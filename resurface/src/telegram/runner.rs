//! REPL runner: converts teloxide messages to core messages and runs the chain, one spawned
//! task per message.

use anyhow::Result;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use tracing::{error, info, instrument};

use crate::chain::HandlerChain;
use crate::core::{HandlerResponse, ToCoreMessage};

use super::adapters::{resolve_image_urls, TelegramMessageWrapper};

/// Runs until the dispatcher stops (Ctrl-C).
#[instrument(skip(bot, handler_chain))]
pub async fn run_repl(bot: Bot, handler_chain: HandlerChain) -> Result<()> {
    teloxide::repl(bot, move |bot: Bot, msg: teloxide::types::Message| {
        let chain = handler_chain.clone();
        async move {
            tokio::spawn(async move {
                let mut core_msg = TelegramMessageWrapper(&msg).to_core();
                core_msg.image_urls = resolve_image_urls(&bot, &msg).await;
                info!(
                    user_id = core_msg.user.id,
                    chat_id = core_msg.chat.id,
                    message_id = %core_msg.id,
                    images = core_msg.image_urls.len(),
                    "step: processing message (handler chain started)"
                );

                match chain.handle(&core_msg).await {
                    Ok(HandlerResponse::Reply(text)) => {
                        if let Err(e) = bot
                            .send_message(msg.chat.id, text)
                            .reply_parameters(ReplyParameters::new(msg.id))
                            .await
                        {
                            error!(error = %e, chat_id = core_msg.chat.id, "Failed to send reply");
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, user_id = core_msg.user.id, "Handler chain failed")
                    }
                }
            });
            Ok(())
        }
    })
    .await;

    Ok(())
}
