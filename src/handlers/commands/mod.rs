//! Command handlers module
//!
//! This module contains handlers for the bot commands: /start, /cancel and /help.

use std::sync::Arc;
use teloxide::{Bot, types::Message, utils::command::BotCommands};
use tracing::debug;
use crate::utils::errors::Result;
use crate::handlers::{send_reply, ConversationManager};

/// All available bot commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Webhook manager commands:")]
pub enum Command {
    #[command(description = "Show the main menu")]
    Start,
    #[command(description = "Abort the current operation")]
    Cancel,
    #[command(description = "Show help information")]
    Help,
}

/// Main command dispatcher
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    manager: Arc<ConversationManager>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let lang = manager.language_for(msg.from.as_ref().and_then(|user| user.language_code.as_deref()));
    debug!(chat_id = chat_id.0, command = ?cmd, "Handling command");

    let reply = match cmd {
        Command::Start => manager.start(chat_id.0, &lang),
        Command::Cancel => manager.cancel(chat_id.0, &lang),
        Command::Help => manager.help(&lang),
    };

    send_reply(&bot, chat_id, reply).await
}
