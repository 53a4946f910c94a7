//! Message handlers module
//!
//! Handles incoming free-text messages, which feed the active webhook flow

use std::sync::Arc;
use teloxide::{Bot, types::Message};
use tracing::debug;
use crate::utils::errors::Result;
use crate::handlers::{send_reply, ConversationManager};

/// Handle incoming text messages
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    manager: Arc<ConversationManager>,
) -> Result<()> {
    let chat_id = msg.chat.id;

    let Some(text) = msg.text() else {
        debug!(chat_id = chat_id.0, "Ignoring non-text message");
        return Ok(());
    };

    if is_command(text) {
        debug!(chat_id = chat_id.0, "Ignoring unknown command");
        return Ok(());
    }

    let lang = manager.language_for(msg.from.as_ref().and_then(|user| user.language_code.as_deref()));
    let reply = manager.handle_text(chat_id.0, &lang, text).await;
    send_reply(&bot, chat_id, reply).await
}

/// Commands are never form input, even ones the bot does not know
fn is_command(text: &str) -> bool {
    text.trim_start().starts_with('/')
}
