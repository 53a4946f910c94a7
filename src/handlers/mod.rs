//! Bot handlers module
//!
//! This module contains all Telegram bot handlers organized by type:
//! - Command handlers for bot commands
//! - Callback handlers for inline keyboard interactions
//! - Message handlers for free-text input
//!
//! The handlers only translate updates into [`ConversationManager`] calls and
//! send the returned [`Reply`] back.

pub mod commands;
pub mod callbacks;
pub mod conversation;
pub mod keyboards;
pub mod messages;

// Re-export commonly used handler functions
pub use commands::{handle_command, Command};
pub use callbacks::handle_callback_query;
pub use conversation::{ConversationManager, MenuAction, Reply};
pub use messages::handle_message;

use teloxide::{prelude::*, types::InputFile};
use crate::utils::errors::Result;

/// Send a reply as a text message, or as a photo when it carries one
pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<()> {
    match reply.photo {
        Some(bytes) => {
            let mut request = bot
                .send_photo(chat_id, InputFile::memory(bytes).file_name("banner.jpg"))
                .caption(reply.text);
            if let Some(keyboard) = reply.keyboard {
                request = request.reply_markup(keyboard);
            }
            request.await?;
        }
        None => {
            let mut request = bot.send_message(chat_id, reply.text);
            if let Some(keyboard) = reply.keyboard {
                request = request.reply_markup(keyboard);
            }
            request.await?;
        }
    }

    Ok(())
}
