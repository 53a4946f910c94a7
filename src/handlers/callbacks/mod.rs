//! Callback query handlers module
//!
//! This module handles the main menu's inline keyboard buttons

use std::sync::Arc;
use teloxide::{Bot, types::{CallbackQuery, ChatId}, prelude::*};
use tracing::{debug, warn};
use crate::utils::errors::Result;
use crate::handlers::{send_reply, ConversationManager, MenuAction};

/// Main callback query dispatcher
pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    manager: Arc<ConversationManager>,
) -> Result<()> {
    let user_id = query.from.id.0 as i64;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(user_id));

    debug!(user_id = user_id, chat_id = chat_id.0, callback_data = ?query.data, "Processing callback query");

    // Answer the callback query first to remove loading state
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, callback_id = %query.id, "Failed to answer callback query");
    }

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };

    let Some(action) = MenuAction::from_callback_data(data) else {
        warn!(user_id = user_id, callback_data = %data, "Unknown callback data");
        return Ok(());
    };

    let lang = manager.language_for(query.from.language_code.as_deref());
    let reply = manager.select_menu(chat_id.0, &lang, action).await;
    send_reply(&bot, chat_id, reply).await
}
