//! Logging middleware
//!
//! Logs every incoming update before it reaches the handlers. Message bodies
//! may contain bot tokens, so only their length is ever recorded.

use teloxide::types::{ChatKind, MediaKind, Message, MessageKind, PublicChatKind, Update, UpdateKind};
use tracing::{debug, info, instrument};

/// Logging middleware for bot interactions
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    log_user_interactions: bool,
}

impl LoggingMiddleware {
    /// Create a new LoggingMiddleware instance
    pub fn new(log_user_interactions: bool) -> Self {
        Self { log_user_interactions }
    }

    /// Log incoming update
    #[instrument(skip(self, update), fields(update_id = update.id.0))]
    pub fn log_update(&self, update: &Update) {
        if !self.log_user_interactions {
            return;
        }

        match &update.kind {
            UpdateKind::Message(message) => self.log_message(message),
            UpdateKind::CallbackQuery(callback) => {
                info!(
                    user_id = callback.from.id.0,
                    callback_data = callback.data.as_deref().unwrap_or("none"),
                    "Callback query received"
                );
            }
            _ => {
                debug!("Other update type received");
            }
        }
    }

    /// Log message details
    pub fn log_message(&self, message: &Message) {
        if !self.log_user_interactions {
            return;
        }

        let (message_type, text_len) = describe_message(message);
        info!(
            user_id = message.from.as_ref().map(|user| user.id.0),
            chat_id = message.chat.id.0,
            chat_type = chat_type(message),
            message_type = message_type,
            text_len = text_len,
            message_id = message.id.0,
            "Message received"
        );
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new(true)
    }
}

fn chat_type(message: &Message) -> &'static str {
    match &message.chat.kind {
        ChatKind::Public(public) => match public.kind {
            PublicChatKind::Group => "group",
            PublicChatKind::Supergroup(_) => "supergroup",
            PublicChatKind::Channel(_) => "channel",
        },
        ChatKind::Private(_) => "private",
    }
}

/// Message kind and, for text, its length in characters
fn describe_message(message: &Message) -> (&'static str, Option<usize>) {
    match &message.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(text) => ("text", Some(text.text.chars().count())),
            MediaKind::Photo(_) => ("photo", None),
            MediaKind::Document(_) => ("document", None),
            MediaKind::Sticker(_) => ("sticker", None),
            _ => ("other_media", None),
        },
        _ => ("other", None),
    }
}
