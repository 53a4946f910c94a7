//! Webhook Manager Telegram Bot
//!
//! A Telegram bot that lets an operator set, delete and inspect the webhook
//! registration of other Telegram bots through a menu-driven conversation.

pub mod config;
pub mod handlers;
pub mod services;
pub mod state;
pub mod i18n;
pub mod utils;
pub mod middleware;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{WebhookManagerError, Result};

// Re-export main components for easy access
pub use handlers::conversation::{ConversationManager, MenuAction, Reply};
pub use services::{ServiceFactory, WebhookGateway, TelegramGateway};
pub use state::{ScenarioManager, StateStorage};
pub use i18n::I18n;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
