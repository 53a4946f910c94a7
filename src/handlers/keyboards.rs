//! Inline keyboards shown by the bot

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use crate::i18n::I18n;

/// Callback data of the main menu buttons
pub mod callback_data {
    pub const SET_WEBHOOK: &str = "set_webhook";
    pub const DELETE_WEBHOOK: &str = "delete_webhook";
    pub const INFO_WEBHOOK: &str = "info_webhook";
    pub const SUPPORT_US: &str = "support_us";
    pub const ABOUT_BOT: &str = "about_bot";
}

/// Localized main menu: set + delete, info, support + about
pub fn main_menu(i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    let button = |key: &str, data: &str| InlineKeyboardButton::callback(i18n.t(key, lang, None), data.to_string());

    InlineKeyboardMarkup::new(vec![
        vec![
            button("menu.buttons.set_webhook", callback_data::SET_WEBHOOK),
            button("menu.buttons.delete_webhook", callback_data::DELETE_WEBHOOK),
        ],
        vec![button("menu.buttons.info_webhook", callback_data::INFO_WEBHOOK)],
        vec![
            button("menu.buttons.support", callback_data::SUPPORT_US),
            button("menu.buttons.about", callback_data::ABOUT_BOT),
        ],
    ])
}
