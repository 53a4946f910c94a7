//! Internationalization module
//!
//! This module handles multi-language support for the bot.
//! It provides translation loading, language detection and message formatting
//! for Persian and English.

pub mod loader;

// Re-export commonly used i18n components
pub use loader::{I18n, TranslationParams, TranslationStats, LanguageStats};
