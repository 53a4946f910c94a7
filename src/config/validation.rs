//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured before the bot
//! talks to Telegram.

use tracing::warn;
use crate::utils::errors::{WebhookManagerError, Result};
use crate::utils::helpers::is_valid_token;
use super::Settings;

/// Marker left in sample configurations instead of a real token
const TOKEN_PLACEHOLDER_MARKER: &str = "PASTE_YOUR";

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_gateway_config(&settings.gateway)?;
    validate_state_config(&settings.state)?;
    validate_i18n_config(&settings.i18n)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    let token = config.token.trim();
    if token.is_empty() {
        return Err(WebhookManagerError::Config(
            "Bot token is required (set the BOT_TOKEN environment variable)".to_string()
        ));
    }

    if token.contains(TOKEN_PLACEHOLDER_MARKER) {
        return Err(WebhookManagerError::Config(
            "Bot token is still the placeholder value; set BOT_TOKEN to this bot's real token".to_string()
        ));
    }

    if !is_valid_token(token) {
        warn!("Configured bot token does not look like a Telegram bot token");
    }

    Ok(())
}

/// Validate remote API configuration
fn validate_gateway_config(config: &super::GatewayConfig) -> Result<()> {
    if config.timeout_seconds == 0 {
        return Err(WebhookManagerError::Config(
            "Gateway timeout must be greater than 0".to_string()
        ));
    }

    if let Some(api_url) = &config.api_url {
        url::Url::parse(api_url)?;
    }

    Ok(())
}

/// Validate conversation state configuration
fn validate_state_config(config: &super::StateConfig) -> Result<()> {
    if config.ttl_seconds == 0 {
        return Err(WebhookManagerError::Config(
            "Conversation TTL must be greater than 0".to_string()
        ));
    }

    if config.cleanup_interval_seconds == 0 {
        return Err(WebhookManagerError::Config(
            "Cleanup interval must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate internationalization configuration
fn validate_i18n_config(config: &super::I18nConfig) -> Result<()> {
    if config.default_language.is_empty() {
        return Err(WebhookManagerError::Config(
            "Default language is required".to_string()
        ));
    }

    if config.supported_languages.is_empty() {
        return Err(WebhookManagerError::Config(
            "At least one supported language is required".to_string()
        ));
    }

    if !config.supported_languages.contains(&config.default_language) {
        return Err(WebhookManagerError::Config(
            "Default language must be in supported languages list".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(WebhookManagerError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(WebhookManagerError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.bot.token = "123456789:ABCDEFGHIJKLMNOPQRSTUVWXYZabcdef0123456789012345".to_string();
        settings
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let mut settings = valid_settings();
        settings.bot.token = "   ".to_string();
        assert_matches!(validate_settings(&settings), Err(WebhookManagerError::Config(_)));
    }

    #[test]
    fn test_placeholder_token_is_fatal() {
        let mut settings = valid_settings();
        settings.bot.token = "PASTE_YOUR_MANAGER_BOT_TOKEN_HERE".to_string();
        assert_matches!(validate_settings(&settings), Err(WebhookManagerError::Config(msg)) if msg.contains("placeholder"));
    }

    #[test]
    fn test_invalid_sections_are_rejected() {
        let mut settings = valid_settings();
        settings.gateway.timeout_seconds = 0;
        assert!(validate_settings(&settings).is_err());

        let mut settings = valid_settings();
        settings.gateway.api_url = Some("not a url".to_string());
        assert_matches!(validate_settings(&settings), Err(WebhookManagerError::UrlParse(_)));

        let mut settings = valid_settings();
        settings.i18n.default_language = "de".to_string();
        assert!(validate_settings(&settings).is_err());

        let mut settings = valid_settings();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());

        let mut settings = valid_settings();
        settings.state.ttl_seconds = 0;
        assert!(validate_settings(&settings).is_err());
    }
}
