//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from built-in defaults, an optional config file and
//! environment variables.

use serde::{Deserialize, Serialize};

/// Environment variable holding this bot's own token
pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";

/// Prefix for structured environment overrides (`WEBHOOK_MANAGER__GATEWAY__TIMEOUT_SECONDS`)
pub const ENV_PREFIX: &str = "WEBHOOK_MANAGER";

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub gateway: GatewayConfig,
    pub state: StateConfig,
    pub i18n: I18nConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    pub banner_path: String,
}

/// Remote webhook API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Bot API base URL override, used for local Bot API servers and tests
    pub api_url: Option<String>,
    pub timeout_seconds: u64,
}

/// Conversation state configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateConfig {
    pub ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
}

/// Internationalization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct I18nConfig {
    pub default_language: String,
    pub supported_languages: Vec<String>,
    pub translations_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily-rolling log files; stdout only when absent
    pub file_path: Option<String>,
    pub json: bool,
}

impl Settings {
    /// Load settings from defaults, configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("i18n.supported_languages")
                    .try_parsing(true),
            )
            .set_override_option("bot.token", std::env::var(BOT_TOKEN_ENV).ok())?
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::WebhookManagerError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                banner_path: "static/banner.jpg".to_string(),
            },
            gateway: GatewayConfig {
                api_url: None,
                timeout_seconds: 30,
            },
            state: StateConfig {
                ttl_seconds: 3600,
                cleanup_interval_seconds: 300,
            },
            i18n: I18nConfig {
                default_language: "fa".to_string(),
                supported_languages: vec!["fa".to_string(), "en".to_string()],
                translations_dir: "translations".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                json: false,
            },
        }
    }
}
