//! Remote webhook gateway
//!
//! The Bot API operations this bot performs on behalf of *other* bots:
//! registering, removing and inspecting their webhook. Every call is made with
//! the target bot's own token.

use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teloxide::prelude::*;
use tracing::{debug, instrument};
use url::Url;
use crate::config::GatewayConfig;
use crate::utils::errors::{GatewayError, GatewayResult, WebhookManagerError, Result};
use crate::utils::helpers::mask_token;

/// Current webhook registration of a bot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebhookInfo {
    /// Registered endpoint; absent when no webhook is set
    pub url: Option<String>,
    pub has_custom_certificate: bool,
    pub pending_update_count: u32,
    pub last_error_date: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
}

impl WebhookInfo {
    /// The registered URL, or `None` when the platform reports no webhook
    pub fn registered_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }

    /// Last delivery error, only when the platform reported when it happened
    pub fn last_error(&self) -> Option<(DateTime<Utc>, &str)> {
        let date = self.last_error_date?;
        Some((date, self.last_error_message.as_deref().unwrap_or("")))
    }
}

impl From<teloxide::types::WebhookInfo> for WebhookInfo {
    fn from(info: teloxide::types::WebhookInfo) -> Self {
        Self {
            url: info.url.map(|url| url.to_string()),
            has_custom_certificate: info.has_custom_certificate,
            pending_update_count: info.pending_update_count,
            last_error_date: info.last_error_date,
            last_error_message: info.last_error_message,
        }
    }
}

/// Result of a delete call.
///
/// `accepted` is informational only; both values mean the platform took the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub accepted: bool,
    pub info: WebhookInfo,
}

/// Webhook management operations of the messaging platform
#[async_trait]
pub trait WebhookGateway: Send + Sync {
    /// Register `url` as the webhook of the bot identified by `token`
    async fn set_webhook(&self, token: &str, url: &str, drop_pending: bool) -> GatewayResult<WebhookInfo>;

    /// Remove the webhook of the bot identified by `token`
    async fn delete_webhook(&self, token: &str, drop_pending: bool) -> GatewayResult<DeleteOutcome>;

    /// Read the current webhook registration of the bot identified by `token`
    async fn get_webhook_info(&self, token: &str) -> GatewayResult<WebhookInfo>;
}

/// Gateway backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramGateway {
    client: reqwest::Client,
    api_url: Option<Url>,
}

impl TelegramGateway {
    /// Create a gateway with the configured timeout and optional API URL override
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| WebhookManagerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let api_url = config
            .api_url
            .as_deref()
            .map(Url::parse)
            .transpose()?;

        Ok(Self { client, api_url })
    }

    /// A client acting as the target bot
    fn bot_for(&self, token: &str) -> Bot {
        let bot = Bot::with_client(token.trim(), self.client.clone());
        match &self.api_url {
            Some(api_url) => bot.set_api_url(api_url.clone()),
            None => bot,
        }
    }
}

#[async_trait]
impl WebhookGateway for TelegramGateway {
    /// The URL goes out in its parsed form: host lowercased, an empty path
    /// sent as `/`, unsafe characters percent-encoded. The reply still echoes
    /// what Telegram reports back.
    #[instrument(skip(self, token), fields(bot = %mask_token(token)))]
    async fn set_webhook(&self, token: &str, url: &str, drop_pending: bool) -> GatewayResult<WebhookInfo> {
        let url = Url::parse(url.trim())
            .map_err(|e| GatewayError::Rejected(format!("Bad Request: invalid webhook URL: {}", e)))?;

        let bot = self.bot_for(token);
        bot.set_webhook(url).drop_pending_updates(drop_pending).await?;
        debug!("Webhook registered, reading back registration");

        let info = bot.get_webhook_info().await?;
        Ok(info.into())
    }

    #[instrument(skip(self, token), fields(bot = %mask_token(token)))]
    async fn delete_webhook(&self, token: &str, drop_pending: bool) -> GatewayResult<DeleteOutcome> {
        let bot = self.bot_for(token);
        // The Bot API answers `true` or an error, so reaching this point means accepted
        bot.delete_webhook().drop_pending_updates(drop_pending).await?;
        debug!("Webhook deleted, reading back registration");

        let info = bot.get_webhook_info().await?;
        Ok(DeleteOutcome {
            accepted: true,
            info: info.into(),
        })
    }

    #[instrument(skip(self, token), fields(bot = %mask_token(token)))]
    async fn get_webhook_info(&self, token: &str) -> GatewayResult<WebhookInfo> {
        let info = self.bot_for(token).get_webhook_info().await?;
        Ok(info.into())
    }
}

impl std::fmt::Debug for TelegramGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramGateway")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}
