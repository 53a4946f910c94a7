//! Mock Telegram Bot API server for testing
//!
//! Simulates the webhook methods of the Bot API with wiremock. Method names are
//! matched case-insensitively, like the real API does.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{
    matchers::{method, path_regex},
    Mock, MockServer, ResponseTemplate,
};
use webhook_manager::config::GatewayConfig;
use webhook_manager::TelegramGateway;

/// Mock Telegram API server for testing
pub struct TelegramMockServer {
    pub server: MockServer,
}

/// Configuration for mock responses
#[derive(Debug, Clone)]
pub struct MockResponseConfig {
    pub status: u16,
    pub body: Value,
    /// Sent instead of `body` when set, for answers that are not JSON
    pub raw_body: Option<String>,
    pub delay_ms: Option<u64>,
}

impl MockResponseConfig {
    /// `{"ok": true, "result": ...}`
    pub fn ok(result: Value) -> Self {
        Self {
            status: 200,
            body: json!({ "ok": true, "result": result }),
            raw_body: None,
            delay_ms: None,
        }
    }

    /// An error answer with the given HTTP status and description
    pub fn error(status: u16, description: &str) -> Self {
        Self {
            status,
            body: json!({ "ok": false, "error_code": status, "description": description }),
            raw_body: None,
            delay_ms: None,
        }
    }

    /// A flood-control answer asking to retry after `seconds`
    pub fn retry_after(seconds: u32) -> Self {
        Self {
            status: 429,
            body: json!({
                "ok": false,
                "error_code": 429,
                "description": format!("Too Many Requests: retry after {}", seconds),
                "parameters": { "retry_after": seconds }
            }),
            raw_body: None,
            delay_ms: None,
        }
    }

    /// A non-JSON page, as served by a failing proxy in front of the API
    pub fn html(status: u16, page: &str) -> Self {
        Self {
            status,
            body: Value::Null,
            raw_body: Some(page.to_string()),
            delay_ms: None,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }
}

/// `getWebhookInfo` result for a registered webhook
pub fn webhook_info_json(url: &str, pending: u32) -> Value {
    json!({
        "url": url,
        "has_custom_certificate": false,
        "pending_update_count": pending
    })
}

impl TelegramMockServer {
    /// Create a new mock Telegram API server
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Gateway pointed at this server
    pub fn gateway(&self, timeout_seconds: u64) -> TelegramGateway {
        TelegramGateway::new(&GatewayConfig {
            api_url: Some(self.server.uri()),
            timeout_seconds,
        })
        .expect("gateway for mock server")
    }

    pub async fn mock_set_webhook(&self, config: MockResponseConfig) {
        self.mount("setwebhook", config).await;
    }

    pub async fn mock_delete_webhook(&self, config: MockResponseConfig) {
        self.mount("deletewebhook", config).await;
    }

    pub async fn mock_get_webhook_info(&self, config: MockResponseConfig) {
        self.mount("getwebhookinfo", config).await;
    }

    /// Number of requests received for a method
    pub async fn request_count(&self, api_method: &str) -> usize {
        let suffix = format!("/{}", api_method.to_lowercase());
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path().to_lowercase().ends_with(&suffix))
            .count()
    }

    /// Requests received for a method, with the bot token found in their path
    pub async fn tokens_used(&self, api_method: &str) -> Vec<String> {
        let suffix = format!("/{}", api_method.to_lowercase());
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path().to_lowercase().ends_with(&suffix))
            .filter_map(|request| {
                request
                    .url
                    .path()
                    .split('/')
                    .find_map(|segment| segment.strip_prefix("bot"))
                    .map(str::to_string)
            })
            .collect()
    }

    async fn mount(&self, api_method: &str, config: MockResponseConfig) {
        let mut response = match config.raw_body {
            Some(page) => ResponseTemplate::new(config.status).set_body_raw(page, "text/html"),
            None => ResponseTemplate::new(config.status).set_body_json(config.body),
        };

        if let Some(delay) = config.delay_ms {
            response = response.set_delay(Duration::from_millis(delay));
        }

        Mock::given(method("POST"))
            .and(path_regex(format!(r"(?i)^/bot[^/]+/{}$", api_method)))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }
}
