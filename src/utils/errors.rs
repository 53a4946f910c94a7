//! Error handling for the webhook manager
//!
//! This module defines the application error type, the failure taxonomy of the
//! remote webhook API, and the user-facing conversation errors each of them
//! is eventually reported as.

use teloxide::{ApiError, RequestError};
use thiserror::Error;

/// Main error type for the webhook manager application
#[derive(Error, Debug)]
pub enum WebhookManagerError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] RequestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Failures reported by the remote webhook API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u32 },

    #[error("{0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

/// User-facing conversation errors, each rendered as its own localized message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    #[error("Invalid bot token")]
    InvalidToken,

    #[error("Invalid webhook URL")]
    InvalidUrl,

    #[error("Invalid drop-pending answer")]
    InvalidFlagInput,

    #[error("Rate limited for {0} seconds")]
    RateLimited(u32),

    #[error("Remote rejected the request: {0}")]
    RemoteRejected(String),

    #[error("Transport failure: {detail}")]
    TransportFailure { timed_out: bool, detail: String },

    #[error("Remote error: {0}")]
    RemoteOther(String),

    #[error("Unknown conversation state")]
    UnknownConversationState,
}

/// Result type alias for webhook manager operations
pub type Result<T> = std::result::Result<T, WebhookManagerError>;

/// Result type alias for remote webhook API calls
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

impl From<RequestError> for GatewayError {
    fn from(error: RequestError) -> Self {
        match error {
            RequestError::RetryAfter(seconds) => GatewayError::RateLimited {
                retry_after_seconds: seconds.seconds(),
            },
            RequestError::Api(api_error) => classify_api_error(api_error),
            RequestError::Network(e) => {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Network(e.to_string())
                }
            }
            RequestError::Io(e) => GatewayError::Network(e.to_string()),
            // 5xx pages from the API front end are HTML, not a Bot API answer
            RequestError::InvalidJson { source, .. } => {
                GatewayError::Network(format!("unexpected response from the Bot API: {}", source))
            }
            other => GatewayError::Other(other.to_string()),
        }
    }
}

/// Split API errors into "the request was refused" and everything else.
///
/// Telegram reports refusals as `Bad Request: ...` or `Forbidden: ...`; teloxide
/// turns the well-known ones into dedicated variants and leaves the rest as
/// `Unknown` with the raw description.
fn classify_api_error(error: ApiError) -> GatewayError {
    match error {
        ApiError::InvalidToken | ApiError::TerminatedByOtherGetUpdates => {
            GatewayError::Other(error.to_string())
        }
        ApiError::Unknown(description) => {
            if description.starts_with("Bad Request") || description.starts_with("Forbidden") {
                GatewayError::Rejected(description)
            } else {
                GatewayError::Other(description)
            }
        }
        known => GatewayError::Rejected(known.to_string()),
    }
}

impl From<GatewayError> for ConversationError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::RateLimited { retry_after_seconds } => {
                ConversationError::RateLimited(retry_after_seconds)
            }
            GatewayError::Rejected(detail) => ConversationError::RemoteRejected(detail),
            GatewayError::Network(detail) => ConversationError::TransportFailure {
                timed_out: false,
                detail,
            },
            GatewayError::Timeout => ConversationError::TransportFailure {
                timed_out: true,
                detail: "timed out".to_string(),
            },
            GatewayError::Other(detail) => ConversationError::RemoteOther(detail),
        }
    }
}

impl ConversationError {
    /// Translation key of the message shown to the user
    pub fn message_key(&self) -> &'static str {
        match self {
            ConversationError::InvalidToken => "validation.invalid_token",
            ConversationError::InvalidUrl => "validation.invalid_url",
            ConversationError::InvalidFlagInput => "validation.invalid_drop_flag",
            ConversationError::RateLimited(_) => "errors.rate_limited",
            ConversationError::RemoteRejected(_) => "errors.rejected",
            ConversationError::TransportFailure { timed_out: true, .. } => "errors.timeout",
            ConversationError::TransportFailure { timed_out: false, .. } => "errors.network",
            ConversationError::RemoteOther(_) => "errors.telegram",
            ConversationError::UnknownConversationState => "errors.unknown_state",
        }
    }
}
