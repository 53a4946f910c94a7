//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the webhook manager.

use tracing::{info, warn, error};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::{WebhookManagerError, Result};

/// Initialize logging based on configuration.
///
/// `RUST_LOG` takes precedence over the configured level. When a log directory
/// is configured, the returned guard must be kept alive to flush the file writer.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let stdout_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .boxed()
    };

    let (file_layer, guard) = match &config.file_path {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "webhook-manager.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| WebhookManagerError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log a user action with structured data
pub fn log_user_action(chat_id: i64, action: &str, details: Option<&str>) {
    info!(
        chat_id = chat_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log the outcome of a remote webhook call
pub fn log_gateway_call(chat_id: i64, operation: &str, bot: &str, duration_ms: u64, outcome: std::result::Result<(), &str>) {
    match outcome {
        Ok(()) => info!(
            chat_id = chat_id,
            operation = operation,
            bot = bot,
            duration_ms = duration_ms,
            "Webhook call succeeded"
        ),
        Err(reason) => warn!(
            chat_id = chat_id,
            operation = operation,
            bot = bot,
            duration_ms = duration_ms,
            reason = reason,
            "Webhook call failed"
        ),
    }
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}
