//! Utility modules
//!
//! This module contains common utilities used throughout the application,
//! including error handling, logging setup, and input predicates.

pub mod errors;
pub mod logging;
pub mod helpers;

pub use errors::{WebhookManagerError, GatewayError, ConversationError, Result, GatewayResult};
