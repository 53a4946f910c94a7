//! Test helpers module
//!
//! Shared utilities for the integration tests: a mock Telegram Bot API server,
//! a recording in-process gateway and a conversation manager wired to it.

#![allow(dead_code)]

pub mod recording_gateway;
pub mod telegram_mock;
pub mod test_context;

pub use recording_gateway::*;
pub use telegram_mock::*;
pub use test_context::*;

/// A token with the shape of a real bot token
pub const VALID_TOKEN: &str = "123456789:ABCDEFGHIJKLMNOPQRSTUVWXYZabcdef0123456789012345";

/// Another valid token, for tests that need two bots
pub const OTHER_TOKEN: &str = "987654321:zyxwvutsrqponmlkjihgfedcbaZYXWVUTSRQPONMLK_-";

pub const WEBHOOK_URL: &str = "https://example.com/webhook";
