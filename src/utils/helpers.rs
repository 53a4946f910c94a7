//! Helper functions and utilities
//!
//! This module contains the input predicates used by the conversation flows
//! and small formatting helpers shared by handlers and logging.

use std::sync::OnceLock;
use chrono::{DateTime, Utc};
use regex::Regex;

/// Maximum webhook URL length accepted by the Bot API
pub const MAX_WEBHOOK_URL_LENGTH: usize = 2048;

/// Answers that mean "drop pending updates"
pub const AFFIRMATIVE_ANSWERS: &[&str] = &["yes", "y", "بله", "آره", "drop"];

/// Answers that mean "keep pending updates"
pub const NEGATIVE_ANSWERS: &[&str] = &["no", "n", "خیر", "نه"];

fn token_regex() -> &'static Regex {
    static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    TOKEN_REGEX.get_or_init(|| {
        Regex::new(r"^\d+:[A-Za-z0-9_-]{35,}$").expect("token pattern is a valid regex")
    })
}

/// Validate the shape of a Telegram bot token (`<digits>:<35+ url-safe chars>`)
pub fn is_valid_token(token: &str) -> bool {
    token_regex().is_match(token.trim())
}

/// Validate a webhook URL: HTTPS only, at most 2048 characters
pub fn is_valid_webhook_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("https://") && url.chars().count() <= MAX_WEBHOOK_URL_LENGTH
}

/// Parse a drop-pending-updates answer; `None` means the answer is not recognized
pub fn parse_drop_flag(answer: &str) -> Option<bool> {
    let answer = answer.trim().to_lowercase();
    if answer.is_empty() {
        return None;
    }

    if AFFIRMATIVE_ANSWERS.contains(&answer.as_str()) {
        Some(true)
    } else if NEGATIVE_ANSWERS.contains(&answer.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Mask a bot token for logs, keeping the bot id and a short secret prefix
pub fn mask_token(token: &str) -> String {
    let token = token.trim();
    match token.split_once(':') {
        Some((bot_id, secret)) => {
            let visible: String = secret.chars().take(4).collect();
            format!("{}:{}…", bot_id, visible)
        }
        None => "<malformed>".to_string(),
    }
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const VALID_TOKEN: &str = "123456789:ABCDEFGHIJKLMNOPQRSTUVWXYZabcdef0123456789012345";

    #[test]
    fn test_token_validation() {
        assert!(is_valid_token(VALID_TOKEN));
        assert!(is_valid_token(&format!("  {}\n", VALID_TOKEN)));
        assert!(is_valid_token("1:ABCDEFGHIJKLMNOPQRSTUVWXYZ-_abcdefgh"));

        assert!(!is_valid_token(""));
        assert!(!is_valid_token("abc"));
        assert!(!is_valid_token("123456789:short"));
        assert!(!is_valid_token(":ABCDEFGHIJKLMNOPQRSTUVWXYZabcdef0123456789"));
        assert!(!is_valid_token("123456789:ABCDEFGHIJKLMNOPQRSTUVWXYZabcdef01234567!@"));
        assert!(!is_valid_token("12a:ABCDEFGHIJKLMNOPQRSTUVWXYZabcdef0123456789012345"));
    }

    #[test]
    fn test_token_requires_35_secret_chars() {
        let secret_34 = "A".repeat(34);
        let secret_35 = "A".repeat(35);
        assert!(!is_valid_token(&format!("42:{}", secret_34)));
        assert!(is_valid_token(&format!("42:{}", secret_35)));
    }

    #[test]
    fn test_url_validation() {
        assert!(is_valid_webhook_url("https://example.com/webhook"));
        assert!(is_valid_webhook_url("  https://example.com/telegram/webhook  "));

        assert!(!is_valid_webhook_url("http://example.com/webhook"));
        assert!(!is_valid_webhook_url("example.com"));
        assert!(!is_valid_webhook_url(""));
        assert!(!is_valid_webhook_url("HTTPS://example.com"));
    }

    #[test]
    fn test_url_length_limit() {
        let prefix = "https://example.com/";
        let at_limit = format!("{}{}", prefix, "a".repeat(MAX_WEBHOOK_URL_LENGTH - prefix.len()));
        let over_limit = format!("{}a", at_limit);

        assert!(is_valid_webhook_url(&at_limit));
        assert!(!is_valid_webhook_url(&over_limit));
    }

    #[test]
    fn test_drop_flag_parsing() {
        for answer in ["yes", "Y", "YES", " drop ", "Drop", "بله", "آره"] {
            assert_eq!(parse_drop_flag(answer), Some(true), "answer: {answer}");
        }
        for answer in ["no", "N", "No", "خیر", "نه"] {
            assert_eq!(parse_drop_flag(answer), Some(false), "answer: {answer}");
        }
        for answer in ["maybe", "", "   ", "yess", "true", "0"] {
            assert_eq!(parse_drop_flag(answer), None, "answer: {answer}");
        }
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token(VALID_TOKEN), "123456789:ABCD…");
        assert_eq!(mask_token("garbage"), "<malformed>");
        assert!(!mask_token(VALID_TOKEN).contains("0123456789012345"));
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a very long description", 10), "a very ...");
        assert_eq!(truncate_text("سلام دنیا سلام دنیا", 8), "سلام ...");
    }
}
