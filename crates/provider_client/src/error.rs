//! Upstream error taxonomy.
//!
//! Only `AuthenticationRequired` and `RateLimited` get distinguished
//! user-facing treatment; everything else collapses to a generic failure with
//! the server-provided message when one exists.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("rate limited{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("request aborted")]
    Aborted,

    #[error("network error: {0}")]
    Network(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(", retry after {secs}s"),
        None => String::new(),
    }
}

/// JSON error body shapes seen from the upstream providers:
/// `{"error":{"message":"..."}}` or `{"error":"..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Detail { message: String },
    Message(String),
}

/// Extract the human-readable message from an upstream error body, if any.
pub fn parse_error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    Some(match parsed.error {
        ErrorField::Detail { message } => message,
        ErrorField::Message(message) => message,
    })
}

/// Parse a retry-after hint embedded in a rate-limit error message, e.g.
/// "try again in 1500ms" or "retry in 3 seconds". Returned as whole seconds,
/// rounded up (1500ms reports 2).
pub fn parse_retry_after_secs(message: &str) -> Option<u64> {
    static RETRY_AFTER_RE: OnceLock<Regex> = OnceLock::new();
    // Millisecond units first so "1500ms" does not match the seconds arm.
    let re = RETRY_AFTER_RE.get_or_init(|| {
        Regex::new(r"(\d+(?:\.\d+)?)\s*(ms|milliseconds?|s|secs?|seconds?)\b")
            .expect("static retry-after pattern")
    });
    let caps = re.captures(message)?;
    let value: f64 = caps[1].parse().ok()?;
    let secs = match &caps[2] {
        "ms" | "millisecond" | "milliseconds" => value / 1000.0,
        _ => value,
    };
    Some(secs.ceil() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_after_milliseconds_rounds_up() {
        assert_eq!(parse_retry_after_secs("try again in 1500ms"), Some(2));
        assert_eq!(parse_retry_after_secs("try again in 999ms"), Some(1));
        assert_eq!(parse_retry_after_secs("try again in 2000 milliseconds"), Some(2));
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after_secs("retry in 3 seconds"), Some(3));
        assert_eq!(parse_retry_after_secs("please wait 1.2s"), Some(2));
    }

    #[test]
    fn test_parse_retry_after_absent() {
        assert_eq!(parse_retry_after_secs("too many requests"), None);
    }

    #[test]
    fn test_parse_error_message_nested() {
        let body = r#"{"error":{"message":"model overloaded"}}"#;
        assert_eq!(
            parse_error_message(body),
            Some("model overloaded".to_string())
        );
    }

    #[test]
    fn test_parse_error_message_flat() {
        let body = r#"{"error":"bad request"}"#;
        assert_eq!(parse_error_message(body), Some("bad request".to_string()));
    }

    #[test]
    fn test_parse_error_message_not_json() {
        assert_eq!(parse_error_message("<html>502</html>"), None);
    }
}
