//! Error types for illustration and annotation runs.

use std::time::Duration;

/// Errors that can occur while generating or annotating book images.
#[derive(Debug, thiserror::Error)]
pub enum BookartError {
    /// Required configuration is missing or malformed (e.g. no API key).
    #[error("configuration error: {0}")]
    Config(String),

    /// API key rejected by the vendor.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested wait, when the response carried one.
        retry_after: Option<Duration>,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The call succeeded but carried no inline image.
    #[error("no image data in response (finish reason: {})", .finish_reason.as_deref().unwrap_or("unknown"))]
    NoImage {
        /// Vendor finish reason of the first candidate, if any.
        finish_reason: Option<String>,
        /// Text parts the model returned instead of an image.
        text: Vec<String>,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving or backing up a file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A manifest entry failed validation.
    #[error("invalid manifest: {0}")]
    Manifest(String),
}

/// Result type alias for bookart operations.
pub type Result<T> = std::result::Result<T, BookartError>;

/// Maximum length of a vendor error body kept in [`BookartError::Api`].
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Trims a vendor error body and redacts anything that looks like an API key.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            let bare = word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-');
            if bare.starts_with("AIza") && bare.len() >= 30 {
                word.replace(bare, "[REDACTED]")
            } else {
                word.to_string()
            }
        })
        .collect();
    let joined = redacted.join(" ");

    if joined.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = joined.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}...")
    } else {
        joined
    }
}

/// Parses a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BookartError::Api {
            status: 500,
            message: "Internal".into(),
        };
        assert_eq!(err.to_string(), "API error: 500 - Internal");

        let err = BookartError::NoImage {
            finish_reason: Some("IMAGE_OTHER".into()),
            text: vec!["I can't draw that".into()],
        };
        assert_eq!(
            err.to_string(),
            "no image data in response (finish reason: IMAGE_OTHER)"
        );

        let err = BookartError::NoImage {
            finish_reason: None,
            text: vec![],
        };
        assert_eq!(
            err.to_string(),
            "no image data in response (finish reason: unknown)"
        );
    }

    #[test]
    fn test_sanitize_redacts_keys() {
        let msg = "API key AIzaSyA1234567890abcdefghijklmnopqrs is invalid.";
        let clean = sanitize_error_message(msg);
        assert!(!clean.contains("AIzaSy"));
        assert!(clean.contains("[REDACTED]"));
        assert!(clean.ends_with("is invalid."));
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(2_000);
        let clean = sanitize_error_message(&long);
        assert_eq!(clean.chars().count(), MAX_ERROR_MESSAGE_LEN + 3);
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(reqwest::header::RETRY_AFTER, "30".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(30));

        headers.insert(
            reqwest::header::RETRY_AFTER,
            "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap(),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }
}
