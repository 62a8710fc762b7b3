use serde::Serialize;
use thiserror::Error;

/// Failure of a single upstream fetch.
///
/// Cloneable so one failed fetch can be handed to every caller that was
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed upstream response: {0}")]
    Malformed(String),

    #[error("Scoped lookups are not supported for {0}")]
    Unsupported(&'static str),
}

/// Coarse classification surfaced to HTTP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    UpstreamUnavailable,
    UpstreamDataError,
    Timeout,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Timeout => ErrorKind::Timeout,
            FetchError::Http { .. } | FetchError::Unreachable(_) => ErrorKind::UpstreamUnavailable,
            FetchError::Malformed(_) | FetchError::Unsupported(_) => ErrorKind::UpstreamDataError,
        }
    }

    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        FetchError::Http {
            status: status.as_u16(),
            body: Self::truncate_body(body),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Http {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            FetchError::Unreachable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(FetchError::Timeout.kind(), ErrorKind::Timeout);
        assert_eq!(
            FetchError::Unreachable("refused".into()).kind(),
            ErrorKind::UpstreamUnavailable
        );
        assert_eq!(
            FetchError::Http { status: 503, body: String::new() }.kind(),
            ErrorKind::UpstreamUnavailable
        );
        assert_eq!(FetchError::Malformed("x".into()).kind(), ErrorKind::UpstreamDataError);
    }

    #[test]
    fn test_from_status_truncates_body() {
        let body = "e".repeat(2_000);
        match FetchError::from_status(reqwest::StatusCode::BAD_GATEWAY, &body) {
            FetchError::Http { status, body } => {
                assert_eq!(status, 502);
                assert!(body.contains("truncated, 2000 total bytes"));
                assert!(body.len() < 600);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
