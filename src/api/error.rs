//! HTTP error responses.
//!
//! Every handler returns `ApiResult<T>`; failures render as
//! `{ "success": false, "error": <kind>, "message": ... }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use crate::families::CacheError;
use crate::upstream::{ErrorKind, FetchError};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorKind {
    NotFound,
    BadRequest,
    Conflict,
    Timeout,
    UpstreamUnavailable,
    UpstreamDataError,
    Internal,
}

impl ApiErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamUnavailable | Self::UpstreamDataError => StatusCode::BAD_GATEWAY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ErrorKind> for ApiErrorKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Timeout => Self::Timeout,
            ErrorKind::UpstreamUnavailable => Self::UpstreamUnavailable,
            ErrorKind::UpstreamDataError => Self::UpstreamDataError,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    success: bool,
    error: ApiErrorKind,
    message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::BadRequest, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Conflict, message)
    }

    pub fn internal() -> Self {
        Self::new(ApiErrorKind::Internal, "Internal server error")
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind().status_code();
        (status, Json(self)).into_response()
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        warn!("Upstream fetch failed: {}", err);
        Self::new(err.kind().into(), err.to_string())
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Fetch(e) => e.into(),
            e @ CacheError::PayloadType { .. } => {
                error!("Cache invariant broken: {}", e);
                Self::internal()
            }
        }
    }
}

/// Database and other internal failures: logged in full, reported generically.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Internal error: {:#}", err);
        Self::internal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_mapping() {
        let cases = [
            (FetchError::Timeout, StatusCode::GATEWAY_TIMEOUT),
            (
                FetchError::Http { status: 503, body: String::new() },
                StatusCode::BAD_GATEWAY,
            ),
            (FetchError::Unreachable("refused".into()), StatusCode::BAD_GATEWAY),
            (FetchError::Malformed("not json".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).kind().status_code(), status);
        }
    }

    #[test]
    fn test_payload_type_is_internal() {
        let err = CacheError::PayloadType {
            key: "drivers:*".into(),
            expected: "Driver",
            found: "Company",
        };
        assert_eq!(ApiError::from(err).kind(), ApiErrorKind::Internal);
    }

    #[test]
    fn test_body_shape() {
        let body = serde_json::to_value(ApiError::from(FetchError::Timeout)).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "TIMEOUT");
        assert_eq!(body["message"], "Upstream request timed out");

        let body = serde_json::to_value(ApiError::not_found("Driver D9 not found")).unwrap();
        assert_eq!(body["error"], "NOT_FOUND");
    }
}
