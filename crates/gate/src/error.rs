//! Gate error types and their API responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Client-visible authorization failure.
///
/// Every variant is recoverable by re-authenticating; none crashes the
/// process. Upstream directory failures never surface here directly — they
/// degrade to serve-stale or, under fail-closed, to `ConfigUnavailable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Invalid credential signature")]
    InvalidSignature,
    #[error("Account is banned")]
    Banned,
    #[error("Account no longer exists")]
    Deleted,
    #[error("Authorization service unavailable or not configured")]
    ConfigUnavailable,
}

impl GateError {
    /// Short machine-readable reason carried in redirect query strings.
    pub fn reason_code(&self) -> &'static str {
        match self {
            GateError::Banned => "banned",
            GateError::Deleted => "deleted",
            _ => "denied",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GateError::Unauthenticated | GateError::InvalidSignature => StatusCode::UNAUTHORIZED,
            GateError::Banned | GateError::Deleted | GateError::ConfigUnavailable => {
                StatusCode::FORBIDDEN
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            GateError::Unauthenticated => "UNAUTHENTICATED",
            GateError::InvalidSignature => "INVALID_SIGNATURE",
            GateError::Banned => "BANNED",
            GateError::Deleted => "DELETED",
            GateError::ConfigUnavailable => "CONFIG_UNAVAILABLE",
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GateError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(GateError::InvalidSignature.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(GateError::Banned.status(), StatusCode::FORBIDDEN);
        assert_eq!(GateError::Deleted.status(), StatusCode::FORBIDDEN);
        assert_eq!(GateError::ConfigUnavailable.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(GateError::Banned.reason_code(), "banned");
        assert_eq!(GateError::Deleted.reason_code(), "deleted");
        assert_eq!(GateError::Unauthenticated.reason_code(), "denied");
        assert_eq!(GateError::ConfigUnavailable.reason_code(), "denied");
    }
}
