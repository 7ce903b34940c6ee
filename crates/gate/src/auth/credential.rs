//! The `auth` cookie and its encoding
//!
//! The credential is a small JSON object carried base64-encoded in the
//! `auth` cookie. The login flow encodes it; the gate only needs to decode,
//! but the mirror operation is kept here so issuance and tests share one
//! definition of the wire format.

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Cookie the credential travels in.
pub const AUTH_COOKIE: &str = "auth";

/// The client-presented credential.
///
/// `username` + `signature` are required in multi-user mode; `password` is
/// only meaningful in single-shared-secret mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Credential {
    /// Decode a raw cookie value.
    ///
    /// Malformed input is a normal outcome (anonymous request), not an
    /// error: anything that is not base64-wrapped JSON yields `None`.
    pub fn from_cookie(raw: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(raw.trim()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Encode this credential as a cookie value. Round-trips with
    /// [`Credential::from_cookie`].
    pub fn to_cookie(&self) -> Result<String, serde_json::Error> {
        Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(self)?))
    }
}

/// Extract a named cookie's value from the request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(name) {
            return parts.next().map(str::to_string);
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_round_trip() {
        let cred = Credential {
            username: Some("alice".to_string()),
            password: None,
            signature: Some("deadbeef".to_string()),
        };
        let raw = cred.to_cookie().unwrap();
        assert_eq!(Credential::from_cookie(&raw), Some(cred));
    }

    #[test]
    fn test_password_only_round_trip() {
        let cred = Credential {
            username: None,
            password: Some("hunter2".to_string()),
            signature: None,
        };
        let raw = cred.to_cookie().unwrap();
        assert_eq!(Credential::from_cookie(&raw), Some(cred));
    }

    #[test]
    fn test_garbled_cookie_is_absent() {
        assert_eq!(Credential::from_cookie("not base64 !!!"), None);
        assert_eq!(Credential::from_cookie(""), None);
        // Valid base64, not JSON
        let raw = URL_SAFE_NO_PAD.encode(b"<html>nope</html>");
        assert_eq!(Credential::from_cookie(&raw), None);
    }

    #[test]
    fn test_cookie_value_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; auth=abc123; lang=en"),
        );
        assert_eq!(cookie_value(&headers, "auth"), Some("abc123".to_string()));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark".to_string()));
        assert_eq!(cookie_value(&headers, "missing"), None);

        let empty = HeaderMap::new();
        assert_eq!(cookie_value(&empty, "auth"), None);
    }
}
