//! Deny-side credential lifecycle
//!
//! Renders a deny verdict into a response: a redirect to the login surface
//! for page requests, a status + JSON body for API requests, and in both
//! cases instructions for the client to delete the `auth` cookie under
//! every plausible scope it might have been set with.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use url::form_urlencoded;

use super::credential::AUTH_COOKIE;
use crate::error::GateError;

/// Build the full deny response for a request.
pub fn deny_response(error: GateError, uri: &Uri, headers: &HeaderMap) -> Response {
    let mut response = if wants_json(uri, headers) {
        error.into_response()
    } else {
        redirect_to_login(error, uri)
    };

    for value in clear_cookie_values(headers) {
        if let Ok(value) = HeaderValue::from_str(&value) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// API requests get a status code and machine-readable body; everything
/// else is treated as a page request and redirected.
fn wants_json(uri: &Uri, headers: &HeaderMap) -> bool {
    if uri.path().starts_with("/api/") {
        return true;
    }
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}

/// `302` to `/login?redirect=<original>&error=<reason>`.
fn redirect_to_login(error: GateError, uri: &Uri) -> Response {
    let original = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("redirect", original);
    query.append_pair("error", error.reason_code());
    let location = format!("/login?{}", query.finish());

    match HeaderValue::from_str(&location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => error.into_response(),
    }
}

/// Cookie-removal headers for every scope the original cookie may have
/// been set under. A single deletion is not reliable: the issuing side's
/// exact `Domain` attribute cannot be safely assumed here.
fn clear_cookie_values(headers: &HeaderMap) -> Vec<String> {
    let mut values = vec![clear_value(None)];

    if let Some(host) = request_host(headers) {
        if !is_ip_or_localhost(&host) {
            values.push(clear_value(Some(&host)));
            if let Some(registrable) = registrable_domain(&host) {
                if registrable != host {
                    values.push(clear_value(Some(&registrable)));
                }
            }
        }
    }

    values
}

fn clear_value(domain: Option<&str>) -> String {
    match domain {
        Some(domain) => format!(
            "{AUTH_COOKIE}=; Path=/; Domain={domain}; Max-Age=0; HttpOnly; SameSite=Lax"
        ),
        None => format!("{AUTH_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"),
    }
}

/// Host header without the port.
fn request_host(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::HOST)?.to_str().ok()?;
    let host = if let Some(rest) = raw.strip_prefix('[') {
        // Bracketed IPv6 literal
        rest.split(']').next().unwrap_or(rest)
    } else {
        raw.split(':').next().unwrap_or(raw)
    };
    Some(host.to_lowercase())
}

fn is_ip_or_localhost(host: &str) -> bool {
    host == "localhost" || !host.contains('.') || host.parse::<std::net::IpAddr>().is_ok()
}

/// Last two labels of the host. A heuristic, not a public-suffix lookup;
/// good enough for the deployment shapes this gate fronts.
fn registrable_domain(host: &str) -> Option<String> {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return None;
    }
    Some(labels[labels.len() - 2..].join("."))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers_with_host(host: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_str(host).unwrap());
        headers
    }

    #[test]
    fn test_clear_scopes_for_domain_host() {
        let values = clear_cookie_values(&headers_with_host("app.example.com:8443"));
        assert_eq!(values.len(), 3);
        assert!(values[0].starts_with("auth=; Path=/; Max-Age=0"));
        assert!(values[1].contains("Domain=app.example.com"));
        assert!(values[2].contains("Domain=example.com"));
    }

    #[test]
    fn test_clear_scopes_for_bare_ip_and_localhost() {
        for host in ["127.0.0.1:3000", "localhost", "[::1]:3000"] {
            let values = clear_cookie_values(&headers_with_host(host));
            assert_eq!(values.len(), 1, "host {host}");
            assert!(!values[0].contains("Domain="));
        }
    }

    #[test]
    fn test_clear_scopes_for_apex_domain() {
        // Host is already the registrable domain: no duplicate variant
        let values = clear_cookie_values(&headers_with_host("example.com"));
        assert_eq!(values.len(), 2);
        assert!(values[1].contains("Domain=example.com"));
    }

    #[test]
    fn test_page_request_redirects_with_reason() {
        let uri: Uri = "/settings?tab=profile".parse().unwrap();
        let response = deny_response(GateError::Banned, &uri, &headers_with_host("example.com"));
        assert_eq!(response.status(), StatusCode::FOUND);

        let location = response.headers().get(header::LOCATION).unwrap();
        let location = location.to_str().unwrap();
        assert!(location.starts_with("/login?"));
        assert!(location.contains("error=banned"));
        assert!(location.contains("redirect=%2Fsettings%3Ftab%3Dprofile"));

        // Cookie clearing rides along on the redirect
        assert!(response.headers().get_all(header::SET_COOKIE).iter().count() >= 1);
    }

    #[test]
    fn test_api_request_gets_status_and_body() {
        let uri: Uri = "/api/items".parse().unwrap();
        let response = deny_response(
            GateError::Unauthenticated,
            &uri,
            &headers_with_host("example.com"),
        );
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get_all(header::SET_COOKIE).iter().count() >= 1);
    }

    #[test]
    fn test_accept_json_counts_as_api() {
        let mut headers = headers_with_host("example.com");
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let uri: Uri = "/dashboard".parse().unwrap();
        let response = deny_response(GateError::Deleted, &uri, &headers);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(
            registrable_domain("a.b.example.com"),
            Some("example.com".to_string())
        );
        assert_eq!(
            registrable_domain("example.com"),
            Some("example.com".to_string())
        );
        assert_eq!(registrable_domain("localhost"), None);
    }
}
