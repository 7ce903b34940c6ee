//! Route classification
//!
//! A static allow-list of paths that bypass the authorization pipeline
//! entirely. Its correctness is a security invariant: any authenticated
//! route added here is an authorization bypass.

use crate::config::Config;

/// Paths matched exactly.
const EXEMPT_EXACT: &[&str] = &[
    "/favicon.ico",
    "/robots.txt",
    "/manifest.json",
    "/login",
    "/register",
    "/logout",
];

/// Path prefixes for static assets, the login surfaces, health probes and
/// scheduled-job triggers.
const EXEMPT_PREFIXES: &[&str] = &[
    "/_next/static/",
    "/static/",
    "/assets/",
    "/login/",
    "/register/",
    "/api/auth/",
    "/api/cron/",
    "/health",
];

/// Decides which request paths are exempt from authorization.
#[derive(Debug, Clone, Default)]
pub struct RouteClassifier {
    extra_prefixes: Vec<String>,
    /// The path the snapshot cache refreshes from. Exempting it prevents
    /// the refresh fetch from recursing into authorization when the
    /// directory is served behind this same gate.
    refresh_path: Option<String>,
}

impl RouteClassifier {
    pub fn new(extra_prefixes: Vec<String>, refresh_path: Option<String>) -> Self {
        Self {
            extra_prefixes,
            refresh_path,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let refresh_path = config
            .directory_url
            .as_deref()
            .and_then(|raw| url::Url::parse(raw).ok())
            .map(|u| u.path().to_string());

        Self::new(config.exempt_prefixes.clone(), refresh_path)
    }

    /// Is this path exempt from the authorization pipeline?
    pub fn is_exempt(&self, path: &str) -> bool {
        if EXEMPT_EXACT.contains(&path) {
            return true;
        }
        if EXEMPT_PREFIXES.iter().any(|p| path.starts_with(p)) {
            return true;
        }
        if self.extra_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return true;
        }
        self.refresh_path.as_deref() == Some(path)
    }
}
