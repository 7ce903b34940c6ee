//! Application configuration

use std::env;
use std::time::Duration;

/// Authentication mode. The two modes are mutually exclusive and selected
/// by configuration; single-shared-secret is not a fallback for multi-user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// One shared password, no user directory, no per-user ban state.
    SingleSecret,
    /// Per-user signed credentials checked against the user directory.
    MultiUser,
}

/// How the gate decides when the directory has never been observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPolicy {
    /// Deny access on uncertainty (default, recommended).
    Closed,
    /// Allow access on uncertainty (opt-in, availability-favoring).
    Open,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Authentication
    pub mode: AuthMode,
    /// Server-held secret. Absence is not a boot failure: requests are
    /// denied with a distinct "service not configured" signal instead.
    pub secret: Option<String>,
    pub fail_policy: FailPolicy,

    // Directory
    pub directory_url: Option<String>,
    pub directory_ttl: Duration,
    pub directory_timeout: Duration,

    // Routing
    pub exempt_prefixes: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = match env::var("AUTH_MODE")
            .unwrap_or_else(|_| "multi".to_string())
            .as_str()
        {
            "multi" => AuthMode::MultiUser,
            "single" => AuthMode::SingleSecret,
            _ => return Err(ConfigError::Invalid("AUTH_MODE must be 'multi' or 'single'")),
        };

        let directory_url = env::var("DIRECTORY_URL").ok();
        if mode == AuthMode::MultiUser && directory_url.is_none() {
            return Err(ConfigError::Missing("DIRECTORY_URL"));
        }

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),

            mode,
            secret: env::var("AUTH_SECRET").ok().filter(|s| !s.is_empty()),
            fail_policy: if env::var("FAIL_OPEN")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false)
            {
                FailPolicy::Open
            } else {
                FailPolicy::Closed
            },

            directory_url,
            directory_ttl: Duration::from_secs(
                env::var("DIRECTORY_TTL_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .unwrap_or(15),
            ),
            directory_timeout: Duration::from_millis(
                env::var("DIRECTORY_TIMEOUT_MS")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            ),

            exempt_prefixes: env::var("EXEMPT_PREFIXES")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}
