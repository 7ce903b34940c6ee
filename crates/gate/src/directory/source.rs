//! Authoritative directory fetch and normalization
//!
//! The directory endpoint returns a JSON user list whose shape drifted
//! across admin-side iterations: the array may be bare or wrapped in
//! `users`/`data`, the identifier may be `username`/`name`/`userName`, and
//! the ban signal may be `banned`/`disabled`/`status` in boolean, numeric
//! or string encodings. Everything is normalized here, at ingestion;
//! unrecognized shapes fail closed to empty rather than guessing.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use serde_json::Value;

/// Normalized view of the user directory: who exists, who is banned.
/// Usernames are lowercased at ingestion; lookups lowercase to match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub existing: HashSet<String>,
    pub banned: HashSet<String>,
}

impl Roster {
    /// Build a roster from the directory's JSON document.
    pub fn from_json(doc: &Value) -> Self {
        let mut roster = Roster::default();

        let entries = doc
            .as_array()
            .or_else(|| doc.get("users").and_then(Value::as_array))
            .or_else(|| doc.get("data").and_then(Value::as_array));
        let Some(entries) = entries else {
            return roster;
        };

        for entry in entries {
            let Some(username) = entry_username(entry) else {
                continue;
            };
            if entry_banned(entry) {
                roster.banned.insert(username.clone());
            }
            roster.existing.insert(username);
        }

        roster
    }
}

/// Identifier field, tolerating the known aliases.
fn entry_username(entry: &Value) -> Option<String> {
    for field in ["username", "name", "userName"] {
        if let Some(name) = entry.get(field).and_then(Value::as_str) {
            let name = name.trim();
            if !name.is_empty() {
                return Some(name.to_lowercase());
            }
        }
    }
    None
}

/// Ban signal, tolerating the known aliases and encodings. A user is
/// banned if any recognized field carries a truthy ban value.
fn entry_banned(entry: &Value) -> bool {
    ["banned", "disabled", "status"]
        .iter()
        .filter_map(|field| entry.get(*field))
        .any(ban_value)
}

fn ban_value(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => matches!(
            s.to_ascii_lowercase().as_str(),
            "1" | "true" | "banned" | "disabled"
        ),
        _ => false,
    }
}

/// Where the snapshot cache refreshes from.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn fetch(&self) -> Result<Roster, SourceError>;
}

/// HTTP directory source with cache-defeating request semantics and an
/// explicit per-fetch timeout.
pub struct HttpDirectorySource {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpDirectorySource {
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url,
            timeout,
        }
    }
}

#[async_trait]
impl DirectorySource for HttpDirectorySource {
    async fn fetch(&self) -> Result<Roster, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout
                } else {
                    SourceError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        // A malformed non-JSON body (an upstream HTML error page, say) is a
        // fetch failure, never parsed or propagated.
        let doc: Value = response.json().await.map_err(|_| SourceError::Malformed)?;
        Ok(Roster::from_json(&doc))
    }
}

/// Used when no directory is configured (single-shared-secret mode).
pub struct UnconfiguredSource;

#[async_trait]
impl DirectorySource for UnconfiguredSource {
    async fn fetch(&self) -> Result<Roster, SourceError> {
        Err(SourceError::Unconfigured)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("directory request failed: {0}")]
    Request(String),
    #[error("directory request timed out")]
    Timeout,
    #[error("directory returned status {0}")]
    Status(u16),
    #[error("directory response was not valid JSON")]
    Malformed,
    #[error("no directory source configured")]
    Unconfigured,
}
