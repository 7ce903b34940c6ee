//! The per-request authorization decision
//!
//! An ordered state machine evaluated once per request. Cheap local checks
//! (route exemption, secret presence, credential presence, signature) come
//! first; the directory lookup is last because it is the only step with
//! I/O latency and failure modes.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::credential::{cookie_value, Credential, AUTH_COOKIE};
use super::{lifecycle, signature};
use crate::classify::RouteClassifier;
use crate::config::{AuthMode, Config, FailPolicy};
use crate::directory::{Lookup, SnapshotCache};
use crate::error::GateError;
use crate::state::AppState;

/// Terminal outcome of the decision state machine. Produced fresh per
/// request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    DenyUnauthenticated,
    DenyInvalidSignature,
    DenyBanned,
    DenyDeleted,
    DenyConfigUnavailable,
}

impl Verdict {
    /// The client-visible error for a deny verdict; `None` for `Allow`.
    pub fn error(&self) -> Option<GateError> {
        match self {
            Verdict::Allow => None,
            Verdict::DenyUnauthenticated => Some(GateError::Unauthenticated),
            Verdict::DenyInvalidSignature => Some(GateError::InvalidSignature),
            Verdict::DenyBanned => Some(GateError::Banned),
            Verdict::DenyDeleted => Some(GateError::Deleted),
            Verdict::DenyConfigUnavailable => Some(GateError::ConfigUnavailable),
        }
    }
}

/// The authorization gate: configuration plus the one shared snapshot
/// cache. Constructed once per process and shared across request handlers.
pub struct AuthGate {
    mode: AuthMode,
    secret: Option<String>,
    fail_policy: FailPolicy,
    classifier: RouteClassifier,
    cache: Arc<SnapshotCache>,
}

impl AuthGate {
    pub fn new(config: &Config, cache: Arc<SnapshotCache>) -> Self {
        Self {
            mode: config.mode,
            secret: config.secret.clone(),
            fail_policy: config.fail_policy,
            classifier: RouteClassifier::from_config(config),
            cache,
        }
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Evaluate the state machine for one request. First match wins.
    pub async fn decide(&self, path: &str, raw_cookie: Option<&str>, now: Instant) -> Verdict {
        // 1. Exempt routes bypass everything below.
        if self.classifier.is_exempt(path) {
            return Verdict::Allow;
        }

        // 2. No server secret: operator misconfiguration. No credential
        //    could ever satisfy the gate, so signal that distinctly.
        let Some(secret) = self.secret.as_deref() else {
            return Verdict::DenyConfigUnavailable;
        };

        // 3. Absent credential. A present-but-garbled cookie lands here
        //    too; the deny response destroys it either way.
        let Some(raw) = raw_cookie else {
            return Verdict::DenyUnauthenticated;
        };
        let Some(credential) = Credential::from_cookie(raw) else {
            debug!("garbled auth cookie treated as anonymous");
            return Verdict::DenyUnauthenticated;
        };

        match self.mode {
            // 4. Shared secret: direct equality, no user directory and
            //    therefore no per-user ban state to consult.
            AuthMode::SingleSecret => {
                let ok = credential
                    .password
                    .as_deref()
                    .map(|p| signature::constant_time_eq(p, secret))
                    .unwrap_or(false);
                if ok {
                    Verdict::Allow
                } else {
                    Verdict::DenyUnauthenticated
                }
            }

            AuthMode::MultiUser => {
                // 5. Signature check.
                let (username, sig) = match (
                    credential.username.as_deref(),
                    credential.signature.as_deref(),
                ) {
                    (Some(u), Some(s)) => (u, s),
                    _ => return Verdict::DenyUnauthenticated,
                };
                if !signature::verify(username, sig, secret) {
                    return Verdict::DenyInvalidSignature;
                }

                // 6. Directory facts, via the snapshot cache.
                match self.cache.lookup(username, now).await {
                    Lookup::Known { exists: false, .. } => Verdict::DenyDeleted,
                    Lookup::Known { banned: true, .. } => Verdict::DenyBanned,
                    // 8. Cryptographically valid, exists, not banned.
                    Lookup::Known { .. } => Verdict::Allow,
                    // 7. Never observed the directory: apply fail policy.
                    Lookup::Unknown => match self.fail_policy {
                        FailPolicy::Closed => Verdict::DenyConfigUnavailable,
                        FailPolicy::Open => Verdict::Allow,
                    },
                }
            }
        }
    }
}

/// Axum middleware wrapping [`AuthGate::decide`]. Allowed requests proceed
/// untouched; denied ones are answered by the lifecycle manager.
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let raw_cookie = cookie_value(req.headers(), AUTH_COOKIE);

    let verdict = state
        .gate
        .decide(&path, raw_cookie.as_deref(), Instant::now())
        .await;

    match verdict.error() {
        None => next.run(req).await,
        Some(error) => {
            match error {
                GateError::Banned | GateError::Deleted => {
                    warn!(path = %path, reason = error.reason_code(), "request denied");
                }
                _ => debug!(path = %path, reason = error.reason_code(), "request denied"),
            }
            lifecycle::deny_response(error, req.uri(), req.headers())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::directory::source::SourceError;
    use crate::directory::{DirectorySource, Roster};
    use async_trait::async_trait;
    use std::time::Duration;

    struct StaticSource(Result<Roster, SourceError>);

    #[async_trait]
    impl DirectorySource for StaticSource {
        async fn fetch(&self) -> Result<Roster, SourceError> {
            match &self.0 {
                Ok(roster) => Ok(roster.clone()),
                Err(_) => Err(SourceError::Timeout),
            }
        }
    }

    fn roster(existing: &[&str], banned: &[&str]) -> Roster {
        Roster {
            existing: existing.iter().map(|s| s.to_string()).collect(),
            banned: banned.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn gate_with(config: Config, source: StaticSource) -> AuthGate {
        let cache = Arc::new(SnapshotCache::new(
            Arc::new(source),
            Duration::from_secs(15),
        ));
        AuthGate::new(&config, cache)
    }

    fn multi_config() -> Config {
        Config {
            bind_address: "127.0.0.1:0".to_string(),
            mode: AuthMode::MultiUser,
            secret: Some("server-secret".to_string()),
            fail_policy: FailPolicy::Closed,
            directory_url: Some("http://directory.internal/api/users".to_string()),
            directory_ttl: Duration::from_secs(15),
            directory_timeout: Duration::from_secs(1),
            exempt_prefixes: vec![],
        }
    }

    fn signed_cookie(username: &str, secret: &str) -> String {
        Credential {
            username: Some(username.to_string()),
            password: None,
            signature: Some(signature::sign(username, secret).unwrap()),
        }
        .to_cookie()
        .unwrap()
    }

    #[tokio::test]
    async fn test_exempt_path_allows_without_credential() {
        let gate = gate_with(multi_config(), StaticSource(Err(SourceError::Timeout)));
        let verdict = gate
            .decide("/_next/static/chunk.js", None, Instant::now())
            .await;
        assert_eq!(verdict, Verdict::Allow);
    }

    #[tokio::test]
    async fn test_missing_secret_is_config_unavailable() {
        let mut config = multi_config();
        config.secret = None;
        let gate = gate_with(config, StaticSource(Ok(roster(&["alice"], &[]))));
        let cookie = signed_cookie("alice", "server-secret");
        let verdict = gate.decide("/dashboard", Some(&cookie), Instant::now()).await;
        assert_eq!(verdict, Verdict::DenyConfigUnavailable);
    }

    #[tokio::test]
    async fn test_absent_and_garbled_credentials() {
        let gate = gate_with(multi_config(), StaticSource(Ok(roster(&["alice"], &[]))));
        assert_eq!(
            gate.decide("/dashboard", None, Instant::now()).await,
            Verdict::DenyUnauthenticated
        );
        assert_eq!(
            gate.decide("/dashboard", Some("!!garbage!!"), Instant::now())
                .await,
            Verdict::DenyUnauthenticated
        );
    }

    #[tokio::test]
    async fn test_single_mode_password_equality() {
        let mut config = multi_config();
        config.mode = AuthMode::SingleSecret;
        config.secret = Some("correct".to_string());
        let gate = gate_with(config, StaticSource(Err(SourceError::Timeout)));

        let good = Credential {
            username: None,
            password: Some("correct".to_string()),
            signature: None,
        }
        .to_cookie()
        .unwrap();
        let bad = Credential {
            username: None,
            password: Some("wrong".to_string()),
            signature: None,
        }
        .to_cookie()
        .unwrap();

        assert_eq!(
            gate.decide("/", Some(&good), Instant::now()).await,
            Verdict::Allow
        );
        assert_eq!(
            gate.decide("/", Some(&bad), Instant::now()).await,
            Verdict::DenyUnauthenticated
        );
    }

    #[tokio::test]
    async fn test_multi_mode_missing_fields() {
        let gate = gate_with(multi_config(), StaticSource(Ok(roster(&["alice"], &[]))));
        let no_signature = Credential {
            username: Some("alice".to_string()),
            password: None,
            signature: None,
        }
        .to_cookie()
        .unwrap();
        assert_eq!(
            gate.decide("/", Some(&no_signature), Instant::now()).await,
            Verdict::DenyUnauthenticated
        );
    }

    #[tokio::test]
    async fn test_invalid_signature() {
        let gate = gate_with(multi_config(), StaticSource(Ok(roster(&["alice"], &[]))));
        let cookie = signed_cookie("alice", "some-other-secret");
        assert_eq!(
            gate.decide("/", Some(&cookie), Instant::now()).await,
            Verdict::DenyInvalidSignature
        );
    }

    #[tokio::test]
    async fn test_banned_and_deleted() {
        let gate = gate_with(
            multi_config(),
            StaticSource(Ok(roster(&["alice", "mallory"], &["mallory"]))),
        );

        let mallory = signed_cookie("mallory", "server-secret");
        assert_eq!(
            gate.decide("/", Some(&mallory), Instant::now()).await,
            Verdict::DenyBanned
        );

        // Valid signature for a user no longer in the directory
        let ghost = signed_cookie("ghost", "server-secret");
        assert_eq!(
            gate.decide("/", Some(&ghost), Instant::now()).await,
            Verdict::DenyDeleted
        );
    }

    #[tokio::test]
    async fn test_live_user_allowed() {
        let gate = gate_with(multi_config(), StaticSource(Ok(roster(&["alice"], &[]))));
        let cookie = signed_cookie("alice", "server-secret");
        assert_eq!(
            gate.decide("/", Some(&cookie), Instant::now()).await,
            Verdict::Allow
        );
    }

    #[tokio::test]
    async fn test_fail_closed_default_on_unknown_directory() {
        let gate = gate_with(multi_config(), StaticSource(Err(SourceError::Timeout)));
        let cookie = signed_cookie("bob", "server-secret");
        assert_eq!(
            gate.decide("/", Some(&cookie), Instant::now()).await,
            Verdict::DenyConfigUnavailable
        );
    }

    #[tokio::test]
    async fn test_fail_open_opt_in() {
        let mut config = multi_config();
        config.fail_policy = FailPolicy::Open;
        let gate = gate_with(config, StaticSource(Err(SourceError::Timeout)));
        let cookie = signed_cookie("bob", "server-secret");
        assert_eq!(
            gate.decide("/", Some(&cookie), Instant::now()).await,
            Verdict::Allow
        );
    }
}
