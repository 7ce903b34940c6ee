//! Directory snapshot cache with TTL
//!
//! Holds one point-in-time copy of the directory's existence/ban facts per
//! process, decoupling the hot request path from the durable store. Lookups
//! refresh lazily once the TTL elapses and keep serving the stale snapshot
//! when a refresh fails; "unknown" is only reported while no snapshot has
//! ever been captured. Lookup methods take `now` so tests control the clock.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::source::{DirectorySource, Roster};

/// A point-in-time capture of the directory.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    pub captured_at: Instant,
    pub roster: Roster,
}

/// Result of a cached directory lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// A snapshot answered the question. `stale` is set when the snapshot
    /// had expired and the refresh that should have replaced it failed.
    Known {
        exists: bool,
        banned: bool,
        stale: bool,
    },
    /// No snapshot has ever been captured; neither confirmed live nor
    /// confirmed banned. The decision engine applies its fail policy.
    Unknown,
}

/// Thread-safe snapshot cache.
///
/// The only shared mutable state in the gate. Concurrent requests may race
/// to refresh an expired snapshot; that is deliberate — a few redundant
/// upstream fetches under load beat cross-request locking, and the newest
/// capture wins. Readers never block on an in-flight refresh.
pub struct SnapshotCache {
    source: Arc<dyn DirectorySource>,
    ttl: Duration,
    snapshot: RwLock<Option<DirectorySnapshot>>,
}

impl SnapshotCache {
    pub fn new(source: Arc<dyn DirectorySource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            snapshot: RwLock::new(None),
        }
    }

    /// Existence and ban status for one username.
    pub async fn lookup(&self, username: &str, now: Instant) -> Lookup {
        let username = username.to_lowercase();
        self.ensure_fresh(now).await;

        let guard = match self.snapshot.read() {
            Ok(guard) => guard,
            Err(_) => return Lookup::Unknown,
        };
        match guard.as_ref() {
            Some(snap) => Lookup::Known {
                exists: snap.roster.existing.contains(&username),
                banned: snap.roster.banned.contains(&username),
                stale: now.duration_since(snap.captured_at) >= self.ttl,
            },
            None => Lookup::Unknown,
        }
    }

    /// The current banned set, or `None` while no snapshot exists.
    pub async fn banned_set(&self, now: Instant) -> Option<HashSet<String>> {
        self.ensure_fresh(now).await;
        let guard = self.snapshot.read().ok()?;
        guard.as_ref().map(|s| s.roster.banned.clone())
    }

    /// Whether a username exists, or `None` while no snapshot exists.
    pub async fn exists(&self, username: &str, now: Instant) -> Option<bool> {
        match self.lookup(username, now).await {
            Lookup::Known { exists, .. } => Some(exists),
            Lookup::Unknown => None,
        }
    }

    /// True once any snapshot has been captured.
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.read().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Refresh if the held snapshot is missing or expired.
    async fn ensure_fresh(&self, now: Instant) {
        let fresh = self
            .snapshot
            .read()
            .ok()
            .and_then(|guard| {
                guard
                    .as_ref()
                    .map(|s| now.duration_since(s.captured_at) < self.ttl)
            })
            .unwrap_or(false);

        if !fresh {
            self.refresh(now).await;
        }
    }

    /// Fetch the directory and replace the snapshot. On failure the prior
    /// snapshot is kept — bounded staleness beats failing the request.
    /// Returns whether the refresh succeeded.
    pub async fn refresh(&self, now: Instant) -> bool {
        match self.source.fetch().await {
            Ok(roster) => {
                debug!(
                    users = roster.existing.len(),
                    banned = roster.banned.len(),
                    "directory snapshot refreshed"
                );
                if let Ok(mut guard) = self.snapshot.write() {
                    // Concurrent refreshes may finish out of order; keep the
                    // newest capture.
                    let newer = guard.as_ref().map_or(true, |s| now >= s.captured_at);
                    if newer {
                        *guard = Some(DirectorySnapshot {
                            captured_at: now,
                            roster,
                        });
                    }
                }
                true
            }
            Err(err) => {
                warn!(error = %err, "directory refresh failed; serving stale snapshot if one exists");
                false
            }
        }
    }
}
