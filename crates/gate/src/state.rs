//! Shared application state

use std::sync::Arc;

use crate::auth::AuthGate;
use crate::config::Config;
use crate::directory::{DirectorySource, HttpDirectorySource, SnapshotCache, UnconfiguredSource};

/// Per-process state shared across request handlers: one gate, one
/// snapshot cache.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let source: Arc<dyn DirectorySource> = match &config.directory_url {
            Some(url) => Arc::new(HttpDirectorySource::new(
                url.clone(),
                config.directory_timeout,
            )),
            None => Arc::new(UnconfiguredSource),
        };
        let cache = Arc::new(SnapshotCache::new(source, config.directory_ttl));

        Self {
            gate: Arc::new(AuthGate::new(config, cache)),
        }
    }
}
