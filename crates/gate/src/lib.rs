//! Authgate
//!
//! A stateless, edge-evaluated authorization gate for multi-user web
//! services. Every request is checked for a cryptographically valid
//! credential bound to a user that still exists and is not banned, without
//! a server-held session store and without a durable-store lookup per
//! request: ban/existence facts come from a TTL-bounded directory snapshot
//! that serves stale on refresh failure.

pub mod auth;
pub mod classify;
pub mod config;
pub mod directory;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::{AuthGate, Credential, Verdict};
pub use classify::RouteClassifier;
pub use config::{AuthMode, Config, FailPolicy};
pub use directory::{Lookup, SnapshotCache};
pub use error::GateError;
pub use state::AppState;
