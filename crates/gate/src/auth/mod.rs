//! Authentication: the credential, its signature, and the per-request
//! authorization decision.

pub mod credential;
pub mod lifecycle;
pub mod middleware;
pub mod signature;

pub use credential::{cookie_value, Credential, AUTH_COOKIE};
pub use middleware::{require_auth, AuthGate, Verdict};
pub use signature::{sign, verify};
