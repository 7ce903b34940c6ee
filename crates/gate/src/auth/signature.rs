//! Credential signing and verification

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Sign a username with the server secret.
///
/// Returns the hex-encoded HMAC-SHA256 over the UTF-8 bytes of `username`.
/// This is the value the login flow places in the credential's `signature`
/// field; the gate only ever verifies it.
pub fn sign(username: &str, secret: &str) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::HmacInitFailed)?;
    mac.update(username.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a hex-encoded signature over `username`.
///
/// Never panics: malformed hex and a failed MAC check are both "invalid
/// signature" and yield `false`. The comparison goes through the `hmac`
/// crate's dedicated verify primitive, which is constant-time.
pub fn verify(username: &str, signature_hex: &str, secret: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(username.as_bytes());
    mac.verify_slice(&signature).is_ok()
}

/// Constant-time string equality for the single-shared-secret mode.
///
/// Uses the subtle crate so the comparison does not branch on secret bytes.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        // Do a dummy comparison to avoid length-based timing attacks
        let dummy = vec![0u8; a.len()];
        let _ = a.as_bytes().ct_eq(&dummy);
        return false;
    }

    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("HMAC initialization failed")]
    HmacInitFailed,
}
