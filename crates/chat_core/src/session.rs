//! Session cookie verification.
//!
//! Authentication itself is delegated to the hosted identity provider; it
//! mints a cookie of the form `user_id.hex(sha256(user_id || secret))` and
//! this module only checks the signature before trusting the user id.

use sha2::{Digest, Sha256};

/// Compute the signature half of a session cookie.
pub fn sign_user_id(user_id: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a `user_id.signature` cookie value; returns the user id when valid.
pub fn verify_session_cookie(value: &str, secret: &str) -> Option<String> {
    let (user_id, signature) = value.rsplit_once('.')?;
    if user_id.is_empty() {
        return None;
    }
    if sign_user_id(user_id, secret) == signature {
        Some(user_id.to_string())
    } else {
        None
    }
}
