//! Login session tokens.
//!
//! Tokens are opaque random strings handed to the browser as a cookie. Only
//! their SHA-256 digest is stored, so a database leak does not expose live
//! sessions.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a generated session token.
pub const TOKEN_LENGTH: usize = 48;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "sid";

/// Cookie lifetime: one year. Sessions never expire server-side.
pub const SESSION_COOKIE_MAX_AGE_SECS: u64 = 31_557_600;

/// Generate a new random session token.
pub fn generate_session_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Compute the SHA-256 hex digest of a session token.
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_have_fixed_length_and_alphabet() {
        let token = generate_session_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_session_token(), generate_session_token());
    }

    #[test]
    fn hash_is_stable_hex() {
        let a = hash_session_token("abc");
        assert_eq!(a, hash_session_token("abc"));
        assert_eq!(a.len(), 64);
        assert_eq!(
            a,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
