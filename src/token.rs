//! Token minting and deep-link composition.
//!
//! Tokens carry 8 bytes of OS randomness, base64url-encoded without padding
//! (11 characters). Collisions are not checked for: at this entropy a
//! collision would require ~2^32 issuances, and the store's upsert semantics
//! make the failure mode an overwrite rather than an error.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

/// Bytes of entropy per token.
const TOKEN_ENTROPY_BYTES: usize = 8;

/// Callback payload prefix for the membership re-check button.
pub const RETRY_PREFIX: &str = "check|";

/// Mint a fresh URL-safe token.
pub fn mint() -> String {
    let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compose the shareable deep link for a token.
pub fn deep_link(bot_username: &str, token: &str) -> String {
    format!("https://t.me/{bot_username}?start={token}")
}

/// Build the callback payload carried by the re-check button.
pub fn retry_payload(token: &str) -> String {
    format!("{RETRY_PREFIX}{token}")
}

/// Extract the token from a re-check callback payload.
///
/// Returns `None` for payloads that do not carry the expected prefix, e.g.
/// callbacks from a stale keyboard of an older bot version.
pub fn parse_retry_payload(payload: &str) -> Option<&str> {
    payload.strip_prefix(RETRY_PREFIX)
}
