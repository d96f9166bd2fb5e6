//! Share token generation and comparison.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand_core::{OsRng, RngCore};
use subtle::ConstantTimeEq;

/// Random bytes per token (192 bits of entropy).
pub const TOKEN_BYTES: usize = 24;

/// Length of an encoded token in characters.
pub const TOKEN_LENGTH: usize = 32;

/// Generate an unguessable URL-safe share token.
///
/// The token is pure randomness: it encodes nothing about the shared object.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare two tokens without leaking the position of the first mismatch.
pub fn tokens_match(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Cheap shape check applied before any storage lookup.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
