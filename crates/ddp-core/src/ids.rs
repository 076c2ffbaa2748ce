//! Id generation and credential digests.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generates a random connection-unique id.
///
/// The id is the standard base64 encoding of a v4 UUID's 16 raw bytes,
/// which keeps it short enough for a wire frame while making collisions
/// within one connection practically impossible.
pub fn random_id() -> String {
    STANDARD.encode(Uuid::new_v4().as_bytes())
}

/// Returns the lowercase hex SHA-256 digest of `input`.
///
/// Login payloads carry this digest instead of the clear-text password.
pub fn sha256_hex(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
