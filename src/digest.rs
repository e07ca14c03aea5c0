//! Search keys: SHA-1 digests rendered the way the dump stores them.

use serde::Serialize;
use sha1::{Digest as _, Sha1};
use std::fmt;

/// Length of a rendered digest in characters.
pub const DIGEST_HEX_LEN: usize = 40;

/// Uppercase hex SHA-1 digest of a cleartext.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Digest(String);

impl Digest {
    /// Hash the raw bytes of `cleartext`. No trimming, no case folding.
    pub fn of(cleartext: &str) -> Self {
        Self::of_bytes(cleartext.as_bytes())
    }

    /// Hash arbitrary bytes.
    pub fn of_bytes(data: &[u8]) -> Self {
        let hash = Sha1::digest(data);
        Digest(hex::encode_upper(hash))
    }

    /// Accept an already-computed hex digest, normalizing it to uppercase.
    ///
    /// Returns `None` unless `hex` is exactly 40 hex characters.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != DIGEST_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(Digest(hex.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the search key for `cleartext`.
pub fn digest(cleartext: &str) -> Digest {
    Digest::of(cleartext)
}
