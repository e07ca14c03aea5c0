//! Fixed-width text record format.
//!
//! Record layout (default width 63 bytes):
//! ```text
//! +----------------------------+---+--------------+---------------+
//! | hash: 40 uppercase hex     | : | count digits | ' '/'\r' pad  |
//! +----------------------------+---+--------------+---------------+
//!  [0, 40)                      40   [41, ..)       .. W
//! ```
//!
//! There is no header or footer. Record `i` lives at byte offset `i * W`
//! and records are sorted ascending by their hash bytes.

use serde::Serialize;
use thiserror::Error;

use crate::digest::DIGEST_HEX_LEN;

/// Record width of the published ordered-by-hash dumps.
pub const DEFAULT_RECORD_WIDTH: usize = 63;

/// Smallest width that can hold a hash, the separator and one digit.
pub const MIN_RECORD_WIDTH: usize = DIGEST_HEX_LEN + 2;

/// Offset of the `:` separator.
pub const SEPARATOR_OFFSET: usize = DIGEST_HEX_LEN;

/// Offset of the first count digit.
pub const COUNT_OFFSET: usize = SEPARATOR_OFFSET + 1;

/// Separator between hash and count.
pub const SEPARATOR: u8 = b':';

/// One decoded on-disk record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// 40 uppercase hex characters
    pub hash: String,
    /// Breach occurrence count
    pub count: u64,
}

/// Why a record failed to decode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes than a minimal record
    #[error("record is {0} bytes, need at least 42")]
    TooShort(usize),

    /// Byte in the hash field outside `0-9A-F`
    #[error("byte {byte:#04x} at offset {offset} is not uppercase hex")]
    InvalidHashByte { offset: usize, byte: u8 },

    /// Byte 40 is not `:`
    #[error("expected ':' at offset 40, found {0:#04x}")]
    MissingSeparator(u8),

    /// No digits after the separator
    #[error("missing count after ':'")]
    EmptyCount,

    /// Count does not fit in 64 bits
    #[error("count does not fit in 64 bits")]
    CountOverflow,

    /// Something other than padding after the count
    #[error("unexpected byte {byte:#04x} at offset {offset} in padding")]
    InvalidPadding { offset: usize, byte: u8 },
}

#[inline]
fn is_upper_hex(b: u8) -> bool {
    b.is_ascii_digit() || (b'A'..=b'F').contains(&b)
}

#[inline]
fn is_padding(b: u8) -> bool {
    matches!(b, b' ' | b'\r' | b'\n')
}

/// Decode one record slot.
pub fn decode_record(bytes: &[u8]) -> Result<Record, DecodeError> {
    if bytes.len() < MIN_RECORD_WIDTH {
        return Err(DecodeError::TooShort(bytes.len()));
    }

    let hash_bytes = &bytes[..SEPARATOR_OFFSET];
    if let Some(offset) = hash_bytes.iter().position(|&b| !is_upper_hex(b)) {
        return Err(DecodeError::InvalidHashByte {
            offset,
            byte: hash_bytes[offset],
        });
    }

    if bytes[SEPARATOR_OFFSET] != SEPARATOR {
        return Err(DecodeError::MissingSeparator(bytes[SEPARATOR_OFFSET]));
    }

    let tail = &bytes[COUNT_OFFSET..];
    let digits = tail.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return Err(DecodeError::EmptyCount);
    }

    let mut count: u64 = 0;
    for &b in &tail[..digits] {
        count = count
            .checked_mul(10)
            .and_then(|c| c.checked_add(u64::from(b - b'0')))
            .ok_or(DecodeError::CountOverflow)?;
    }

    if let Some(pos) = tail[digits..].iter().position(|&b| !is_padding(b)) {
        let offset = COUNT_OFFSET + digits + pos;
        return Err(DecodeError::InvalidPadding {
            offset,
            byte: bytes[offset],
        });
    }

    // Validated as ASCII hex above.
    let hash = String::from_utf8_lossy(hash_bytes).into_owned();
    Ok(Record { hash, count })
}

/// Encode one record into exactly `width` bytes.
///
/// Returns `None` if `hash` is not 40 uppercase hex characters or the
/// encoded record would not fit.
pub fn encode_record(hash: &str, count: u64, width: usize) -> Option<Vec<u8>> {
    if hash.len() != DIGEST_HEX_LEN || !hash.bytes().all(is_upper_hex) {
        return None;
    }

    let mut buf = Vec::with_capacity(width);
    buf.extend_from_slice(hash.as_bytes());
    buf.push(SEPARATOR);
    buf.extend_from_slice(count.to_string().as_bytes());

    // Keep the trailing '\r' of the published dumps when there is room.
    if buf.len() >= width {
        return (buf.len() == width).then_some(buf);
    }
    buf.resize(width - 1, b' ');
    buf.push(b'\r');
    Some(buf)
}
