// SPDX-License-Identifier: Apache-2.0

//! Resumable positions.
//!
//! A position is handed to the host as an opaque byte string. Internally it is
//! the decimal text of a byte offset into the source file, which keeps it
//! human-readable when debugging checkpoints.

use std::fmt;

use bytes::Bytes;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Opaque resumption token persisted by the host between restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Position(Bytes);

impl Position {
    /// Wrap raw bytes received from the host.
    pub fn new(raw: impl Into<Bytes>) -> Self {
        Self(raw.into())
    }

    /// Encode a byte offset.
    pub fn from_offset(offset: u64) -> Self {
        Self(Bytes::from(offset.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Position {
    fn from(s: &str) -> Self {
        Self(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Vec<u8>> for Position {
    fn from(v: Vec<u8>) -> Self {
        Self(Bytes::from(v))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A position token that does not hold a non-negative decimal offset.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid position {raw:?}, expected a number")]
pub struct PositionError {
    raw: String,
}

impl PositionError {
    fn new(raw: &[u8]) -> Self {
        Self {
            raw: String::from_utf8_lossy(raw).into_owned(),
        }
    }
}

/// Encode a byte offset into a position.
pub fn encode(offset: u64) -> Position {
    Position::from_offset(offset)
}

/// Decode a position into a byte offset.
///
/// An absent or empty position means the start of the file.
pub fn decode(position: Option<&Position>) -> Result<u64, PositionError> {
    let raw = match position {
        Some(p) if !p.is_empty() => p.as_bytes(),
        _ => return Ok(0),
    };

    // u64::from_str would also accept a leading '+'
    if !raw.iter().all(u8::is_ascii_digit) {
        return Err(PositionError::new(raw));
    }

    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| PositionError::new(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_decimal_text() {
        assert_eq!(encode(0).as_bytes(), b"0");
        assert_eq!(encode(4096).as_bytes(), b"4096");
        assert_eq!(encode(u64::MAX).to_string(), u64::MAX.to_string());
    }

    #[test]
    fn test_decode_round_trip() {
        for n in [0, 1, 2, 10, 1 << 20, u64::MAX - 1, u64::MAX] {
            assert_eq!(decode(Some(&encode(n))).unwrap(), n);
        }
    }

    #[test]
    fn test_decode_absent_is_start_of_file() {
        assert_eq!(decode(None).unwrap(), 0);
        assert_eq!(decode(Some(&Position::default())).unwrap(), 0);
    }

    #[test]
    fn test_decode_rejects_non_numeric() {
        for raw in ["abc", "-1", "+1", "1.5", " 1", "0x10", "18446744073709551616"] {
            let err = decode(Some(&Position::from(raw))).unwrap_err();
            assert!(
                err.to_string().contains("expected a number"),
                "unexpected error for {raw:?}: {err}"
            );
        }
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let pos = Position::from(vec![0xff, 0xfe]);
        assert!(decode(Some(&pos)).is_err());
    }
}
