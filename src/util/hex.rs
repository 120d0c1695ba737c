//! # Hex Helpers
//!
//! Frames are logged and captured as hex. The functions here turn raw frame
//! bytes into the layout used in log output and convert captured
//! telegrams (as found in meter documentation or bus sniffer dumps, often
//! with spaces between bytes) back into bytes.
//!
//! ```rust
//! use mbus_master::util::hex::{decode_hex, format_hex_compact};
//!
//! let frame = decode_hex("10 40 05 45 16").unwrap();
//! assert_eq!(frame, [0x10, 0x40, 0x05, 0x45, 0x16]);
//! assert_eq!(format_hex_compact(&frame), "10 40 05 45 16");
//! ```

use thiserror::Error;

/// Errors that can occur while parsing a hex capture
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Decode a hex capture. Whitespace between digits is ignored.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let cleaned: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() {
        return Err(HexError::EmptyString);
    }
    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Formats bytes as "68 31 31 68", the layout used in frame log lines.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
