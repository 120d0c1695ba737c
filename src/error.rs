//! # M-Bus Error Handling
//!
//! This module defines the MBusError enum, which represents the different error
//! types that can occur while talking to a meter: transport failures, frames
//! that never materialize on the line, missing acknowledgements and payloads
//! that cannot be decoded.

use thiserror::Error;

/// Represents the different error types that can occur in the M-Bus crate.
#[derive(Debug, Error)]
pub enum MBusError {
    /// A write, read or deadline operation on the underlying connection failed.
    /// Read deadline expiry surfaces here with `ErrorKind::TimedOut`.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The scanner gave up after too many bytes without a complete long frame.
    #[error("No long frame found")]
    NoFrameFound,

    /// The single-character acknowledgement (0xE5) never arrived.
    #[error("Timed out waiting for acknowledgement")]
    AckTimeout,

    /// Indicates an error when parsing an M-Bus frame.
    #[error("Error parsing M-Bus frame: {0}")]
    FrameParseError(String),

    /// Indicates a checksum mismatch.
    #[error("Invalid checksum: expected {expected}, calculated {calculated}")]
    InvalidChecksum { expected: u8, calculated: u8 },

    /// The CI field announces a payload structure this decoder does not handle.
    #[error("Unsupported CI field: 0x{0:02X}")]
    UnsupportedCi(u8),

    /// Indicates an unknown DIF.
    #[error("Unknown DIF: 0x{0:02X}")]
    UnknownDif(u8),

    /// Indicates an unknown Value Information Field (VIF) was encountered.
    #[error("Unknown VIF: 0x{0:02X}")]
    UnknownVif(u8),

    /// Indicates an unknown Value Information Extension Field (VIFE) was encountered.
    #[error("Unknown VIFE: 0x{0:02X}")]
    UnknownVife(u8),

    /// Indicates the DIFE chain is too long.
    #[error("DIF too long")]
    DifTooLong,

    /// Indicates VIF is too long.
    #[error("VIF too long")]
    VifTooLong,

    /// The LVAR byte of a variable-length record is outside the defined ranges.
    #[error("Invalid LVAR: 0x{0:02X}")]
    InvalidLvar(u8),

    /// A BCD field contained a non-decimal digit.
    #[error("Invalid BCD data")]
    InvalidBcd,

    /// A BCD field holds more digits than an `i64` can represent.
    #[error("BCD value out of range")]
    BcdOverflow,

    /// Indicates a premature end of data.
    #[error("Premature end of data")]
    PrematureEndAtData,
}

impl MBusError {
    /// True for errors raised while interpreting a complete frame, as opposed
    /// to errors raised while talking to the device.
    pub fn is_decode_error(&self) -> bool {
        !matches!(
            self,
            MBusError::Transport(_) | MBusError::NoFrameFound | MBusError::AckTimeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts_to_transport() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline");
        let err: MBusError = io.into();
        assert!(matches!(err, MBusError::Transport(ref e) if e.kind() == std::io::ErrorKind::TimedOut));
        assert!(!err.is_decode_error());
    }

    #[test]
    fn test_decode_error_grouping() {
        assert!(MBusError::InvalidChecksum { expected: 1, calculated: 2 }.is_decode_error());
        assert!(MBusError::PrematureEndAtData.is_decode_error());
        assert!(!MBusError::NoFrameFound.is_decode_error());
        assert!(!MBusError::AckTimeout.is_decode_error());
    }
}
