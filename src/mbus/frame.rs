//! # M-Bus Frame Layout
//!
//! This module provides the two frame shapes a wired M-Bus master puts on the
//! line, together with the checksum and length framing they need.
//!
//! - [`ShortFrame`]: `10 C A CS 16`, checksum = C + A.
//! - [`LongFrame`]: `68 L L 68 C A CI <data> CS 16`, where `L` counts the
//!   bytes from C to the end of the user data and the checksum is their sum.
//!
//! Frames are assembled with zeroed length/checksum slots and then framed:
//!
//! ```
//! use mbus_master::mbus::frame::LongFrame;
//!
//! let frame = LongFrame::new(0x73, 0x05, 0x50, &[]);
//! assert_eq!(frame.as_ref(), &[0x68, 0x03, 0x03, 0x68, 0x73, 0x05, 0x50, 0xC8, 0x16]);
//! assert!(frame.verify().is_ok());
//! ```
//!
//! Received long frames are wrapped without validation; [`LongFrame::verify`]
//! checks the redundant header, stop byte and checksum.

use crate::constants::{
    MBUS_FRAME_LONG_HEADER_LEN, MBUS_FRAME_LONG_OVERHEAD, MBUS_FRAME_LONG_START,
    MBUS_FRAME_SHORT_LEN, MBUS_FRAME_SHORT_START, MBUS_FRAME_STOP,
};
use crate::error::MBusError;
use crate::mbus::control::Control;

/// Sums a byte range modulo 256.
pub fn calculate_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Short frame used for link-layer commands (SND_NKE, REQ_UD2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortFrame([u8; MBUS_FRAME_SHORT_LEN]);

impl ShortFrame {
    pub fn new(control: u8, address: u8) -> Self {
        let mut frame = ShortFrame([
            MBUS_FRAME_SHORT_START,
            control,
            address,
            0x00,
            MBUS_FRAME_STOP,
        ]);
        frame.set_checksum();
        frame
    }

    pub fn control(&self) -> Control {
        Control::from_byte(self.0[1])
    }

    pub fn address(&self) -> u8 {
        self.0[2]
    }

    pub fn checksum(&self) -> u8 {
        self.0[3]
    }

    /// Writes C + A into the checksum slot.
    pub fn set_checksum(&mut self) {
        self.0[3] = calculate_checksum(&self.0[1..3]);
    }

    /// Sets the frame count bit. The checksum must be recomputed afterwards.
    pub fn set_fcb(&mut self) {
        self.0[1] |= Control::FCB.bits();
    }

    pub fn bytes(&self) -> [u8; MBUS_FRAME_SHORT_LEN] {
        self.0
    }
}

impl AsRef<[u8]> for ShortFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Long frame, used both for outgoing commands carrying user data and for
/// the variable data responses read back from meters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongFrame(Vec<u8>);

impl LongFrame {
    /// Builds a fully framed long frame around `user_data`.
    pub fn new(control: u8, address: u8, ci: u8, user_data: &[u8]) -> Self {
        let mut data = Vec::with_capacity(user_data.len() + 9);
        data.extend_from_slice(&[
            MBUS_FRAME_LONG_START,
            0x00,
            0x00,
            MBUS_FRAME_LONG_START,
            control,
            address,
            ci,
        ]);
        data.extend_from_slice(user_data);
        data.push(0x00);
        data.push(MBUS_FRAME_STOP);

        let mut frame = LongFrame(data);
        frame.set_length();
        frame.set_checksum();
        frame
    }

    /// Wraps bytes read from the line. Nothing is checked until [`verify`](Self::verify).
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        LongFrame(bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    fn byte(&self, idx: usize) -> u8 {
        self.0.get(idx).copied().unwrap_or(0)
    }

    /// Declared length (first length byte).
    pub fn length(&self) -> u8 {
        self.byte(1)
    }

    pub fn control(&self) -> Control {
        Control::from_byte(self.byte(4))
    }

    pub fn address(&self) -> u8 {
        self.byte(5)
    }

    pub fn ci(&self) -> u8 {
        self.byte(6)
    }

    pub fn checksum(&self) -> u8 {
        self.byte(self.0.len().saturating_sub(2))
    }

    /// C field through the last user-data byte.
    fn body(&self) -> &[u8] {
        let end = self.0.len().saturating_sub(2);
        self.0.get(MBUS_FRAME_LONG_HEADER_LEN..end).unwrap_or(&[])
    }

    /// User data following the CI field.
    pub fn user_data(&self) -> &[u8] {
        let end = self.0.len().saturating_sub(2);
        self.0.get(MBUS_FRAME_LONG_HEADER_LEN + 3..end).unwrap_or(&[])
    }

    /// Writes the C..user-data byte count into both length slots.
    pub fn set_length(&mut self) {
        if self.0.len() < MBUS_FRAME_LONG_OVERHEAD {
            return;
        }
        let len = (self.0.len() - MBUS_FRAME_LONG_OVERHEAD) as u8;
        self.0[1] = len;
        self.0[2] = len;
    }

    /// Writes the modulo-256 sum of C..user-data into the checksum slot.
    pub fn set_checksum(&mut self) {
        if self.0.len() < MBUS_FRAME_LONG_OVERHEAD {
            return;
        }
        let cs = calculate_checksum(self.body());
        let idx = self.0.len() - 2;
        self.0[idx] = cs;
    }

    /// Sets the frame count bit. The checksum must be recomputed afterwards.
    pub fn set_fcb(&mut self) {
        if let Some(c) = self.0.get_mut(MBUS_FRAME_LONG_HEADER_LEN) {
            *c |= Control::FCB.bits();
        }
    }

    /// Verifies the integrity of a received long frame.
    pub fn verify(&self) -> Result<(), MBusError> {
        let bytes = &self.0;
        if bytes.len() < MBUS_FRAME_LONG_OVERHEAD + 3 {
            return Err(MBusError::FrameParseError(format!(
                "long frame too short: {} bytes",
                bytes.len()
            )));
        }
        if bytes[0] != MBUS_FRAME_LONG_START || bytes[3] != MBUS_FRAME_LONG_START {
            return Err(MBusError::FrameParseError("invalid long frame start".into()));
        }
        if bytes[1] != bytes[2] {
            return Err(MBusError::FrameParseError(format!(
                "length mismatch: 0x{:02X} != 0x{:02X}",
                bytes[1], bytes[2]
            )));
        }
        if bytes[1] as usize + MBUS_FRAME_LONG_OVERHEAD != bytes.len() {
            return Err(MBusError::FrameParseError(format!(
                "declared length {} does not match frame size {}",
                bytes[1],
                bytes.len()
            )));
        }
        if bytes[bytes.len() - 1] != MBUS_FRAME_STOP {
            return Err(MBusError::FrameParseError("missing stop byte".into()));
        }

        let calculated = calculate_checksum(self.body());
        if calculated != self.checksum() {
            return Err(MBusError::InvalidChecksum {
                expected: self.checksum(),
                calculated,
            });
        }
        Ok(())
    }
}

impl AsRef<[u8]> for LongFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_frame_layout() {
        let frame = ShortFrame::new(0x40, 0x05);
        assert_eq!(frame.as_ref(), &[0x10, 0x40, 0x05, 0x45, 0x16]);
    }

    #[test]
    fn test_short_frame_fcb_requires_new_checksum() {
        let mut frame = ShortFrame::new(0x5B, 0x01);
        frame.set_fcb();
        assert!(frame.control().fcb());
        assert_eq!(frame.checksum(), 0x5C);
        frame.set_checksum();
        assert_eq!(frame.as_ref(), &[0x10, 0x7B, 0x01, 0x7C, 0x16]);
    }

    #[test]
    fn test_long_frame_accessors() {
        let frame = LongFrame::new(0x73, 0x01, 0x51, &[0x01, 0x7A, 0x02]);
        assert_eq!(frame.length(), 6);
        assert_eq!(frame.control().byte(), 0x73);
        assert_eq!(frame.address(), 0x01);
        assert_eq!(frame.ci(), 0x51);
        assert_eq!(frame.user_data(), &[0x01, 0x7A, 0x02]);
    }

    #[test]
    fn test_verify_rejects_bad_checksum() {
        let mut bytes = LongFrame::new(0x08, 0x01, 0x72, &[0x00; 12]).into_bytes();
        let idx = bytes.len() - 2;
        bytes[idx] = bytes[idx].wrapping_add(1);
        let err = LongFrame::from_bytes(bytes).verify().unwrap_err();
        assert!(matches!(err, MBusError::InvalidChecksum { .. }));
    }

    #[test]
    fn test_verify_rejects_length_mismatch() {
        let mut bytes = LongFrame::new(0x08, 0x01, 0x72, &[0x00; 4]).into_bytes();
        bytes[2] = 0x08;
        assert!(matches!(
            LongFrame::from_bytes(bytes).verify(),
            Err(MBusError::FrameParseError(_))
        ));
    }

    #[test]
    fn test_verify_rejects_missing_stop() {
        let mut bytes = LongFrame::new(0x08, 0x01, 0x72, &[]).into_bytes();
        let last = bytes.len() - 1;
        bytes[last] = 0x17;
        assert!(LongFrame::from_bytes(bytes).verify().is_err());
    }

    #[test]
    fn test_verify_rejects_truncated() {
        assert!(LongFrame::from_bytes(vec![0x68, 0x03]).verify().is_err());
        assert_eq!(LongFrame::from_bytes(vec![0x68]).user_data(), &[] as &[u8]);
    }

    proptest! {
        #[test]
        fn prop_checksum_is_idempotent_sum(
            control in any::<u8>(),
            address in any::<u8>(),
            ci in any::<u8>(),
            data in proptest::collection::vec(any::<u8>(), 0..200),
        ) {
            let mut frame = LongFrame::new(control, address, ci, &data);
            let first = frame.checksum();
            frame.set_checksum();
            prop_assert_eq!(first, frame.checksum());

            let expected = data
                .iter()
                .fold(control as u32 + address as u32 + ci as u32, |acc, b| acc + *b as u32)
                % 256;
            prop_assert_eq!(first as u32, expected);
        }

        #[test]
        fn prop_length_bytes_match_body(data in proptest::collection::vec(any::<u8>(), 0..=249)) {
            let frame = LongFrame::new(0x73, 0x01, 0x51, &data);
            let bytes = frame.as_ref();
            prop_assert_eq!(bytes[1], bytes[2]);
            prop_assert_eq!(bytes[1] as usize, data.len() + 3);
            prop_assert!(frame.verify().is_ok());
        }

        #[test]
        fn prop_short_checksum(control in any::<u8>(), address in any::<u8>()) {
            let frame = ShortFrame::new(control, address);
            prop_assert_eq!(frame.checksum(), control.wrapping_add(address));
        }
    }
}
