//! Control field (C) of an M-Bus frame.
//!
//! The low nibble carries the function code, the upper bits carry the
//! direction (PRM), the frame count bit (FCB) and the FCB-valid flag (FCV).

use crate::constants::{
    MBUS_CONTROL_MASK_DIR_M2S, MBUS_CONTROL_MASK_FCB, MBUS_CONTROL_MASK_FCV,
};
use bitflags::bitflags;

bitflags! {
    /// C field flags. Unknown bits (the function code) are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Control: u8 {
        /// Frame count valid
        const FCV = MBUS_CONTROL_MASK_FCV;
        /// Frame count bit
        const FCB = MBUS_CONTROL_MASK_FCB;
        /// Master to slave direction
        const PRM = MBUS_CONTROL_MASK_DIR_M2S;

        const _ = !0;
    }
}

impl Control {
    pub fn from_byte(byte: u8) -> Self {
        Control::from_bits_retain(byte)
    }

    pub fn byte(self) -> u8 {
        self.bits()
    }

    /// Function code (low nibble).
    pub fn function(self) -> u8 {
        self.bits() & 0x0F
    }

    pub fn fcb(self) -> bool {
        self.contains(Control::FCB)
    }

    pub fn fcv(self) -> bool {
        self.contains(Control::FCV)
    }

    /// True if the frame travels from master to slave.
    pub fn is_request(self) -> bool {
        self.contains(Control::PRM)
    }
}

impl From<u8> for Control {
    fn from(byte: u8) -> Self {
        Control::from_byte(byte)
    }
}
