//! Command frames sent by the master.
//!
//! Every constructor returns a frame with its length and checksum already
//! set. Arguments are taken verbatim: reserved or broadcast addresses are the
//! caller's business.

use crate::constants::*;
use crate::mbus::frame::{LongFrame, ShortFrame};
use crate::payload::data_encoding::encode_bcd;

/// Link reset (SND_NKE). The slave answers with a single 0xE5.
pub fn snd_nke(primary: u8) -> ShortFrame {
    ShortFrame::new(MBUS_CONTROL_MASK_SND_NKE, primary)
}

/// Request for class 2 data (REQ_UD2) with FCV set and FCB clear.
///
/// Callers reading several telegrams in a row set the FCB on every other
/// request (see [`ShortFrame::set_fcb`]).
pub fn request_ud2(primary: u8) -> ShortFrame {
    ShortFrame::new(MBUS_CONTROL_MASK_REQ_UD2, primary)
}

/// Application reset (SND_UD, CI 0x50) without a subcode.
pub fn application_reset(primary: u8) -> LongFrame {
    LongFrame::new(
        MBUS_CONTROL_MASK_SND_UD_FCB,
        primary,
        MBUS_CONTROL_INFO_APPLICATION_RESET,
        &[],
    )
}

/// Switches the memory page a meter reports on the next read-out.
pub fn request_page_change(primary: u8, memory_page: u8) -> LongFrame {
    let mut data = Vec::with_capacity(5);
    data.extend_from_slice(&MBUS_PAGE_CHANGE_PREFIX);
    data.push(memory_page);
    data.push(0x00); // medium
    LongFrame::new(
        MBUS_CONTROL_MASK_SND_UD_FCB,
        primary,
        MBUS_CONTROL_INFO_DATA_SEND,
        &data,
    )
}

/// Assigns `primary` to the device with identification number `secondary`.
pub fn set_primary_using_secondary(secondary: u64, primary: u8) -> LongFrame {
    let mut data = encode_bcd(secondary, 4);
    // manufacturer, version, medium wildcards
    data.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
    data.extend_from_slice(&[MBUS_DIF_BUS_ADDRESS, MBUS_VIF_BUS_ADDRESS, primary]);
    LongFrame::new(
        MBUS_CONTROL_MASK_SND_UD_FCB,
        MBUS_ADDRESS_NETWORK_LAYER,
        MBUS_CONTROL_INFO_DATA_SEND,
        &data,
    )
}

/// Moves a device from `old_primary` to `new_primary`.
pub fn set_primary_using_primary(old_primary: u8, new_primary: u8) -> LongFrame {
    LongFrame::new(
        MBUS_CONTROL_MASK_SND_UD_FCB,
        old_primary,
        MBUS_CONTROL_INFO_DATA_SEND,
        &[MBUS_DIF_BUS_ADDRESS, MBUS_VIF_BUS_ADDRESS, new_primary],
    )
}

/// Selects the device with identification number `secondary` so it answers
/// on the network layer address (0xFD). Manufacturer, version and medium are
/// wildcarded.
pub fn select_secondary(secondary: u64) -> LongFrame {
    let mut data = encode_bcd(secondary, 4);
    data.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
    LongFrame::new(
        MBUS_CONTROL_MASK_SND_UD_FCB,
        MBUS_ADDRESS_NETWORK_LAYER,
        MBUS_CONTROL_INFO_SELECT_SLAVE,
        &data,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snd_nke() {
        assert_eq!(snd_nke(0x05).as_ref(), &[0x10, 0x40, 0x05, 0x45, 0x16]);
    }

    #[test]
    fn test_request_ud2() {
        let frame = request_ud2(0x01);
        assert_eq!(frame.as_ref(), &[0x10, 0x5B, 0x01, 0x5C, 0x16]);
        assert!(frame.control().fcv());
        assert!(!frame.control().fcb());
    }

    #[test]
    fn test_application_reset() {
        assert_eq!(
            application_reset(0x05).as_ref(),
            &[0x68, 0x03, 0x03, 0x68, 0x73, 0x05, 0x50, 0xC8, 0x16]
        );
    }

    #[test]
    fn test_request_page_change() {
        let frame = request_page_change(0x01, 0x02);
        assert_eq!(
            frame.as_ref(),
            &[0x68, 0x08, 0x08, 0x68, 0x73, 0x01, 0x51, 0x0F, 0x02, 0x78, 0x02, 0x00, 0x50, 0x16]
        );
    }

    #[test]
    fn test_set_primary_using_secondary() {
        let frame = set_primary_using_secondary(12345678, 0x0A);
        assert_eq!(
            frame.as_ref(),
            &[
                0x68, 0x0E, 0x0E, 0x68, 0x73, 0xFD, 0x51, 0x78, 0x56, 0x34, 0x12, 0xFF, 0xFF,
                0xFF, 0xFF, 0x01, 0x7A, 0x0A, 0x56, 0x16
            ]
        );
        assert!(frame.verify().is_ok());
    }

    #[test]
    fn test_set_primary_using_primary() {
        assert_eq!(
            set_primary_using_primary(0x01, 0x02).as_ref(),
            &[0x68, 0x06, 0x06, 0x68, 0x73, 0x01, 0x51, 0x01, 0x7A, 0x02, 0x42, 0x16]
        );
    }

    #[test]
    fn test_select_secondary() {
        let frame = select_secondary(19004636);
        assert_eq!(frame.ci(), 0x52);
        assert_eq!(frame.address(), 0xFD);
        assert_eq!(frame.user_data()[..4], [0x36, 0x46, 0x00, 0x19]);
        assert!(frame.verify().is_ok());
    }

    #[test]
    fn test_constructors_accept_any_address() {
        assert_eq!(snd_nke(0xFF).address(), 0xFF);
        assert_eq!(application_reset(0xFE).address(), 0xFE);
    }
}
