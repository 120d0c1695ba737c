//! M-Bus Protocol Constants
//!
//! This module defines constants used in the M-Bus protocol implementation,
//! based on the EN 13757-2/-3 standards.

// ----------------------------------------------------------------------------
// Frame layout
// ----------------------------------------------------------------------------

/// Single character acknowledgement
pub const MBUS_FRAME_ACK: u8 = 0xE5;

/// Start byte of a short frame
pub const MBUS_FRAME_SHORT_START: u8 = 0x10;

/// Start byte of a long/control frame (appears twice)
pub const MBUS_FRAME_LONG_START: u8 = 0x68;

/// Stop byte shared by short and long frames
pub const MBUS_FRAME_STOP: u8 = 0x16;

/// Size of a short frame on the wire
pub const MBUS_FRAME_SHORT_LEN: usize = 5;

/// Bytes a long frame adds around its C..user-data section:
/// two start bytes, two length bytes, checksum and stop byte.
pub const MBUS_FRAME_LONG_OVERHEAD: usize = 6;

/// Offset of the C field within a long frame
pub const MBUS_FRAME_LONG_HEADER_LEN: usize = 4;

/// Bytes the long-frame scanner may discard before giving up
pub const MBUS_FRAME_SCAN_LIMIT: usize = 256;

// ----------------------------------------------------------------------------
// Addresses
// ----------------------------------------------------------------------------

/// Network layer (secondary addressing) address
pub const MBUS_ADDRESS_NETWORK_LAYER: u8 = 0xFD;

// ----------------------------------------------------------------------------
// Control field (full control bytes for common commands)
// ----------------------------------------------------------------------------

pub const MBUS_CONTROL_MASK_SND_NKE: u8 = 0x40;
pub const MBUS_CONTROL_MASK_SND_UD_FCB: u8 = 0x73;
pub const MBUS_CONTROL_MASK_REQ_UD2: u8 = 0x5B;
pub const MBUS_CONTROL_MASK_RSP_UD: u8 = 0x08;

// Control flag bits
pub const MBUS_CONTROL_MASK_FCB: u8 = 0x20;
pub const MBUS_CONTROL_MASK_FCV: u8 = 0x10;
pub const MBUS_CONTROL_MASK_DIR_M2S: u8 = 0x40;

// ----------------------------------------------------------------------------
// Control information (CI) codes
// ----------------------------------------------------------------------------

pub const MBUS_CONTROL_INFO_APPLICATION_RESET: u8 = 0x50;
pub const MBUS_CONTROL_INFO_DATA_SEND: u8 = 0x51;
pub const MBUS_CONTROL_INFO_SELECT_SLAVE: u8 = 0x52;
pub const MBUS_CONTROL_INFO_RESP_VARIABLE: u8 = 0x72;
pub const MBUS_CONTROL_INFO_RESP_VARIABLE_NO_HEADER: u8 = 0x78;
pub const MBUS_CONTROL_INFO_RESP_VARIABLE_SHORT_HEADER: u8 = 0x7A;

// ----------------------------------------------------------------------------
// Data records
// ----------------------------------------------------------------------------

/// Longest BCD field that always fits an `i64` (18 digits)
pub const MBUS_DATA_BCD_MAX_BYTES: usize = 9;

/// DIF (Data Information Field) mask for data length
pub const MBUS_DATA_RECORD_DIF_MASK_DATA: u8 = 0x0F;

/// DIF mask for function
pub const MBUS_DATA_RECORD_DIF_MASK_FUNCTION: u8 = 0x30;

/// DIF mask for storage number
pub const MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO: u8 = 0x40;

/// DIFE (Data Information Field Extension) mask for storage number
pub const MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO: u8 = 0x0F;

/// DIFE mask for tariff
pub const MBUS_DATA_RECORD_DIFE_MASK_TARIFF: u8 = 0x30;

/// DIFE mask for device
pub const MBUS_DATA_RECORD_DIFE_MASK_DEVICE: u8 = 0x40;

/// DIF idle filler
pub const MBUS_DIB_DIF_IDLE_FILLER: u8 = 0x2F;

/// DIF manufacturer specific
pub const MBUS_DIB_DIF_MANUFACTURER_SPECIFIC: u8 = 0x0F;

/// DIF more records follow
pub const MBUS_DIB_DIF_MORE_RECORDS_FOLLOW: u8 = 0x1F;

/// DIF extension bit
pub const MBUS_DIB_DIF_EXTENSION_BIT: u8 = 0x80;

/// VIF without extension
pub const MBUS_DIB_VIF_WITHOUT_EXTENSION: u8 = 0x7F;

/// VIF extension bit
pub const MBUS_DIB_VIF_EXTENSION_BIT: u8 = 0x80;

/// Plain-text VIF (ASCII unit follows)
pub const MBUS_DIB_VIF_PLAIN_TEXT: u8 = 0x7C;

/// Extension table selectors
pub const MBUS_DIB_VIF_EXTENSION_FD: u8 = 0xFD;
pub const MBUS_DIB_VIF_EXTENSION_FB: u8 = 0xFB;

/// Longest DIFE/VIFE chain accepted
pub const MBUS_DATA_INFO_BLOCK_MAX_EXTENSIONS: usize = 10;

// ----------------------------------------------------------------------------
// Manufacturer-specific payload prefixes
// ----------------------------------------------------------------------------

/// Address prefix used by the memory-page change request
pub const MBUS_PAGE_CHANGE_PREFIX: [u8; 3] = [0x0F, 0x02, 0x78];

/// DIF/VIF pair addressing the bus address of a device (8-bit int, VIF 0x7A)
pub const MBUS_DIF_BUS_ADDRESS: u8 = 0x01;
pub const MBUS_VIF_BUS_ADDRESS: u8 = 0x7A;
