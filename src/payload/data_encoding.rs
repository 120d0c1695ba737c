//! # M-Bus Data Encoding and Decoding
//!
//! This module provides functions for encoding and decoding the value
//! representations used in M-Bus data records: BCD, little-endian integers,
//! 32-bit reals, the compound date/time types F, G and I, and the packed
//! three-letter manufacturer code.

use crate::error::MBusError;
use chrono::{NaiveDate, NaiveDateTime};

/// Encodes `value` as `size` BCD bytes, least significant byte first.
/// Digits above the capacity of `size` bytes are dropped.
pub fn encode_bcd(mut value: u64, size: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(size);
    for _ in 0..size {
        let ones = (value % 10) as u8;
        value /= 10;
        let tens = (value % 10) as u8;
        value /= 10;
        result.push((tens << 4) | ones);
    }
    result
}

/// Decodes BCD bytes stored least significant byte first.
///
/// A high nibble of 0xF in the most significant byte marks a negative value.
/// Values beyond the `i64` range fail with [`MBusError::BcdOverflow`].
pub fn decode_bcd(input: &[u8]) -> Result<i64, MBusError> {
    let mut value: i64 = 0;
    let mut negative = false;

    for (i, &byte) in input.iter().enumerate().rev() {
        let hi = byte >> 4;
        let lo = byte & 0x0F;
        if i == input.len() - 1 && hi == 0x0F {
            negative = true;
        } else if hi > 9 {
            return Err(MBusError::InvalidBcd);
        } else {
            value = push_digit(value, hi)?;
        }
        if lo > 9 {
            return Err(MBusError::InvalidBcd);
        }
        value = push_digit(value, lo)?;
    }

    Ok(if negative { -value } else { value })
}

fn push_digit(value: i64, digit: u8) -> Result<i64, MBusError> {
    value
        .checked_mul(10)
        .and_then(|v| v.checked_add(digit as i64))
        .ok_or(MBusError::BcdOverflow)
}

/// Decodes a little-endian two's complement integer of 1 to 8 bytes.
pub fn decode_int(input: &[u8]) -> Result<i64, MBusError> {
    if input.is_empty() || input.len() > 8 {
        return Err(MBusError::FrameParseError(format!(
            "invalid integer size: {}",
            input.len()
        )));
    }
    let raw = input
        .iter()
        .rev()
        .fold(0u64, |acc, b| (acc << 8) | *b as u64);
    let shift = 64 - 8 * input.len() as u32;
    Ok(((raw << shift) as i64) >> shift)
}

/// Decodes a little-endian IEEE 754 single precision value.
pub fn decode_real(input: &[u8]) -> Result<f32, MBusError> {
    let bytes: [u8; 4] = input
        .try_into()
        .map_err(|_| MBusError::FrameParseError("real needs 4 bytes".into()))?;
    Ok(f32::from_le_bytes(bytes))
}

/// Type G: compound CP16 date.
pub fn decode_date_g(input: &[u8]) -> Option<NaiveDate> {
    if input.len() != 2 {
        return None;
    }
    let day = (input[0] & 0x1F) as u32;
    let month = (input[1] & 0x0F) as u32;
    let year = (((input[0] & 0xE0) >> 5) | ((input[1] & 0xF0) >> 1)) as i32;
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

/// Type F (CP32) and type I (CP48) date and time.
pub fn decode_datetime(input: &[u8]) -> Option<NaiveDateTime> {
    match input.len() {
        4 => {
            // bit 7 of the minute byte flags an invalid time
            if input[0] & 0x80 != 0 {
                return None;
            }
            let minute = (input[0] & 0x3F) as u32;
            let hour = (input[1] & 0x1F) as u32;
            decode_date_g(&input[2..4])?.and_hms_opt(hour, minute, 0)
        }
        6 => {
            if input[1] & 0x80 != 0 {
                return None;
            }
            let second = (input[0] & 0x3F) as u32;
            let minute = (input[1] & 0x3F) as u32;
            let hour = (input[2] & 0x1F) as u32;
            decode_date_g(&input[3..5])?.and_hms_opt(hour, minute, second)
        }
        _ => None,
    }
}

/// Decodes a string stored last character first.
pub fn decode_str(input: &[u8]) -> String {
    input.iter().rev().map(|b| *b as char).collect()
}

/// Converts the packed manufacturer id into its three-letter code.
pub fn manufacturer_id_to_string(id: u16) -> String {
    let c1 = ((id >> 10) & 0x1F) as u8 + b'A' - 1;
    let c2 = ((id >> 5) & 0x1F) as u8 + b'A' - 1;
    let c3 = (id & 0x1F) as u8 + b'A' - 1;

    String::from_utf8(vec![c1, c2, c3]).unwrap_or_else(|_| format!("{id:04X}"))
}
