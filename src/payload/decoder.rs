//! Long frame payload decoding.
//!
//! A RSP_UD long frame carries a CI-dependent fixed header followed by a
//! sequence of variable data records. [`decode_long_frame`] validates the
//! framing, parses both, and reports whether the meter announced further
//! records through DIF 0x1F.

use crate::constants::*;
use crate::error::MBusError;
use crate::mbus::frame::LongFrame;
use crate::payload::data_encoding::{decode_bcd, manufacturer_id_to_string};
use crate::payload::record::{byte, bytes, flatten, parse_variable_record, MBusRecord, PResult};
use log::trace;
use nom::number::complete::le_u16;
use serde::Serialize;

/// Fixed data header of a variable data response.
///
/// The identification fields are only present after CI 0x72. A short header
/// (CI 0x7A) carries access number, status and signature alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MBusDataVariableHeader {
    pub identification: Option<u32>,
    pub manufacturer: Option<String>,
    pub version: Option<u8>,
    pub medium: Option<u8>,
    pub access_number: u8,
    pub status: u8,
    pub signature: u16,
}

/// Everything decoded from one long frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedFrame {
    pub control: u8,
    pub address: u8,
    pub ci: u8,
    pub header: Option<MBusDataVariableHeader>,
    pub records: Vec<MBusRecord>,
    pub more_records_follow: bool,
}

impl DecodedFrame {
    /// True if the meter holds records beyond this frame.
    pub fn has_more_records(&self) -> bool {
        self.more_records_follow
    }
}

fn parse_short_header(input: &[u8]) -> PResult<'_, (u8, u8, u16)> {
    let (input, access_number) = byte(input)?;
    let (input, status) = byte(input)?;
    let (input, signature) = le_u16::<_, MBusError>(input)?;
    Ok((input, (access_number, status, signature)))
}

fn parse_long_header(input: &[u8]) -> PResult<'_, MBusDataVariableHeader> {
    let (input, id_bytes) = bytes(input, 4)?;
    let identification = decode_bcd(id_bytes)
        .ok()
        .and_then(|id| u32::try_from(id).ok())
        .ok_or(nom::Err::Failure(MBusError::InvalidBcd))?;
    let (input, manufacturer) = le_u16::<_, MBusError>(input)?;
    let (input, version) = byte(input)?;
    let (input, medium) = byte(input)?;
    let (input, (access_number, status, signature)) = parse_short_header(input)?;

    Ok((
        input,
        MBusDataVariableHeader {
            identification: Some(identification),
            manufacturer: Some(manufacturer_id_to_string(manufacturer)),
            version: Some(version),
            medium: Some(medium),
            access_number,
            status,
            signature,
        },
    ))
}

/// Splits the user data into fixed header and record area according to the CI field.
fn parse_header(ci: u8, data: &[u8]) -> Result<(&[u8], Option<MBusDataVariableHeader>), MBusError> {
    match ci {
        MBUS_CONTROL_INFO_RESP_VARIABLE => {
            let (rest, header) = parse_long_header(data).map_err(flatten)?;
            Ok((rest, Some(header)))
        }
        MBUS_CONTROL_INFO_RESP_VARIABLE_SHORT_HEADER => {
            let (rest, (access_number, status, signature)) =
                parse_short_header(data).map_err(flatten)?;
            let header = MBusDataVariableHeader {
                identification: None,
                manufacturer: None,
                version: None,
                medium: None,
                access_number,
                status,
                signature,
            };
            Ok((rest, Some(header)))
        }
        MBUS_CONTROL_INFO_RESP_VARIABLE_NO_HEADER => Ok((data, None)),
        other => Err(MBusError::UnsupportedCi(other)),
    }
}

/// Parses variable data records until the input is exhausted.
///
/// Returns the records and whether a "more records follow" marker was seen.
pub fn parse_records(mut input: &[u8]) -> Result<(Vec<MBusRecord>, bool), MBusError> {
    let mut records = Vec::new();
    let mut more_records_follow = false;

    while let Some(&dif) = input.first() {
        if dif == MBUS_DIB_DIF_IDLE_FILLER {
            input = &input[1..];
            continue;
        }
        let (rest, record) = parse_variable_record(input).map_err(flatten)?;
        if record.drh.dib.dif == MBUS_DIB_DIF_MORE_RECORDS_FOLLOW {
            more_records_follow = true;
        }
        trace!("decoded record {:?}", record.value);
        records.push(record);
        input = rest;
    }

    Ok((records, more_records_follow))
}

/// Verifies and decodes a long frame.
pub fn decode_long_frame(frame: &LongFrame) -> Result<DecodedFrame, MBusError> {
    frame.verify()?;

    let (data, header) = parse_header(frame.ci(), frame.user_data())?;
    let (records, more_records_follow) = parse_records(data)?;

    Ok(DecodedFrame {
        control: frame.control().byte(),
        address: frame.address(),
        ci: frame.ci(),
        header,
        records,
        more_records_follow,
    })
}

impl LongFrame {
    /// Decodes the frame payload. See [`decode_long_frame`].
    pub fn decode(&self) -> Result<DecodedFrame, MBusError> {
        decode_long_frame(self)
    }
}
