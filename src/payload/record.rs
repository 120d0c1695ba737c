//! Variable data records.
//!
//! A record is a Data Information Block (DIF + DIFEs), a Value Information
//! Block (VIF + VIFEs) and the data bytes whose size and coding the DIF
//! announces. Records keep their raw tag bytes and raw data next to the
//! interpreted [`MBusRecordValue`], so consumers can re-interpret codings
//! this crate does not know about.

use crate::constants::*;
use crate::error::MBusError;
use crate::payload::data_encoding::{
    decode_bcd, decode_date_g, decode_datetime, decode_int, decode_real, decode_str,
};
use crate::payload::vif::{lookup_primary_vif, lookup_vife_fb, lookup_vife_fd, VifInfo};
use chrono::{NaiveDate, NaiveDateTime};
use nom::bytes::complete::take;
use nom::combinator::rest;
use nom::error::{ErrorKind, ParseError};
use nom::number::complete::be_u8;
use nom::IResult;
use serde::Serialize;

/// Lets nom parsers report `MBusError` directly.
impl<'a> ParseError<&'a [u8]> for MBusError {
    fn from_error_kind(_input: &'a [u8], kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Eof => MBusError::PrematureEndAtData,
            other => MBusError::FrameParseError(format!("{other:?}")),
        }
    }

    fn append(_input: &'a [u8], _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Unwraps a nom error into the underlying `MBusError`.
pub(crate) fn flatten(err: nom::Err<MBusError>) -> MBusError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
        nom::Err::Incomplete(_) => MBusError::PrematureEndAtData,
    }
}

/// nom result carrying `MBusError`.
pub type PResult<'a, T> = IResult<&'a [u8], T, MBusError>;

pub(crate) fn byte(input: &[u8]) -> PResult<'_, u8> {
    be_u8(input)
}

pub(crate) fn bytes(input: &[u8], count: usize) -> PResult<'_, &[u8]> {
    take(count)(input)
}

/// Represents the M-Bus data information block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MBusDataInformationBlock {
    pub dif: u8,
    pub dife: Vec<u8>,
}

/// Represents the M-Bus value information block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MBusValueInformationBlock {
    pub vif: u8,
    pub vife: Vec<u8>,
    /// Unit text carried by a plain-text VIF (0x7C/0xFC)
    pub custom_vif: String,
}

/// Represents the M-Bus data record header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MBusDataRecordHeader {
    pub dib: MBusDataInformationBlock,
    pub vib: MBusValueInformationBlock,
}

/// Function field of the DIF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordFunction {
    Instantaneous,
    Maximum,
    Minimum,
    DuringError,
    ManufacturerSpecific,
    MoreRecordsFollow,
}

/// Interpreted value of a data record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MBusRecordValue {
    /// No data (DIF data field 0x0 or 0x8)
    None,
    Integer(i64),
    Real(f32),
    Bcd(i64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    String(String),
    Bytes(Vec<u8>),
}

impl MBusRecordValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MBusRecordValue::Integer(v) | MBusRecordValue::Bcd(v) => Some(*v as f64),
            MBusRecordValue::Real(v) => Some(*v as f64),
            _ => None,
        }
    }
}

/// Represents an M-Bus data record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MBusRecord {
    pub drh: MBusDataRecordHeader,
    pub function: RecordFunction,
    pub storage_number: u64,
    pub tariff: u32,
    pub device: u32,
    /// Raw data bytes, excluding the LVAR byte
    pub data: Vec<u8>,
    pub value: MBusRecordValue,
    /// Unit and scaling looked up from the VIF, when it maps to a table entry
    pub vif_info: Option<VifInfo>,
}

impl MBusRecord {
    pub fn unit(&self) -> &str {
        if !self.drh.vib.custom_vif.is_empty() {
            return &self.drh.vib.custom_vif;
        }
        self.vif_info.map_or("", |i| i.unit)
    }

    pub fn quantity(&self) -> &str {
        self.vif_info.map_or("", |i| i.quantity)
    }

    /// Numeric value multiplied by the VIF decimal exponent.
    pub fn normalized_value(&self) -> Option<f64> {
        let exponent = self.vif_info.map_or(1.0, |i| i.exponent);
        self.value.as_f64().map(|v| v * exponent)
    }

    fn manufacturer_block(dib: MBusDataInformationBlock, data: &[u8]) -> Self {
        let function = if dib.dif == MBUS_DIB_DIF_MORE_RECORDS_FOLLOW {
            RecordFunction::MoreRecordsFollow
        } else {
            RecordFunction::ManufacturerSpecific
        };
        MBusRecord {
            drh: MBusDataRecordHeader {
                dib,
                vib: MBusValueInformationBlock {
                    vif: 0,
                    vife: Vec::new(),
                    custom_vif: String::new(),
                },
            },
            function,
            storage_number: 0,
            tariff: 0,
            device: 0,
            data: data.to_vec(),
            value: MBusRecordValue::Bytes(data.to_vec()),
            vif_info: None,
        }
    }
}

fn is_manufacturer_dif(dif: u8) -> bool {
    dif == MBUS_DIB_DIF_MANUFACTURER_SPECIFIC || dif == MBUS_DIB_DIF_MORE_RECORDS_FOLLOW
}

fn parse_dib(input: &[u8]) -> PResult<'_, MBusDataInformationBlock> {
    let (mut input, dif) = byte(input)?;

    if (dif & MBUS_DATA_RECORD_DIF_MASK_DATA) == 0x0F && !is_manufacturer_dif(dif) {
        return Err(nom::Err::Failure(MBusError::UnknownDif(dif)));
    }

    let mut dife = Vec::new();
    let mut last = dif;
    while last & MBUS_DIB_DIF_EXTENSION_BIT != 0 && !is_manufacturer_dif(dif) {
        if dife.len() == MBUS_DATA_INFO_BLOCK_MAX_EXTENSIONS {
            return Err(nom::Err::Failure(MBusError::DifTooLong));
        }
        let (i, b) = byte(input)?;
        dife.push(b);
        last = b;
        input = i;
    }

    Ok((input, MBusDataInformationBlock { dif, dife }))
}

fn parse_vib(input: &[u8]) -> PResult<'_, (MBusValueInformationBlock, Option<VifInfo>)> {
    let (mut input, vif) = byte(input)?;
    let mut vife = Vec::new();
    let mut custom_vif = String::new();
    let mut last = vif;

    let info = match vif {
        MBUS_DIB_VIF_EXTENSION_FD | MBUS_DIB_VIF_EXTENSION_FB => {
            let (i, code) = byte(input)?;
            input = i;
            vife.push(code);
            last = code;
            let found = if vif == MBUS_DIB_VIF_EXTENSION_FD {
                lookup_vife_fd(code)
            } else {
                lookup_vife_fb(code)
            };
            Some(found.ok_or(nom::Err::Failure(MBusError::UnknownVife(code)))?)
        }
        _ if vif & MBUS_DIB_VIF_WITHOUT_EXTENSION == MBUS_DIB_VIF_PLAIN_TEXT => {
            let (i, len) = byte(input)?;
            let (i, text) = bytes(i, len as usize)?;
            input = i;
            custom_vif = decode_str(text);
            None
        }
        _ => Some(lookup_primary_vif(vif).ok_or(nom::Err::Failure(MBusError::UnknownVif(vif)))?),
    };

    while last & MBUS_DIB_VIF_EXTENSION_BIT != 0 {
        if vife.len() == MBUS_DATA_INFO_BLOCK_MAX_EXTENSIONS {
            return Err(nom::Err::Failure(MBusError::VifTooLong));
        }
        let (i, b) = byte(input)?;
        vife.push(b);
        last = b;
        input = i;
    }

    Ok((
        input,
        (
            MBusValueInformationBlock {
                vif,
                vife,
                custom_vif,
            },
            info,
        ),
    ))
}

/// Looks up the data length from a DIF field in the data record.
/// Variable length data (0xD) reports 0; its size comes from the LVAR byte.
pub fn mbus_dif_datalength_lookup(dif: u8) -> usize {
    match dif & MBUS_DATA_RECORD_DIF_MASK_DATA {
        0x1 | 0x9 => 1,
        0x2 | 0xA => 2,
        0x3 | 0xB => 3,
        0x4 | 0x5 | 0xC => 4,
        0x6 | 0xE => 6,
        0x7 => 8,
        _ => 0,
    }
}

/// Maps an LVAR byte to the number of data bytes that follow it.
fn lvar_length(lvar: u8) -> Result<usize, MBusError> {
    match lvar {
        0x00..=0xBF => Ok(lvar as usize),
        0xC0..=0xCF => Ok((lvar - 0xC0) as usize),
        0xD0..=0xDF => Ok((lvar - 0xD0) as usize),
        0xE0..=0xEF => Ok((lvar - 0xE0) as usize),
        0xF0..=0xF4 => Ok(4 * (lvar - 0xEC) as usize),
        0xF5 => Ok(6),
        0xF6 => Ok(8),
        _ => Err(MBusError::InvalidLvar(lvar)),
    }
}

fn parse_data(input: &[u8], dif: u8) -> PResult<'_, (Option<u8>, &[u8])> {
    if dif & MBUS_DATA_RECORD_DIF_MASK_DATA == 0x0D {
        let (input, lvar) = byte(input)?;
        let len = lvar_length(lvar).map_err(nom::Err::Failure)?;
        let (input, data) = bytes(input, len)?;
        return Ok((input, (Some(lvar), data)));
    }
    let (input, data) = bytes(input, mbus_dif_datalength_lookup(dif))?;
    Ok((input, (None, data)))
}

fn decode_value(dif: u8, vif: u8, lvar: Option<u8>, data: &[u8]) -> Result<MBusRecordValue, MBusError> {
    let value = match dif & MBUS_DATA_RECORD_DIF_MASK_DATA {
        0x0 | 0x8 => MBusRecordValue::None,
        0x5 => MBusRecordValue::Real(decode_real(data)?),
        0x9..=0xC | 0xE => match decode_bcd(data) {
            Ok(v) => MBusRecordValue::Bcd(v),
            // hex digits carry error codes in values recorded during an error state
            Err(_) if function_of(dif) == RecordFunction::DuringError => {
                MBusRecordValue::Bytes(data.to_vec())
            }
            Err(e) => return Err(e),
        },
        0xD => match lvar.unwrap_or(0) {
            0x00..=0xBF => MBusRecordValue::String(decode_str(data)),
            0xC0..=0xCF if data.len() <= MBUS_DATA_BCD_MAX_BYTES => {
                MBusRecordValue::Bcd(decode_bcd(data)?)
            }
            0xD0..=0xDF if data.len() <= MBUS_DATA_BCD_MAX_BYTES => {
                MBusRecordValue::Bcd(-decode_bcd(data)?)
            }
            0xE0..=0xEF if !data.is_empty() && data.len() <= 8 => {
                MBusRecordValue::Integer(decode_int(data)?)
            }
            _ => MBusRecordValue::Bytes(data.to_vec()),
        },
        _ => {
            let int = decode_int(data)?;
            match vif & MBUS_DIB_VIF_WITHOUT_EXTENSION {
                0x6C => decode_date_g(data).map(MBusRecordValue::Date),
                0x6D => decode_datetime(data).map(MBusRecordValue::DateTime),
                _ => None,
            }
            .unwrap_or(MBusRecordValue::Integer(int))
        }
    };
    Ok(value)
}

fn function_of(dif: u8) -> RecordFunction {
    match dif & MBUS_DATA_RECORD_DIF_MASK_FUNCTION {
        0x00 => RecordFunction::Instantaneous,
        0x10 => RecordFunction::Maximum,
        0x20 => RecordFunction::Minimum,
        _ => RecordFunction::DuringError,
    }
}

fn storage_number_of(dib: &MBusDataInformationBlock) -> u64 {
    let mut storage = ((dib.dif & MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO) >> 6) as u64;
    for (i, dife) in dib.dife.iter().enumerate() {
        storage |= ((dife & MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO) as u64) << (1 + 4 * i);
    }
    storage
}

fn tariff_of(dib: &MBusDataInformationBlock) -> u32 {
    dib.dife.iter().enumerate().fold(0, |acc, (i, dife)| {
        acc | (((dife & MBUS_DATA_RECORD_DIFE_MASK_TARIFF) >> 4) as u32) << (2 * i)
    })
}

fn device_of(dib: &MBusDataInformationBlock) -> u32 {
    dib.dife.iter().enumerate().fold(0, |acc, (i, dife)| {
        acc | (((dife & MBUS_DATA_RECORD_DIFE_MASK_DEVICE) >> 6) as u32) << i
    })
}

/// Parses one variable data record. Idle fillers must be skipped by the caller.
///
/// DIF 0x0F and 0x1F consume the rest of the input as manufacturer-specific
/// data.
pub fn parse_variable_record(input: &[u8]) -> PResult<'_, MBusRecord> {
    let (input, dib) = parse_dib(input)?;

    if is_manufacturer_dif(dib.dif) {
        let (input, data) = rest::<_, MBusError>(input)?;
        return Ok((input, MBusRecord::manufacturer_block(dib, data)));
    }

    let (input, (vib, vif_info)) = parse_vib(input)?;
    let (input, (lvar, data)) = parse_data(input, dib.dif)?;
    let value = decode_value(dib.dif, vib.vif, lvar, data).map_err(nom::Err::Failure)?;

    let record = MBusRecord {
        function: function_of(dib.dif),
        storage_number: storage_number_of(&dib),
        tariff: tariff_of(&dib),
        device: device_of(&dib),
        data: data.to_vec(),
        value,
        vif_info,
        drh: MBusDataRecordHeader { dib, vib },
    };
    Ok((input, record))
}
