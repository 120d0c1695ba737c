//! The payload module contains the components responsible for decoding the
//! application data carried by variable data responses.

pub mod data_encoding;
pub mod decoder;
pub mod record;
pub mod vif;

pub use decoder::{decode_long_frame, parse_records, DecodedFrame, MBusDataVariableHeader};

/// Represents a data record in the M-Bus protocol.
pub use record::MBusRecord;

/// Represents the value of an M-Bus data record.
pub use record::MBusRecordValue;

pub use record::{parse_variable_record, RecordFunction};
pub use vif::VifInfo;
