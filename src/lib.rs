//! # mbus-master - Wired M-Bus master protocol engine
//!
//! The mbus-master crate implements the master side of the wired Meter-Bus
//! (M-Bus, EN 13757-2/-3) protocol used to read utility meters such as heat,
//! water, gas and electricity meters.
//!
//! ## Features
//!
//! - Build command frames (link reset, data request, application reset,
//!   page change, primary/secondary address management)
//! - Recover acknowledgements and long frames from a noisy byte stream
//! - Decode variable data responses into typed records with units
//! - Run complete read-outs, including multi-telegram responses
//! - Talk to any transport implementing [`Conn`]: serial ports, TCP
//!   gateways or the scripted [`MockConn`](mbus::mock::MockConn)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mbus_master::{open_serial, read_all_frames, SerialConfig};
//!
//! # async fn run() -> Result<(), mbus_master::MBusError> {
//! let config = SerialConfig::default();
//! let mut conn = open_serial("/dev/ttyUSB0", &config)?;
//! for frame in read_all_frames(&mut conn, 0x05, config.timeout).await? {
//!     for record in &frame.records {
//!         println!("{}: {:?} {}", record.quantity(), record.value, record.unit());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod error;
pub mod logging;
pub mod mbus;
pub mod payload;
pub mod util;

pub use crate::error::MBusError;
pub use crate::logging::init_logger;

pub use mbus::{
    application_reset, connect_tcp, open_serial, ping, read_all_frames, read_single_frame,
    select_secondary, send_page_change, set_primary_using_primary, set_primary_using_secondary,
    Conn, IoConn, LongFrame, SerialConfig, ShortFrame,
};
pub use payload::{DecodedFrame, MBusDataVariableHeader, MBusRecord, MBusRecordValue};
