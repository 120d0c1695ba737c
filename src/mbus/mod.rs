//! The mbus module contains the wired M-Bus link layer: frame layout and
//! checksums, the command frames a master sends, the transport abstraction,
//! frame recovery from the byte stream and the request/response sequences
//! built on top of them.

pub mod commands;
pub mod conn;
pub mod control;
pub mod frame;
pub mod mock;
pub mod reader;
pub mod serial;
pub mod session;

pub use conn::{Conn, IoConn};
pub use control::Control;
pub use frame::{calculate_checksum, LongFrame, ShortFrame};
pub use reader::{read_ack_frame, read_long_frame, LongFrameScanner};
pub use serial::{connect_tcp, open_serial, SerialConfig, SerialConn, TcpConn};
pub use session::{
    application_reset, ping, read_all_frames, read_single_frame, select_secondary,
    send_page_change, set_primary_using_primary, set_primary_using_secondary,
};
