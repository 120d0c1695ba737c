//! Logging setup and helpers.
//!
//! The crate logs through the `log` facade. Binaries embedding it pick the
//! backend; [`init_logger`] installs `env_logger`, configured via `RUST_LOG`
//! (for example `RUST_LOG=mbus_master=debug` shows every frame on the wire).

use crate::util::hex::format_hex_compact;
use log::{debug, log_enabled, Level};

/// Frames longer than this are cut in hex log lines.
const MAX_LOG_BYTES: usize = 64;

/// Initializes the logger with the `env_logger` crate.
pub fn init_logger() {
    env_logger::init();
}

/// Like [`init_logger`], but tolerates a logger that is already installed.
/// Useful from tests, where several cases race to initialize.
pub fn try_init_logger() -> Result<(), log::SetLoggerError> {
    env_logger::builder().is_test(true).try_init()
}

/// Logs frame bytes in hex at debug level.
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    if !log_enabled!(Level::Debug) {
        return;
    }
    debug!("{prefix}: {}", frame_hex_line(data));
}

fn frame_hex_line(data: &[u8]) -> String {
    if data.len() > MAX_LOG_BYTES {
        format!(
            "{} ... ({} bytes total)",
            format_hex_compact(&data[..MAX_LOG_BYTES]),
            data.len()
        )
    } else {
        format_hex_compact(data)
    }
}
