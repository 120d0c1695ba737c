//! Frame recovery from a byte stream.
//!
//! Meters answer either with the single character acknowledgement (0xE5) or
//! with a long frame. Neither arrives in one piece on a slow serial line, and
//! converters often emit noise when the bus direction flips, so both readers
//! work byte by byte and tolerate garbage in front of the real answer.
//!
//! The read deadline is refreshed before every low-level read: `timeout`
//! bounds the silence between bytes, not the duration of a whole frame.

use crate::constants::{
    MBUS_FRAME_ACK, MBUS_FRAME_LONG_OVERHEAD, MBUS_FRAME_LONG_START, MBUS_FRAME_SCAN_LIMIT,
    MBUS_FRAME_STOP,
};
use crate::error::MBusError;
use crate::mbus::conn::Conn;
use crate::mbus::frame::LongFrame;
use crate::logging::log_frame_hex;
use bytes::{Buf, BufMut, BytesMut};
use log::{debug, trace, warn};
use std::io;
use std::time::Duration;
use tokio::time::Instant;

/// Incremental long-frame detector.
///
/// While searching it keeps a four byte window and waits for `68 L L 68`.
/// Once a header is latched it collects `L + 6` bytes and accepts the frame
/// if the last one is the stop byte. A header that does not end in a stop
/// byte was a false match: its first byte is dropped and the buffered bytes
/// are scanned again.
///
/// Noise can form a header with equal length bytes (`68 FF FF 68`). The
/// scanner then waits for bytes that never come while a short genuine frame
/// sits in its buffer. [`LongFrameScanner::salvage`] recovers that frame once
/// the line has gone quiet.
#[derive(Debug)]
pub struct LongFrameScanner {
    buf: BytesMut,
    length: Option<usize>,
    discarded: usize,
}

impl Default for LongFrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl LongFrameScanner {
    pub fn new() -> Self {
        LongFrameScanner {
            buf: BytesMut::with_capacity(MBUS_FRAME_SCAN_LIMIT + MBUS_FRAME_LONG_OVERHEAD),
            length: None,
            discarded: 0,
        }
    }

    /// Bytes thrown away so far while hunting for a frame.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Feeds one byte. Returns the frame once it is complete.
    pub fn push(&mut self, byte: u8) -> Result<Option<LongFrame>, MBusError> {
        self.buf.put_u8(byte);

        loop {
            match self.length {
                None => {
                    if self.buf.len() < 4 {
                        return Ok(None);
                    }
                    if is_long_header(&self.buf[..4]) {
                        self.length = Some(self.buf[1] as usize);
                        trace!("latched long frame header, L={}", self.buf[1]);
                        continue;
                    }
                    self.discard()?;
                }
                Some(length) => {
                    let total = length + MBUS_FRAME_LONG_OVERHEAD;
                    if self.buf.len() < total {
                        return Ok(None);
                    }
                    if self.buf[total - 1] == MBUS_FRAME_STOP {
                        let frame = self.buf.split_to(total);
                        self.length = None;
                        return Ok(Some(LongFrame::from_bytes(frame.to_vec())));
                    }
                    debug!("no stop byte after L={length}, resyncing");
                    self.length = None;
                    self.discard()?;
                }
            }
        }
    }

    /// Returns a complete frame buffered behind a latched header that has not
    /// completed, consuming everything up to its stop byte.
    pub fn salvage(&mut self) -> Option<LongFrame> {
        self.length?;
        for start in 1..self.buf.len() {
            let rest = &self.buf[start..];
            if rest.len() < 4 || !is_long_header(&rest[..4]) {
                continue;
            }
            let total = rest[1] as usize + MBUS_FRAME_LONG_OVERHEAD;
            if rest.len() >= total && rest[total - 1] == MBUS_FRAME_STOP {
                let frame = LongFrame::from_bytes(rest[..total].to_vec());
                self.buf.advance(start + total);
                self.discarded += start;
                self.length = None;
                return Some(frame);
            }
        }
        None
    }

    fn discard(&mut self) -> Result<(), MBusError> {
        self.buf.advance(1);
        self.discarded += 1;
        if self.discarded > MBUS_FRAME_SCAN_LIMIT {
            warn!("no long frame within {MBUS_FRAME_SCAN_LIMIT} bytes");
            return Err(MBusError::NoFrameFound);
        }
        Ok(())
    }
}

/// `68 L L 68` with a length that can hold at least C, A and CI.
fn is_long_header(window: &[u8]) -> bool {
    window[0] == MBUS_FRAME_LONG_START
        && window[3] == MBUS_FRAME_LONG_START
        && window[1] == window[2]
        && window[1] >= 3
}

fn end_of_stream() -> MBusError {
    MBusError::Transport(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "connection closed",
    ))
}

/// Reads until the acknowledgement byte arrives.
///
/// Bytes before the 0xE5 are skipped without inspection, but at most
/// [`MBUS_FRAME_SCAN_LIMIT`] of them. A read deadline expiry is reported as
/// [`MBusError::AckTimeout`].
pub async fn read_ack_frame<C>(conn: &mut C, timeout: Duration) -> Result<(), MBusError>
where
    C: Conn + ?Sized,
{
    let mut byte = [0u8; 1];
    let mut skipped = 0usize;

    loop {
        conn.set_read_deadline(Instant::now() + timeout)?;
        match conn.read(&mut byte).await {
            Ok(0) => return Err(end_of_stream()),
            Ok(_) if byte[0] == MBUS_FRAME_ACK => {
                if skipped > 0 {
                    debug!("skipped {skipped} bytes before ACK");
                }
                return Ok(());
            }
            Ok(_) => {
                skipped += 1;
                if skipped > MBUS_FRAME_SCAN_LIMIT {
                    warn!("no ACK within {MBUS_FRAME_SCAN_LIMIT} bytes");
                    return Err(MBusError::NoFrameFound);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => return Err(MBusError::AckTimeout),
            Err(e) => return Err(e.into()),
        }
    }
}

/// Reads one complete long frame. Checksum validation is left to the decoder.
pub async fn read_long_frame<C>(conn: &mut C, timeout: Duration) -> Result<LongFrame, MBusError>
where
    C: Conn + ?Sized,
{
    let mut scanner = LongFrameScanner::new();
    let mut tmp = [0u8; 256];

    loop {
        conn.set_read_deadline(Instant::now() + timeout)?;
        let n = match conn.read(&mut tmp).await {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                if let Some(frame) = scanner.salvage() {
                    debug!("recovered frame behind an incomplete header");
                    log_frame_hex("received long frame", frame.as_ref());
                    return Ok(frame);
                }
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            return Err(end_of_stream());
        }

        for (i, &b) in tmp[..n].iter().enumerate() {
            if let Some(frame) = scanner.push(b)? {
                if i + 1 < n {
                    debug!("dropping {} bytes after stop byte", n - i - 1);
                }
                log_frame_hex("received long frame", frame.as_ref());
                return Ok(frame);
            }
        }
    }
}
