//! Request/response sequences against a single meter.
//!
//! Every function here owns the connection for the duration of the call and
//! issues strictly one write followed by the reads that answer it. Any error
//! aborts the call. Frames already read in a multi-frame read-out are
//! dropped, and nothing is retried.
//!
//! The frame count bit lives in a `Session` value created per call. It
//! starts cleared after the link reset and toggles with every REQ_UD2, so two
//! read-outs on independent connections never share state.

use crate::error::MBusError;
use crate::mbus::commands;
use crate::mbus::conn::Conn;
use crate::mbus::reader::{read_ack_frame, read_long_frame};
use crate::payload::decoder::DecodedFrame;
use crate::logging::log_frame_hex;
use log::{debug, info};
use std::io;
use std::time::Duration;

struct Session<'a, C: Conn + ?Sized> {
    conn: &'a mut C,
    timeout: Duration,
    fcb: bool,
}

impl<'a, C: Conn + ?Sized> Session<'a, C> {
    fn new(conn: &'a mut C, timeout: Duration) -> Self {
        Session {
            conn,
            timeout,
            fcb: false,
        }
    }

    async fn send(&mut self, frame: &[u8]) -> Result<(), MBusError> {
        log_frame_hex("sending frame", frame);
        let written = self.conn.write(frame).await?;
        if written < frame.len() {
            return Err(MBusError::Transport(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {written} of {} bytes", frame.len()),
            )));
        }
        Ok(())
    }

    async fn send_confirmed(&mut self, frame: &[u8]) -> Result<(), MBusError> {
        self.send(frame).await?;
        read_ack_frame(&mut *self.conn, self.timeout).await
    }

    /// SND_NKE followed by its acknowledgement. Clears the frame count bit.
    async fn reset(&mut self, primary: u8) -> Result<(), MBusError> {
        self.send_confirmed(commands::snd_nke(primary).as_ref())
            .await?;
        self.fcb = false;
        Ok(())
    }

    /// REQ_UD2 with the current frame count bit, then read and decode the answer.
    async fn request(&mut self, primary: u8) -> Result<DecodedFrame, MBusError> {
        let mut frame = commands::request_ud2(primary);
        if self.fcb {
            frame.set_fcb();
            frame.set_checksum();
        }
        self.fcb = !self.fcb;

        self.send(frame.as_ref()).await?;
        let response = read_long_frame(&mut *self.conn, self.timeout).await?;
        response.decode()
    }
}

/// Resets the link and reads one response telegram.
pub async fn read_single_frame<C>(
    conn: &mut C,
    primary: u8,
    timeout: Duration,
) -> Result<DecodedFrame, MBusError>
where
    C: Conn + ?Sized,
{
    let mut session = Session::new(conn, timeout);
    session.reset(primary).await?;
    session.request(primary).await
}

/// Resets the link and reads telegrams until the meter stops announcing more records.
///
/// At least one telegram is always requested.
pub async fn read_all_frames<C>(
    conn: &mut C,
    primary: u8,
    timeout: Duration,
) -> Result<Vec<DecodedFrame>, MBusError>
where
    C: Conn + ?Sized,
{
    let mut session = Session::new(conn, timeout);
    session.reset(primary).await?;

    let mut frames = Vec::new();
    loop {
        let frame = session.request(primary).await?;
        let more = frame.has_more_records();
        frames.push(frame);
        if !more {
            break;
        }
        debug!("device {primary} announced more records, requesting frame {}", frames.len() + 1);
    }

    info!("read {} frame(s) from device {primary}", frames.len());
    Ok(frames)
}

/// Selects the memory page reported by the next read-out.
pub async fn send_page_change<C>(
    conn: &mut C,
    primary: u8,
    page: u8,
    timeout: Duration,
) -> Result<(), MBusError>
where
    C: Conn + ?Sized,
{
    Session::new(conn, timeout)
        .send_confirmed(commands::request_page_change(primary, page).as_ref())
        .await
}

/// Sends an application reset (CI 0x50).
pub async fn application_reset<C>(conn: &mut C, primary: u8, timeout: Duration) -> Result<(), MBusError>
where
    C: Conn + ?Sized,
{
    Session::new(conn, timeout)
        .send_confirmed(commands::application_reset(primary).as_ref())
        .await
}

/// Assigns a primary address to the device with the given identification number.
pub async fn set_primary_using_secondary<C>(
    conn: &mut C,
    secondary: u64,
    new_primary: u8,
    timeout: Duration,
) -> Result<(), MBusError>
where
    C: Conn + ?Sized,
{
    let frame = commands::set_primary_using_secondary(secondary, new_primary);
    Session::new(conn, timeout).send_confirmed(frame.as_ref()).await?;
    info!("assigned primary address {new_primary} to {secondary:08}");
    Ok(())
}

/// Moves a device from one primary address to another.
pub async fn set_primary_using_primary<C>(
    conn: &mut C,
    old_primary: u8,
    new_primary: u8,
    timeout: Duration,
) -> Result<(), MBusError>
where
    C: Conn + ?Sized,
{
    let frame = commands::set_primary_using_primary(old_primary, new_primary);
    Session::new(conn, timeout).send_confirmed(frame.as_ref()).await?;
    info!("moved device {old_primary} to primary address {new_primary}");
    Ok(())
}

/// Selects a device by identification number. It then answers on address 0xFD.
pub async fn select_secondary<C>(conn: &mut C, secondary: u64, timeout: Duration) -> Result<(), MBusError>
where
    C: Conn + ?Sized,
{
    Session::new(conn, timeout)
        .send_confirmed(commands::select_secondary(secondary).as_ref())
        .await
}

/// Checks that a device answers a link reset.
pub async fn ping<C>(conn: &mut C, primary: u8, timeout: Duration) -> Result<(), MBusError>
where
    C: Conn + ?Sized,
{
    Session::new(conn, timeout).reset(primary).await
}
