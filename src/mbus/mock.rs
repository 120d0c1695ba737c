//! Mock connection for testing
//!
//! [`MockConn`] implements [`Conn`] with scripted replies so the session
//! functions can be exercised without a meter on the bus. Each queued reply
//! is released into the receive buffer when the master writes its next frame,
//! which mirrors how a slave only talks after being addressed.
//!
//! A read on an empty receive buffer fails immediately with
//! `ErrorKind::TimedOut`, standing in for an expired read deadline.

use crate::mbus::conn::Conn;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;

#[derive(Default)]
struct MockState {
    /// Replies released one per write
    replies: VecDeque<Vec<u8>>,
    /// Data to be read from the connection
    rx: VecDeque<u8>,
    /// Frames written by the master
    writes: Vec<Vec<u8>>,
    /// Largest number of bytes handed out per read (0 = unlimited)
    chunk_size: usize,
    next_read_error: Option<io::Error>,
    next_write_error: Option<io::Error>,
    /// Caps bytes accepted per write to simulate a short write
    write_limit: Option<usize>,
    deadline_count: usize,
    read_count: usize,
    last_deadline: Option<Instant>,
}

/// Scripted connection shared between a test and the code under test.
#[derive(Clone, Default)]
pub struct MockConn {
    state: Arc<Mutex<MockState>>,
}

impl MockConn {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues bytes the device sends after the next write.
    pub fn reply(&self, data: &[u8]) -> &Self {
        self.state().replies.push_back(data.to_vec());
        self
    }

    /// Queues a write that gets no answer.
    pub fn silence(&self) -> &Self {
        self.state().replies.push_back(Vec::new());
        self
    }

    /// Makes bytes readable right away, without waiting for a write.
    pub fn queue_rx_data(&self, data: &[u8]) {
        self.state().rx.extend(data);
    }

    /// Limits how many bytes a single read returns.
    pub fn set_chunk_size(&self, size: usize) {
        self.state().chunk_size = size;
    }

    pub fn set_next_read_error(&self, error: io::Error) {
        self.state().next_read_error = Some(error);
    }

    pub fn set_next_write_error(&self, error: io::Error) {
        self.state().next_write_error = Some(error);
    }

    pub fn set_write_limit(&self, limit: usize) {
        self.state().write_limit = Some(limit);
    }

    /// Frames written so far, one entry per write call.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state().writes.clone()
    }

    pub fn deadline_count(&self) -> usize {
        self.state().deadline_count
    }

    pub fn read_count(&self) -> usize {
        self.state().read_count
    }

    pub fn last_deadline(&self) -> Option<Instant> {
        self.state().last_deadline
    }

    /// Bytes still waiting to be read.
    pub fn pending_rx(&self) -> usize {
        self.state().rx.len()
    }
}

#[async_trait]
impl Conn for MockConn {
    async fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut state = self.state();
        if let Some(error) = state.next_write_error.take() {
            return Err(error);
        }

        let accepted = state.write_limit.map_or(data.len(), |l| l.min(data.len()));
        state.writes.push(data[..accepted].to_vec());
        if let Some(reply) = state.replies.pop_front() {
            state.rx.extend(reply);
        }
        Ok(accepted)
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state();
        state.read_count += 1;
        if let Some(error) = state.next_read_error.take() {
            return Err(error);
        }
        if state.rx.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "read deadline exceeded"));
        }

        let mut n = state.rx.len().min(buf.len());
        if state.chunk_size > 0 {
            n = n.min(state.chunk_size);
        }
        for (slot, byte) in buf.iter_mut().zip(state.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn set_read_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        let mut state = self.state();
        state.deadline_count += 1;
        state.last_deadline = Some(deadline);
        Ok(())
    }
}
