//! Transport capability consumed by the protocol engine.
//!
//! The engine only needs three operations from a connection: write bytes,
//! read bytes and arm a read deadline. [`Conn`] captures exactly that so the
//! same code drives a serial port, a TCP gateway or a scripted test double.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

/// Byte-stream connection to an M-Bus segment.
#[async_trait]
pub trait Conn: Send {
    /// Writes `data` and returns the number of bytes written.
    async fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Reads into `buf`. Fails with `ErrorKind::TimedOut` once the read
    /// deadline has passed. `Ok(0)` means the stream has ended.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Arms the deadline for subsequent reads.
    fn set_read_deadline(&mut self, deadline: Instant) -> io::Result<()>;
}

/// Adapts any tokio byte stream into a [`Conn`].
pub struct IoConn<S> {
    stream: S,
    deadline: Option<Instant>,
}

impl<S> IoConn<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        IoConn {
            stream,
            deadline: None,
        }
    }
}

#[async_trait]
impl<S> Conn for IoConn<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        Ok(data.len())
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.stream.read(buf))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "read deadline exceeded"))?,
            None => self.stream.read(buf).await,
        }
    }

    fn set_read_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        self.deadline = Some(deadline);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_io_conn_round_trip() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut conn = IoConn::new(client);

        assert_eq!(conn.write(&[0x10, 0x40, 0x01, 0x41, 0x16]).await.unwrap(), 5);
        let mut sent = [0u8; 5];
        server.read_exact(&mut sent).await.unwrap();
        assert_eq!(sent, [0x10, 0x40, 0x01, 0x41, 0x16]);

        server.write_all(&[0xE5]).await.unwrap();
        conn.set_read_deadline(Instant::now() + Duration::from_secs(1))
            .unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(conn.read(&mut buf).await.unwrap(), 1);
        assert_eq!(buf[0], 0xE5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_io_conn_deadline_expires() {
        let (client, _server) = tokio::io::duplex(64);
        let mut conn = IoConn::new(client);
        conn.set_read_deadline(Instant::now() + Duration::from_millis(50))
            .unwrap();

        let mut buf = [0u8; 1];
        let err = conn.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
