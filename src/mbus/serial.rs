//! # M-Bus Serial and TCP Connections
//!
//! Opens the physical links a master typically uses: a level converter on a
//! serial port (8 data bits, even parity, one stop bit) or a TCP gateway that
//! tunnels the same byte stream. Both come back as [`IoConn`] so they plug
//! straight into the session functions.

use crate::error::MBusError;
use crate::mbus::conn::IoConn;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_serial::SerialPortBuilderExt;

/// Configuration for serial connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    pub baudrate: u32,
    /// Per-read timeout handed to the session functions.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            baudrate: 2400,
            timeout: Duration::from_secs(5),
        }
    }
}

pub type SerialConn = IoConn<tokio_serial::SerialStream>;
pub type TcpConn = IoConn<TcpStream>;

/// Opens `port_name` with the M-Bus line settings (8E1) at the configured baud rate.
pub fn open_serial(port_name: &str, config: &SerialConfig) -> Result<SerialConn, MBusError> {
    let port = tokio_serial::new(port_name, config.baudrate)
        .data_bits(tokio_serial::DataBits::Eight)
        .stop_bits(tokio_serial::StopBits::One)
        .parity(tokio_serial::Parity::Even)
        .timeout(config.timeout)
        .open_native_async()
        .map_err(std::io::Error::from)?;

    log::debug!("opened {} at {} baud", port_name, config.baudrate);
    Ok(IoConn::new(port))
}

/// Connects to a transparent M-Bus/TCP gateway.
pub async fn connect_tcp<A: ToSocketAddrs>(addr: A) -> Result<TcpConn, MBusError> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(IoConn::new(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mbus::conn::Conn;

    #[test]
    fn test_default_config() {
        let config = SerialConfig::default();
        assert_eq!(config.baudrate, 2400);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_from_json() {
        let config: SerialConfig =
            serde_json::from_str(r#"{"baudrate":9600,"timeout":{"secs":2,"nanos":0}}"#).unwrap();
        assert_eq!(config.baudrate, 9600);
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_open_missing_port_is_transport_error() {
        let result = open_serial("/dev/does-not-exist-mbus", &SerialConfig::default());
        assert!(matches!(result, Err(MBusError::Transport(_))));
    }

    #[tokio::test]
    async fn test_connect_tcp() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

        let mut conn = connect_tcp(addr).await.unwrap();
        let written = conn.write(&[0x10, 0x40, 0x00, 0x40, 0x16]).await.unwrap();
        assert_eq!(written, 5);
        accept.await.unwrap();
    }
}
