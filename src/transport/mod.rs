//! Byte-stream endpoints an instrument session can run over.
//!
//! The drivers only need `Read + Write`; this module adds openers for the
//! two links used on the bench (a USB/RS-232 serial port and a TCP
//! serial bridge) plus a scripted [`MockTransport`] for tests.

use log::{debug, warn};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::config::TransportConfig;
use crate::error::InstrumentError;

pub mod mock;

pub use mock::MockTransport;

/// A duplex byte stream. Implemented for every `Read + Write` type.
pub trait Transport: Read + Write {}

impl<T: Read + Write> Transport for T {}

/// Timeout settings for a TCP serial bridge.
#[derive(Debug, Clone)]
pub struct TcpTimeouts {
    /// Timeout for establishing the connection
    pub connect: Duration,
    /// Timeout for a single reply read
    pub read: Duration,
    /// Timeout for writing a command
    pub write: Duration,
}

impl Default for TcpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            read: Duration::from_secs(2),
            write: Duration::from_secs(2),
        }
    }
}

/// Connect to a serial-over-TCP bridge such as `ser2net`.
pub fn connect_tcp(address: &str, timeouts: &TcpTimeouts) -> Result<TcpStream, InstrumentError> {
    let socket_addr: SocketAddr = address.parse().map_err(|_| InstrumentError::InvalidRange {
        property: "address",
        value: address.to_string(),
        expected: "host:port".to_string(),
    })?;

    debug!("Connecting to instrument bridge at {address}");

    let stream = TcpStream::connect_timeout(&socket_addr, timeouts.connect).map_err(|e| {
        warn!("Failed to connect to {address}: {e}");
        if e.kind() == std::io::ErrorKind::TimedOut {
            InstrumentError::Timeout
        } else {
            InstrumentError::Io(e)
        }
    })?;

    stream.set_read_timeout(Some(timeouts.read))?;
    stream.set_write_timeout(Some(timeouts.write))?;
    stream.set_nodelay(true)?;

    debug!("Connected to {address}");
    Ok(stream)
}

/// Open a serial port with the given read timeout.
#[cfg(feature = "serial")]
pub fn open_serial(
    port: &str,
    baud_rate: u32,
    timeout: Duration,
) -> Result<Box<dyn serialport::SerialPort>, InstrumentError> {
    let port_handle = serialport::new(port, baud_rate)
        .timeout(timeout)
        .open()
        .map_err(|e| {
            warn!("Failed to open serial port {port}: {e}");
            e
        })?;
    debug!("Serial port {port} opened at {baud_rate} baud");
    Ok(port_handle)
}

/// Open whatever link `config` describes.
pub fn open(config: &TransportConfig) -> Result<Box<dyn Transport>, InstrumentError> {
    match config {
        TransportConfig::Serial {
            port,
            baud_rate,
            timeout_ms,
        } => open_serial_boxed(port, *baud_rate, Duration::from_millis(*timeout_ms)),
        TransportConfig::Tcp {
            address,
            connect_timeout_ms,
            read_timeout_ms,
            write_timeout_ms,
        } => {
            let timeouts = TcpTimeouts {
                connect: Duration::from_millis(*connect_timeout_ms),
                read: Duration::from_millis(*read_timeout_ms),
                write: Duration::from_millis(*write_timeout_ms),
            };
            Ok(Box::new(connect_tcp(address, &timeouts)?))
        }
    }
}

#[cfg(feature = "serial")]
fn open_serial_boxed(
    port: &str,
    baud_rate: u32,
    timeout: Duration,
) -> Result<Box<dyn Transport>, InstrumentError> {
    Ok(Box::new(open_serial(port, baud_rate, timeout)?))
}

#[cfg(not(feature = "serial"))]
fn open_serial_boxed(
    port: &str,
    _baud_rate: u32,
    _timeout: Duration,
) -> Result<Box<dyn Transport>, InstrumentError> {
    Err(InstrumentError::Protocol(format!(
        "cannot open {port}: serial support not enabled, rebuild with --features serial"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_connect_tcp_rejects_bad_address() {
        let err = connect_tcp("not-an-address", &TcpTimeouts::default()).unwrap_err();
        assert!(matches!(
            err,
            InstrumentError::InvalidRange { property: "address", .. }
        ));
    }

    #[test]
    fn test_connect_tcp_to_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let stream = connect_tcp(&address, &TcpTimeouts::default()).unwrap();
        assert_eq!(stream.read_timeout().unwrap(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_open_tcp_from_config() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = TransportConfig::Tcp {
            address: listener.local_addr().unwrap().to_string(),
            connect_timeout_ms: 1000,
            read_timeout_ms: 500,
            write_timeout_ms: 500,
        };
        assert!(open(&config).is_ok());
    }
}
