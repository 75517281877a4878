//! # Serial Communication Module
//!
//! Handles the VE.Direct serial link to the BMV battery monitor.
//!
//! This module handles:
//! - Opening the serial port at 19,200 baud, 8N1
//! - Single-byte reads bounded by a read timeout
//! - Discarding stale input before each frame scan

pub mod port_trait;

use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::{BmvError, Result};
pub use port_trait::SerialPortIO;

/// BMV serial port handler
///
/// Owns the connection to the battery monitor for its whole lifetime.
pub struct BmvSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
    /// Longest wait for a single byte
    read_timeout: Duration,
}

impl std::fmt::Debug for BmvSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BmvSerial")
            .field("device_path", &self.device_path)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl BmvSerial {
    /// Open the serial port described by `config`
    ///
    /// # Errors
    ///
    /// Returns `Serial` error if the device cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bmv_reader::config::SerialConfig;
    /// use bmv_reader::serial::BmvSerial;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// let config = SerialConfig {
    ///     port: "/dev/ttyUSB0".to_string(),
    ///     baud_rate: 19_200,
    ///     timeout_ms: 1000,
    /// };
    /// let serial = BmvSerial::open(&config)?;
    /// println!("Connected to: {}", serial.device_path());
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        debug!("Opening serial port: {}", config.port);
        let port = Self::open_port(&config.port, config.baud_rate)?;
        info!("Opened BMV serial port at {} ({} baud)", config.port, config.baud_rate);

        Ok(Self {
            port,
            device_path: config.port.clone(),
            read_timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// Open a specific serial port with VE.Direct settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| BmvError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl SerialPortIO for BmvSerial {
    async fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];

        match tokio::time::timeout(self.read_timeout, self.port.read(&mut buf)).await {
            Err(_elapsed) => Ok(None),
            Ok(Ok(0)) => Ok(None),
            Ok(Ok(_)) => Ok(Some(buf[0])),
            Ok(Err(e)) => Err(e),
        }
    }

    async fn clear_input(&mut self) -> io::Result<()> {
        tokio_serial::SerialPort::clear(&self.port, tokio_serial::ClearBuffer::Input)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}
