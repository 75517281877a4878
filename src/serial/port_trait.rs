//! Trait abstraction for serial port operations to enable testing

use async_trait::async_trait;
use std::io;

/// Trait for the byte source the frame reader consumes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SerialPortIO: Send {
    /// Read a single byte, waiting at most the port's read timeout
    ///
    /// Returns `Ok(None)` when the timeout elapsed without data.
    async fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Discard everything buffered on the input side
    async fn clear_input(&mut self) -> io::Result<()>;
}
