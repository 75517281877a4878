//! # BMV Reader
//!
//! Drives the frame scanner from a serial byte source and turns the result
//! into typed fields and readings.

use tracing::debug;

use super::coercer::{coerce, TypedReading};
use super::profile::{BmvModel, DeviceProfile};
use super::reading::Reading;
use super::scanner::{FrameScanner, RawFrame, Scan};
use crate::error::{BmvError, Result};
use crate::serial::SerialPortIO;

/// Maximum reads spent looking for a frame start
pub const MAX_SCAN_ATTEMPTS: usize = 400;

/// Battery monitor reader
///
/// Owns the byte source and the device profile chosen at construction.
/// Each call performs exactly one read attempt; retrying is up to the caller.
#[derive(Debug)]
pub struct BmvReader<P: SerialPortIO> {
    port: P,
    profile: DeviceProfile,
}

impl<P: SerialPortIO> BmvReader<P> {
    pub fn new(port: P, model: BmvModel) -> Self {
        Self {
            port,
            profile: DeviceProfile::for_model(model),
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Read one raw frame
    ///
    /// Discards buffered input, then reads byte by byte until a complete frame
    /// passed both checksums.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No frame start is seen within `MAX_SCAN_ATTEMPTS` reads (`NoData`)
    /// - A half-frame checksum fails (`Checksum`)
    /// - The device goes silent mid-frame (`Truncated`) or the frame runs long (`Overrun`)
    /// - The transport fails (`Io`)
    pub async fn read_frame(&mut self) -> Result<RawFrame> {
        self.port.clear_input().await?;

        let mut scanner = FrameScanner::new(&self.profile);
        let mut attempts = 0;

        loop {
            if scanner.is_seeking() {
                if attempts == MAX_SCAN_ATTEMPTS {
                    return Err(BmvError::NoData(MAX_SCAN_ATTEMPTS));
                }
                attempts += 1;
            }

            let byte = self.port.read_byte().await?;
            if let Scan::Complete(frame) = scanner.push(byte)? {
                debug!("Read {} frame after {} scan attempts", self.profile.model(), attempts);
                return Ok(frame);
            }
        }
    }

    /// Read one frame and convert it to typed fields
    pub async fn read(&mut self) -> Result<TypedReading> {
        let frame = self.read_frame().await?;
        coerce(&frame, &self.profile)
    }

    /// Read one frame and project it onto a `Reading`
    pub async fn get_reading(&mut self) -> Result<Reading> {
        let fields = self.read().await?;
        Ok(Reading::assemble(&fields))
    }
}
