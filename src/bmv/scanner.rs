//! # BMV Frame Scanner
//!
//! Byte-at-a-time state machine that finds a frame in the BMV text stream,
//! captures its values and checks both half-frame checksums.
//!
//! The scanner is fed one transport read result at a time. `None` stands for
//! a read that timed out without producing a byte.
//!
//! ```text
//!            "\n" then "V"                    last record terminated
//! SeekingStart ───────────────▶ InFrame ─────────────────────────────▶ Complete
//!      ▲                           │
//!      └───── checksum / timeout ──┘  (error returned, scanner restarts)
//! ```

use std::fmt;
use std::mem;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use super::checksum::RunningChecksum;
use super::profile::{DeviceProfile, FRAME_START_MARKER};
use crate::error::{BmvError, Result};

/// Upper bound on the bytes of a single frame
///
/// A BMV 602 block is well under 400 bytes; anything longer is line noise.
pub const MAX_FRAME_BYTES: usize = 1024;

/// One of the two checksum-protected segments of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfFrame {
    First,
    Second,
}

impl fmt::Display for HalfFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalfFrame::First => f.write_str("first"),
            HalfFrame::Second => f.write_str("second"),
        }
    }
}

/// Raw values of one frame, positionally aligned with the profile's field names
///
/// Absent values are empty. The `---` sentinel is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    values: Vec<Bytes>,
}

impl RawFrame {
    pub fn new(values: Vec<Bytes>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.values.get(index).map(|value| value.as_ref())
    }

    pub fn values(&self) -> &[Bytes] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of feeding one read result
#[derive(Debug, PartialEq, Eq)]
pub enum Scan {
    /// More bytes needed
    Pending,
    /// A full frame passed both checksums
    Complete(RawFrame),
}

#[derive(Debug)]
enum ScanState {
    /// Looking for the frame start marker; remembers the previous read result
    SeekingStart { previous: Option<u8> },
    /// Consuming records of a frame
    InFrame(FrameProgress),
}

#[derive(Debug)]
struct FrameProgress {
    values: Vec<Bytes>,
    value: BytesMut,
    /// A tab was seen on the current record
    in_value: bool,
    /// Next byte is a checksum byte and is taken verbatim
    checksum_byte_pending: bool,
    /// The current checkpoint record was already validated
    checkpoint_passed: bool,
    checksum: RunningChecksum,
    bytes: usize,
}

impl FrameProgress {
    fn new(total_lines: usize) -> Self {
        // The separator before the first label belongs to the first half
        let mut checksum = RunningChecksum::seeded(b"\r");
        for &byte in FRAME_START_MARKER.iter() {
            checksum.add(byte);
        }

        Self {
            values: Vec::with_capacity(total_lines),
            value: BytesMut::with_capacity(16),
            in_value: false,
            checksum_byte_pending: false,
            checkpoint_passed: false,
            checksum,
            bytes: FRAME_START_MARKER.len(),
        }
    }

    fn line(&self) -> usize {
        self.values.len()
    }

    fn push(&mut self, byte: u8, profile: &DeviceProfile) -> Result<Option<RawFrame>> {
        self.bytes += 1;
        if self.bytes > MAX_FRAME_BYTES {
            return Err(BmvError::Overrun(MAX_FRAME_BYTES));
        }

        if self.checksum_byte_pending {
            self.checksum_byte_pending = false;
            self.checksum.add(byte);
            self.value.put_u8(byte);
            return Ok(None);
        }

        let line = self.line();
        let terminator = byte == b'\r' || byte == b'\n';

        if terminator && !self.checkpoint_passed && profile.is_checksum_line(line) {
            let (first, _) = profile.checksum_lines();
            let half = if line == first { HalfFrame::First } else { HalfFrame::Second };

            if !self.checksum.is_valid() {
                return Err(BmvError::Checksum { half, sum: self.checksum.sum() });
            }

            trace!("{} half-frame checksum ok at line {}", half, line);
            if half == HalfFrame::First {
                self.checksum.reset();
            }
            self.checkpoint_passed = true;
        }

        self.checksum.add(byte);

        match byte {
            b'\n' => {
                self.values.push(self.value.split().freeze());
                self.in_value = false;
                self.checkpoint_passed = false;

                if self.values.len() == profile.total_lines() {
                    return Ok(Some(RawFrame::new(mem::take(&mut self.values))));
                }
            }
            b'\r' => {}
            b'\t' if !self.in_value => {
                self.in_value = true;
                self.checksum_byte_pending = profile.is_checksum_line(line);
            }
            _ if self.in_value => self.value.put_u8(byte),
            _ => {}
        }

        Ok(None)
    }
}

/// Frame parser state machine for one device profile
#[derive(Debug)]
pub struct FrameScanner<'p> {
    profile: &'p DeviceProfile,
    state: ScanState,
}

impl<'p> FrameScanner<'p> {
    pub fn new(profile: &'p DeviceProfile) -> Self {
        Self {
            profile,
            state: ScanState::SeekingStart { previous: None },
        }
    }

    /// True until the frame start marker has been seen
    pub fn is_seeking(&self) -> bool {
        matches!(self.state, ScanState::SeekingStart { .. })
    }

    /// Feed one read result
    ///
    /// # Arguments
    ///
    /// * `byte` - The byte read, or `None` if the read timed out
    ///
    /// # Returns
    ///
    /// * `Result<Scan>` - `Complete` once the last record of the frame is terminated
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - A half-frame checksum fails (`Checksum`)
    /// - A read times out inside a frame (`Truncated`)
    /// - The frame exceeds `MAX_FRAME_BYTES` (`Overrun`)
    ///
    /// After an error or a completed frame the scanner seeks a new frame start.
    pub fn push(&mut self, byte: Option<u8>) -> Result<Scan> {
        match &mut self.state {
            ScanState::SeekingStart { previous } => {
                let found = *previous == Some(FRAME_START_MARKER[0])
                    && byte == Some(FRAME_START_MARKER[1]);
                *previous = byte;

                if found {
                    debug!("Frame start found, reading {} records", self.profile.total_lines());
                    self.state = ScanState::InFrame(FrameProgress::new(self.profile.total_lines()));
                }
                Ok(Scan::Pending)
            }
            ScanState::InFrame(progress) => {
                let result = match byte {
                    Some(byte) => progress.push(byte, self.profile),
                    None => Err(BmvError::Truncated { line: progress.line() }),
                };

                match result {
                    Ok(None) => Ok(Scan::Pending),
                    Ok(Some(frame)) => {
                        self.state = ScanState::SeekingStart { previous: None };
                        Ok(Scan::Complete(frame))
                    }
                    Err(e) => {
                        self.state = ScanState::SeekingStart { previous: None };
                        Err(e)
                    }
                }
            }
        }
    }
}
