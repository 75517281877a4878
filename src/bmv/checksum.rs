//! # VE.Direct Text Checksum
//!
//! The BMV text protocol protects each half-frame with a single byte chosen so
//! that the sum of every byte in the half-frame, delimiters and the checksum
//! byte included, is 0 modulo 256.

/// Running modulo-256 byte sum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningChecksum {
    sum: u8,
}

impl RunningChecksum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a pre-computed sum
    pub fn seeded(bytes: &[u8]) -> Self {
        Self { sum: checksum(bytes) }
    }

    pub fn add(&mut self, byte: u8) {
        self.sum = self.sum.wrapping_add(byte);
    }

    pub fn sum(&self) -> u8 {
        self.sum
    }

    /// True when the bytes seen so far sum to 0 modulo 256
    pub fn is_valid(&self) -> bool {
        self.sum == 0
    }

    pub fn reset(&mut self) {
        self.sum = 0;
    }
}

/// Sum of `data` modulo 256
///
/// # Examples
///
/// ```
/// use bmv_reader::bmv::checksum::checksum;
///
/// assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
/// ```
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

/// Byte that brings the sum of `data` to 0 modulo 256
pub fn checksum_complement(data: &[u8]) -> u8 {
    checksum(data).wrapping_neg()
}
