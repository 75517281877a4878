//! # Error Types
//!
//! Custom error types for BMV Reader using `thiserror`.

use thiserror::Error;

use crate::bmv::scanner::HalfFrame;

/// Main error type for BMV Reader
#[derive(Debug, Error)]
pub enum BmvError {
    /// No frame start marker seen within the scan bound
    #[error("No data: no frame start found within {0} read attempts")]
    NoData(usize),

    /// The transport went silent in the middle of a frame
    #[error("Frame truncated at line {line}: read timed out")]
    Truncated { line: usize },

    /// A frame grew past the maximum frame size without completing
    #[error("Frame overrun: no complete frame within {0} bytes")]
    Overrun(usize),

    /// A half-frame checksum was not congruent to 0 modulo 256
    #[error("Checksum error in {half} half-frame (sum 0x{sum:02X})")]
    Checksum { half: HalfFrame, sum: u8 },

    /// A field value could not be converted to its expected type
    #[error("Format error: field '{field}' has unexpected value {value:?}")]
    Format { field: String, value: String },

    /// Model identifier without a known field layout
    #[error("Unsupported BMV model: {0} (supported: 600, 602)")]
    UnsupportedModel(u16),

    /// A field named by the device profile has no value
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// HTTP errors while publishing
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BmvError {
    /// True for single read-attempt outcomes caused by missing or corrupted frames.
    ///
    /// These are expected on a noisy or idle line and are retried on the next
    /// polling interval.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            BmvError::NoData(_)
                | BmvError::Truncated { .. }
                | BmvError::Overrun(_)
                | BmvError::Checksum { .. }
        )
    }

    /// True when the serial transport itself failed and should be reopened.
    pub fn is_transport_fault(&self) -> bool {
        matches!(self, BmvError::Serial(_) | BmvError::Io(_))
    }
}

/// Result type alias for BMV Reader
pub type Result<T> = std::result::Result<T, BmvError>;
