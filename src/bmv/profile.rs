//! # BMV Protocol Constants and Device Profiles
//!
//! Field layouts and frame boundaries for the BMV 600 and BMV 602 text protocol.

use std::collections::HashMap;
use std::fmt;

use crate::error::{BmvError, Result};

/// VE.Direct baud rate for BMV 600/602
pub const BMV_BAUD_RATE: u32 = 19_200;

/// Label of the checksum record closing each half-frame
pub const CHECKSUM_FIELD: &str = "Checksum";

/// Value sent by the device when a measurement is unavailable
pub const NO_DATA_SENTINEL: &str = "---";

/// Two-byte sequence opening the first record of a frame
pub const FRAME_START_MARKER: [u8; 2] = [b'\n', b'V'];

/// Fields carried as text instead of integers
pub const NON_INTEGER_FIELDS: &[&str] = &["Alarm", "Relay", "BMV", "AR", "FW", CHECKSUM_FIELD];

/// BMV 600 field labels in transmission order
pub const BMV_600_FIELDS: &[&str] = &[
    "V", "I", "CE", "SOC", "TTG", "Alarm", "Relay", "AR", "BMV", "FW", CHECKSUM_FIELD,
    "H1", "H2", "H3", "H4", "H5", "H6", "H7", "H8", "H9", "H10", "H11", "H12", CHECKSUM_FIELD,
];

/// BMV 602 field labels in transmission order
pub const BMV_602_FIELDS: &[&str] = &[
    "V", "VS0", "I", "CE", "SOC", "TTG", "Alarm", "Relay", "AR", "BMV", "FW", CHECKSUM_FIELD,
    "H1", "H2", "H3", "H4", "H5", "H6", "H7", "H8", "H9", "H10", "H11", "H12", "H13", "H14",
    "H15", "H16", CHECKSUM_FIELD,
];

/// Supported battery monitor models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BmvModel {
    Bmv600,
    Bmv602,
}

impl BmvModel {
    /// Numeric model identifier (600 or 602)
    pub fn id(self) -> u16 {
        match self {
            BmvModel::Bmv600 => 600,
            BmvModel::Bmv602 => 602,
        }
    }
}

impl TryFrom<u16> for BmvModel {
    type Error = BmvError;

    fn try_from(id: u16) -> Result<Self> {
        match id {
            600 => Ok(BmvModel::Bmv600),
            602 => Ok(BmvModel::Bmv602),
            other => Err(BmvError::UnsupportedModel(other)),
        }
    }
}

impl fmt::Display for BmvModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BMV {}", self.id())
    }
}

/// Model-specific field layout and frame boundaries
///
/// A frame holds `total_lines` records. The record at `first_checksum_line`
/// closes the first half-frame and the record at `second_checksum_line`
/// closes the second.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    model: BmvModel,
    field_names: &'static [&'static str],
    first_checksum_line: usize,
    second_checksum_line: usize,
    /// First occurrence of each field name
    positions: HashMap<&'static str, usize>,
}

impl DeviceProfile {
    /// Build the profile for a model
    ///
    /// # Examples
    ///
    /// ```
    /// use bmv_reader::bmv::profile::{BmvModel, DeviceProfile};
    ///
    /// let profile = DeviceProfile::for_model(BmvModel::Bmv602);
    /// assert_eq!(profile.total_lines(), 29);
    /// assert_eq!(profile.checksum_lines(), (11, 28));
    /// ```
    pub fn for_model(model: BmvModel) -> Self {
        let (field_names, first_checksum_line, second_checksum_line) = match model {
            BmvModel::Bmv600 => (BMV_600_FIELDS, 10, 23),
            BmvModel::Bmv602 => (BMV_602_FIELDS, 11, 28),
        };

        let mut positions = HashMap::with_capacity(field_names.len());
        for (index, &name) in field_names.iter().enumerate() {
            positions.entry(name).or_insert(index);
        }

        Self {
            model,
            field_names,
            first_checksum_line,
            second_checksum_line,
            positions,
        }
    }

    pub fn model(&self) -> BmvModel {
        self.model
    }

    /// Field labels in transmission order (the checksum label appears twice)
    pub fn field_names(&self) -> &'static [&'static str] {
        self.field_names
    }

    /// Number of records in one frame
    pub fn total_lines(&self) -> usize {
        self.field_names.len()
    }

    /// Record indices of the two checksum checkpoints
    pub fn checksum_lines(&self) -> (usize, usize) {
        (self.first_checksum_line, self.second_checksum_line)
    }

    pub fn is_checksum_line(&self, line: usize) -> bool {
        line == self.first_checksum_line || line == self.second_checksum_line
    }

    /// Position of the first record carrying `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Names of the fields carrying data (checksum records excluded, no duplicates)
    pub fn data_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.field_names
            .iter()
            .copied()
            .enumerate()
            .filter(move |&(index, name)| name != CHECKSUM_FIELD && self.position(name) == Some(index))
            .map(|(_, name)| name)
    }
}

/// True if the field is carried as text rather than an integer
pub fn is_text_field(name: &str) -> bool {
    NON_INTEGER_FIELDS.contains(&name)
}
