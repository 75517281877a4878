//! # BMV Text Block Encoder
//!
//! Renders a frame the way a BMV 600/602 transmits it, checksum bytes included.
//! Handy for feeding simulated devices and exercising the parser.

use super::checksum::checksum_complement;
use super::profile::DeviceProfile;
use crate::error::{BmvError, Result};

/// Encode one frame for `profile`
///
/// Every record is written as `\r\n<label>\t<value>`. Checksum records get the
/// byte that closes their half-frame to 0 modulo 256. The frame ends with the
/// second checksum byte; on the wire the `\r\n` opening the next frame
/// terminates it.
///
/// # Arguments
///
/// * `profile` - Device layout to encode
/// * `fields` - Label/value pairs for every data field of the profile
///
/// # Errors
///
/// Returns `MissingField` if a data field of the profile has no value in `fields`
///
/// # Examples
///
/// ```
/// use bmv_reader::bmv::encoder::encode_frame;
/// use bmv_reader::bmv::profile::{BmvModel, DeviceProfile};
///
/// let profile = DeviceProfile::for_model(BmvModel::Bmv600);
/// let fields: Vec<(&str, &str)> = profile.data_fields().map(|name| (name, "---")).collect();
/// let frame = encode_frame(&profile, &fields).unwrap();
/// assert!(frame.starts_with(b"\r\nV\t---"));
/// ```
pub fn encode_frame(profile: &DeviceProfile, fields: &[(&str, &str)]) -> Result<Vec<u8>> {
    let mut frame = Vec::with_capacity(profile.total_lines() * 16);
    let mut half_start = 0;

    for (line, &name) in profile.field_names().iter().enumerate() {
        frame.extend_from_slice(b"\r\n");
        frame.extend_from_slice(name.as_bytes());
        frame.push(b'\t');

        if profile.is_checksum_line(line) {
            let byte = checksum_complement(&frame[half_start..]);
            frame.push(byte);
            half_start = frame.len();
        } else {
            let value = fields
                .iter()
                .find(|(label, _)| *label == name)
                .map(|(_, value)| *value)
                .ok_or_else(|| BmvError::MissingField(name.to_string()))?;
            frame.extend_from_slice(value.as_bytes());
        }
    }

    Ok(frame)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::bmv::checksum::checksum;
    use crate::bmv::profile::{BmvModel, DeviceProfile};

    fn split_halves(frame: &[u8]) -> (&[u8], &[u8]) {
        let marker = b"\r\nH1\t";
        let at = frame
            .windows(marker.len())
            .position(|window| window == marker)
            .unwrap();
        frame.split_at(at)
    }

    #[test]
    fn test_encoded_halves_sum_to_zero() {
        for frame in [frame_600(), frame_602()] {
            let (first, second) = split_halves(&frame);
            assert_eq!(checksum(first), 0);
            assert_eq!(checksum(second), 0);
        }
    }

    #[test]
    fn test_record_layout() {
        let frame = frame_600();
        assert!(frame.starts_with(b"\r\nV\t12500\r\nI\t-230\r\n"));

        let records = frame.split(|&b| b == b'\n').count();
        // Leading empty piece before the first "\r\n"
        assert_eq!(records, 24 + 1);
    }

    #[test]
    fn test_602_carries_starter_voltage() {
        let frame = frame_602();
        assert!(frame.starts_with(b"\r\nV\t12500\r\nVS0\t12640\r\nI\t-230"));
    }

    #[test]
    fn test_missing_field() {
        let profile = DeviceProfile::for_model(BmvModel::Bmv602);
        match encode_frame(&profile, &bmv_600_fields()) {
            Err(BmvError::MissingField(name)) => assert_eq!(name, "VS0"),
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }
}
