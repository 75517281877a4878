//! # Value Coercion
//!
//! Turns raw frame values into typed fields according to the device profile.

use std::collections::BTreeMap;

use serde::Serialize;

use super::profile::{is_text_field, DeviceProfile, NO_DATA_SENTINEL};
use super::scanner::RawFrame;
use crate::error::{BmvError, Result};

/// Typed value of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    /// The device sent the `---` sentinel
    Absent,
}

impl FieldValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// Field name to typed value, checksum records excluded
pub type TypedReading = BTreeMap<&'static str, FieldValue>;

/// Convert a raw frame into typed fields
///
/// Every data field of the profile is looked up by the position of its first
/// occurrence. `---` becomes `Absent`; text fields stay text; everything else
/// must parse as a signed integer.
///
/// # Errors
///
/// Returns error if:
/// - A value is not valid UTF-8 (`Format`)
/// - An integer field does not parse (`Format`)
/// - The frame is shorter than the profile (`MissingField`)
pub fn coerce(frame: &RawFrame, profile: &DeviceProfile) -> Result<TypedReading> {
    let mut fields = TypedReading::new();

    for name in profile.data_fields() {
        let raw = profile
            .position(name)
            .and_then(|index| frame.get(index))
            .ok_or_else(|| BmvError::MissingField(name.to_string()))?;

        let text = std::str::from_utf8(raw).map_err(|_| BmvError::Format {
            field: name.to_string(),
            value: String::from_utf8_lossy(raw).into_owned(),
        })?;

        let value = if text == NO_DATA_SENTINEL {
            FieldValue::Absent
        } else if is_text_field(name) {
            FieldValue::Text(text.to_string())
        } else {
            let parsed = text.parse::<i64>().map_err(|_| BmvError::Format {
                field: name.to_string(),
                value: text.to_string(),
            })?;
            FieldValue::Integer(parsed)
        };

        fields.insert(name, value);
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bmv::profile::{BmvModel, CHECKSUM_FIELD};
    use bytes::Bytes;

    fn raw_frame(profile: &DeviceProfile, fields: &[(&str, &str)]) -> RawFrame {
        let values = profile
            .field_names()
            .iter()
            .map(|name| {
                let value = fields
                    .iter()
                    .find(|(label, _)| label == name)
                    .map(|(_, value)| value.as_bytes().to_vec())
                    .unwrap_or_else(|| vec![0xA7]);
                Bytes::from(value)
            })
            .collect();
        RawFrame::new(values)
    }

    fn all_zero(profile: &DeviceProfile) -> Vec<(&'static str, &'static str)> {
        profile
            .data_fields()
            .map(|name| (name, if is_text_field(name) { "OFF" } else { "0" }))
            .collect()
    }

    #[test]
    fn test_integers_and_text() {
        let profile = DeviceProfile::for_model(BmvModel::Bmv600);
        let mut fields = all_zero(&profile);
        fields.retain(|(name, _)| !["V", "I", "Relay", "FW"].contains(name));
        fields.extend([("V", "12500"), ("I", "-230"), ("Relay", "ON"), ("FW", "212")]);

        let typed = coerce(&raw_frame(&profile, &fields), &profile).unwrap();
        assert_eq!(typed["V"], FieldValue::Integer(12500));
        assert_eq!(typed["I"], FieldValue::Integer(-230));
        assert_eq!(typed["Relay"], FieldValue::Text("ON".into()));
        assert_eq!(typed["FW"], FieldValue::Text("212".into()));
        assert_eq!(typed["H12"], FieldValue::Integer(0));
    }

    #[test]
    fn test_checksum_fields_skipped() {
        for model in [BmvModel::Bmv600, BmvModel::Bmv602] {
            let profile = DeviceProfile::for_model(model);
            let typed = coerce(&raw_frame(&profile, &all_zero(&profile)), &profile).unwrap();
            assert!(!typed.contains_key(CHECKSUM_FIELD));
            assert_eq!(typed.len(), profile.total_lines() - 2);
        }
    }

    #[test]
    fn test_sentinel_is_absent_for_any_field() {
        let profile = DeviceProfile::for_model(BmvModel::Bmv602);
        let fields: Vec<_> = profile.data_fields().map(|name| (name, "---")).collect();

        let typed = coerce(&raw_frame(&profile, &fields), &profile).unwrap();
        for (name, value) in &typed {
            assert_eq!(*value, FieldValue::Absent, "{} should be absent", name);
        }
    }

    #[test]
    fn test_invalid_integer_is_format_error() {
        let profile = DeviceProfile::for_model(BmvModel::Bmv600);
        let mut fields = all_zero(&profile);
        fields.retain(|(name, _)| *name != "SOC");
        fields.push(("SOC", "97.0"));

        match coerce(&raw_frame(&profile, &fields), &profile) {
            Err(BmvError::Format { field, value }) => {
                assert_eq!(field, "SOC");
                assert_eq!(value, "97.0");
            }
            other => panic!("Expected Format error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_integer_is_format_error() {
        let profile = DeviceProfile::for_model(BmvModel::Bmv600);
        let mut fields = all_zero(&profile);
        fields.retain(|(name, _)| *name != "TTG");
        fields.push(("TTG", ""));

        assert!(matches!(
            coerce(&raw_frame(&profile, &fields), &profile),
            Err(BmvError::Format { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let profile = DeviceProfile::for_model(BmvModel::Bmv600);
        let mut frame = raw_frame(&profile, &all_zero(&profile)).values().to_vec();
        frame[5] = Bytes::from_static(&[0xFF, 0xFE]);

        assert!(matches!(
            coerce(&RawFrame::new(frame), &profile),
            Err(BmvError::Format { .. })
        ));
    }

    #[test]
    fn test_short_frame() {
        let profile = DeviceProfile::for_model(BmvModel::Bmv602);
        let frame = RawFrame::new(vec![Bytes::from_static(b"12500")]);
        assert!(matches!(coerce(&frame, &profile), Err(BmvError::MissingField(_))));
    }

    #[test]
    fn test_600_has_no_starter_voltage() {
        let profile = DeviceProfile::for_model(BmvModel::Bmv600);
        let typed = coerce(&raw_frame(&profile, &all_zero(&profile)), &profile).unwrap();
        assert!(!typed.contains_key("VS0"));
    }

    #[test]
    fn test_serializes_for_publishing() {
        let mut typed = TypedReading::new();
        typed.insert("V", FieldValue::Integer(12500));
        typed.insert("Alarm", FieldValue::Text("OFF".into()));
        typed.insert("TTG", FieldValue::Absent);

        let json = serde_json::to_string(&typed).unwrap();
        assert_eq!(json, r#"{"Alarm":"OFF","TTG":null,"V":12500}"#);
    }
}
