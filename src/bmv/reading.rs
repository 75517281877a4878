//! # BMV Reading
//!
//! The subset of fields handed to downstream consumers.

use super::coercer::TypedReading;

/// One reading of the battery monitor
///
/// Fields the device did not report (sentinel) or that the model does not
/// have (starter battery voltage on a BMV 600) are `None`, never zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reading {
    /// Main battery voltage in mV
    pub battery_voltage: Option<i64>,

    /// Starter battery voltage in mV (BMV 602 only)
    pub starter_battery_voltage: Option<i64>,

    /// Battery current in mA
    pub current: Option<i64>,

    /// Consumed energy in mAh
    pub consumed_energy: Option<i64>,

    /// State of charge in per mille
    pub state_of_charge: Option<i64>,

    /// Time to go in minutes
    pub time_to_go: Option<i64>,

    /// Alarm state ("ON" / "OFF")
    pub alarm: Option<String>,

    /// Relay state ("ON" / "OFF")
    pub relay: Option<String>,
}

impl Reading {
    /// Project typed fields onto a reading. Never fails.
    pub fn assemble(fields: &TypedReading) -> Self {
        let integer = |name: &str| fields.get(name).and_then(|value| value.as_integer());
        let text = |name: &str| {
            fields
                .get(name)
                .and_then(|value| value.as_text())
                .map(str::to_string)
        };

        Self {
            battery_voltage: integer("V"),
            starter_battery_voltage: integer("VS0"),
            current: integer("I"),
            consumed_energy: integer("CE"),
            state_of_charge: integer("SOC"),
            time_to_go: integer("TTG"),
            alarm: text("Alarm"),
            relay: text("Relay"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bmv::coercer::FieldValue;

    #[test]
    fn test_assemble_projects_fields() {
        let mut fields = TypedReading::new();
        fields.insert("V", FieldValue::Integer(12500));
        fields.insert("VS0", FieldValue::Integer(12640));
        fields.insert("I", FieldValue::Integer(-230));
        fields.insert("CE", FieldValue::Integer(-1500));
        fields.insert("SOC", FieldValue::Integer(970));
        fields.insert("TTG", FieldValue::Integer(-1));
        fields.insert("Alarm", FieldValue::Text("OFF".into()));
        fields.insert("Relay", FieldValue::Text("ON".into()));
        fields.insert("H1", FieldValue::Integer(-102));

        let reading = Reading::assemble(&fields);
        assert_eq!(
            reading,
            Reading {
                battery_voltage: Some(12500),
                starter_battery_voltage: Some(12640),
                current: Some(-230),
                consumed_energy: Some(-1500),
                state_of_charge: Some(970),
                time_to_go: Some(-1),
                alarm: Some("OFF".into()),
                relay: Some("ON".into()),
            }
        );
    }

    #[test]
    fn test_missing_fields_are_none() {
        let mut fields = TypedReading::new();
        fields.insert("V", FieldValue::Integer(0));

        let reading = Reading::assemble(&fields);
        assert_eq!(reading.battery_voltage, Some(0));
        assert_eq!(reading.starter_battery_voltage, None);
        assert_eq!(reading.alarm, None);
    }

    #[test]
    fn test_sentinel_fields_are_none() {
        let mut fields = TypedReading::new();
        fields.insert("TTG", FieldValue::Absent);
        fields.insert("Alarm", FieldValue::Absent);

        let reading = Reading::assemble(&fields);
        assert_eq!(reading.time_to_go, None);
        assert_eq!(reading.alarm, None);
    }

    #[test]
    fn test_empty_mapping() {
        assert_eq!(Reading::assemble(&TypedReading::new()), Reading::default());
    }
}
