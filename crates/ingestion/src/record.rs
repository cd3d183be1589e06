//! Raw record parsing
//!
//! Two shapes are accepted on each line:
//! - vehicle-API nested: `drive_state.{timestamp,speed,power,heading}`,
//!   `charge_state.battery_level`, `vehicle_state.odometer`
//! - flat: `timestamp, odometer, speed, power, battery, heading`
//!   (wire names `vehicle_speed`, `power_kw`, `battery_level` also accepted)
//!
//! `null` and missing keys both mean "absent".

use contracts::{RawFrame, SourceParseError};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NestedRecord {
    drive_state: Option<DriveState>,
    charge_state: Option<ChargeState>,
    vehicle_state: Option<VehicleStateSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DriveState {
    timestamp: Option<u64>,
    speed: Option<f64>,
    power: Option<f64>,
    heading: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChargeState {
    battery_level: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VehicleStateSection {
    odometer: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FlatRecord {
    timestamp: Option<u64>,
    odometer: Option<f64>,
    #[serde(alias = "vehicle_speed")]
    speed: Option<f64>,
    #[serde(alias = "power_kw")]
    power: Option<f64>,
    #[serde(alias = "battery_level")]
    battery: Option<f64>,
    heading: Option<f64>,
}

impl From<NestedRecord> for FlatRecord {
    fn from(nested: NestedRecord) -> Self {
        let drive = nested.drive_state.unwrap_or_default();
        Self {
            timestamp: drive.timestamp,
            odometer: nested.vehicle_state.and_then(|v| v.odometer),
            speed: drive.speed,
            power: drive.power,
            battery: nested.charge_state.and_then(|c| c.battery_level),
            heading: drive.heading,
        }
    }
}

/// Parse one JSON line into a `RawFrame`
///
/// `line_no` is 1-based and only used for error reporting.
pub fn parse_record(line_no: u64, line: &str) -> Result<RawFrame, SourceParseError> {
    let err = |msg: String| SourceParseError::new(line_no, msg);

    let value: Value = serde_json::from_str(line).map_err(|e| err(format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(err("record is not a JSON object".to_string()));
    }

    let record = if value.get("drive_state").is_some() {
        serde_json::from_value::<NestedRecord>(value).map(FlatRecord::from)
    } else {
        serde_json::from_value::<FlatRecord>(value)
    }
    .map_err(|e| err(format!("unexpected field type: {e}")))?;

    let timestamp = record
        .timestamp
        .ok_or_else(|| err("missing timestamp".to_string()))?;

    let odometer = record
        .odometer
        .ok_or_else(|| err("missing odometer".to_string()))?;
    if !odometer.is_finite() || odometer < 0.0 {
        return Err(err(format!("odometer out of range: {odometer}")));
    }

    let battery = record
        .battery
        .map(|b| integral_in_range("battery", b, 0, 100))
        .transpose()
        .map_err(err)?;
    let heading = record
        .heading
        .map(|h| integral_in_range("heading", h, 0, 359))
        .transpose()
        .map_err(err)?;

    Ok(RawFrame {
        timestamp,
        odometer: odometer as f32,
        speed: record.speed.map(|v| v as f32),
        power: record.power.map(|v| v as f32),
        battery,
        heading,
    })
}

/// Round to the nearest integer and check bounds
fn integral_in_range(name: &str, value: f64, min: i32, max: i32) -> Result<i32, String> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < f64::from(min) || rounded > f64::from(max) {
        return Err(format!("{name} out of range: {value}"));
    }
    Ok(rounded as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_record() {
        let line = r#"{"drive_state":{"timestamp":1700000000000,"speed":42.5,"power":-3.0,"heading":270,"shift_state":"D"},"charge_state":{"battery_level":77},"vehicle_state":{"odometer":15234.25}}"#;
        let frame = parse_record(1, line).unwrap();
        assert_eq!(frame.timestamp, 1_700_000_000_000);
        assert_eq!(frame.odometer, 15234.25);
        assert_eq!(frame.speed, Some(42.5));
        assert_eq!(frame.power, Some(-3.0));
        assert_eq!(frame.battery, Some(77));
        assert_eq!(frame.heading, Some(270));
    }

    #[test]
    fn test_nested_nulls_are_absent() {
        let line = r#"{"drive_state":{"timestamp":1000,"speed":null,"power":0,"heading":null},"charge_state":null,"vehicle_state":{"odometer":10}}"#;
        let frame = parse_record(1, line).unwrap();
        assert_eq!(frame.speed, None);
        assert_eq!(frame.power, Some(0.0));
        assert_eq!(frame.battery, None);
        assert_eq!(frame.heading, None);
    }

    #[test]
    fn test_flat_record_with_wire_names() {
        let line = r#"{"timestamp":1100,"odometer":5.5,"vehicle_speed":30,"power_kw":12.5,"battery_level":50.0,"heading":90.4}"#;
        let frame = parse_record(3, line).unwrap();
        assert_eq!(frame.speed, Some(30.0));
        assert_eq!(frame.power, Some(12.5));
        assert_eq!(frame.battery, Some(50));
        assert_eq!(frame.heading, Some(90));
    }

    #[test]
    fn test_missing_mandatory_fields() {
        let err = parse_record(4, r#"{"odometer":1.0}"#).unwrap_err();
        assert_eq!(err.line, 4);
        assert!(err.message.contains("timestamp"));

        let err = parse_record(5, r#"{"drive_state":{"timestamp":1}}"#).unwrap_err();
        assert!(err.message.contains("odometer"));
    }

    #[test]
    fn test_out_of_range_values() {
        let err = parse_record(1, r#"{"timestamp":1,"odometer":1,"battery":101}"#).unwrap_err();
        assert!(err.message.contains("battery"));

        let err = parse_record(1, r#"{"timestamp":1,"odometer":1,"heading":360}"#).unwrap_err();
        assert!(err.message.contains("heading"));

        let err = parse_record(1, r#"{"timestamp":1,"odometer":-2}"#).unwrap_err();
        assert!(err.message.contains("odometer"));
    }

    #[test]
    fn test_garbage_lines() {
        assert!(parse_record(1, "not json").is_err());
        assert!(parse_record(1, "[1,2,3]").is_err());
        assert!(parse_record(1, r#"{"timestamp":"soon","odometer":1}"#).is_err());
    }
}
