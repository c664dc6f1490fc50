//! Name-addressed property access shared by all drivers.
//!
//! The typed accessors on each driver are the primary API. This module adds
//! a string-keyed layer on top so that tools (the `benchctl` binary, scripts)
//! can read and write properties by name, with values given as text.

use serde::Serialize;
use std::fmt;

use crate::error::InstrumentError;
use crate::minghe::WaveType;
use crate::qubitekk::{FirmwareVersion, TriggerMode};
use crate::units::{Angle, Frequency, Time, Voltage};

/// A property value read from an instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Voltage(Voltage),
    Frequency(Frequency),
    Time(Time),
    Angle(Angle),
    Bool(bool),
    Count(u64),
    WaveType(WaveType),
    TriggerMode(TriggerMode),
    Firmware(FirmwareVersion),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Voltage(v) => write!(f, "{v}"),
            PropertyValue::Frequency(v) => write!(f, "{v}"),
            PropertyValue::Time(v) => write!(f, "{v}"),
            PropertyValue::Angle(v) => write!(f, "{v}"),
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::Count(v) => write!(f, "{v}"),
            PropertyValue::WaveType(v) => write!(f, "{v}"),
            PropertyValue::TriggerMode(v) => write!(f, "{v}"),
            PropertyValue::Firmware(v) => write!(f, "{v}"),
            PropertyValue::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Property access by name, implemented by every driver and channel view.
pub trait PropertyAccess {
    /// Names accepted by [`get`](Self::get).
    fn property_names(&self) -> &'static [&'static str];

    /// Read a property from the instrument.
    fn get(&mut self, name: &str) -> Result<PropertyValue, InstrumentError>;

    /// Parse `raw` for property `name` and write it to the instrument.
    ///
    /// Parsing and validation happen before anything is sent.
    fn set(&mut self, name: &str, raw: &str) -> Result<(), InstrumentError>;
}

/// Parse a boolean flag given as text.
///
/// Accepts `on/off`, `true/false`, `yes/no` and `1/0`, case-insensitively.
/// Anything else is a type error.
pub fn parse_bool(property: &str, raw: &str) -> Result<bool, InstrumentError> {
    match raw.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(InstrumentError::Type(format!(
            "{property} expects a boolean, got {raw:?}"
        ))),
    }
}

/// Reject `value` unless it lies in `min..=max`.
pub(crate) fn check_range(
    property: &'static str,
    value: f64,
    min: f64,
    max: f64,
    unit: &str,
) -> Result<(), InstrumentError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(InstrumentError::InvalidRange {
            property,
            value: format!("{value} {unit}"),
            expected: format!("{min} ..= {max} {unit}"),
        })
    }
}

/// Reject negative (or non-finite) values.
pub(crate) fn check_non_negative(
    property: &'static str,
    value: f64,
    unit: &str,
) -> Result<(), InstrumentError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InstrumentError::InvalidRange {
            property,
            value: format!("{value} {unit}"),
            expected: format!(">= 0 {unit}"),
        })
    }
}

/// Parse the numeric body of a device reply.
pub(crate) fn parse_reply_number(command: &str, body: &str) -> Result<f64, InstrumentError> {
    body.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            InstrumentError::Protocol(format!("non-numeric reply to {command}: {body:?}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_tokens() {
        assert!(parse_bool("gate", "ON").unwrap());
        assert!(parse_bool("gate", "true").unwrap());
        assert!(!parse_bool("gate", "0").unwrap());
        assert!(!parse_bool("gate", " off ").unwrap());
    }

    #[test]
    fn test_parse_bool_rejects_other_text() {
        let err = parse_bool("gate", "blo").unwrap_err();
        assert!(matches!(err, InstrumentError::Type(_)));
        assert_eq!(err.to_string(), "Type error: gate expects a boolean, got \"blo\"");
    }

    #[test]
    fn test_check_range_is_inclusive() {
        assert!(check_range("window", 0.0, 0.0, 7.0, "ns").is_ok());
        assert!(check_range("window", 7.0, 0.0, 7.0, "ns").is_ok());
        assert!(check_range("window", 10.0, 0.0, 7.0, "ns").is_err());
        assert!(check_range("window", f64::NAN, 0.0, 7.0, "ns").is_err());
    }

    #[test]
    fn test_parse_reply_number() {
        assert_eq!(parse_reply_number("WIND?", " 2 ").unwrap(), 2.0);
        assert!(matches!(
            parse_reply_number("WIND?", "Unknown"),
            Err(InstrumentError::Protocol(_))
        ));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(PropertyValue::Bool(true).to_string(), "true");
        assert_eq!(PropertyValue::Voltage(Voltage::volts(3.3)).to_string(), "3.3 V");
        assert_eq!(
            PropertyValue::TriggerMode(TriggerMode::StartStop).to_string(),
            "start_stop"
        );
    }

    #[test]
    fn test_value_serializes_with_kind_tag() {
        let json = serde_json::to_string(&PropertyValue::Count(20)).unwrap();
        assert_eq!(json, r#"{"kind":"count","value":20}"#);
    }
}
