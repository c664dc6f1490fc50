//! Physical quantities crossing the wire boundary.
//!
//! Each quantity is a newtype over `f64` stored in one canonical unit
//! (volts, hertz, nanoseconds, degrees). Constructors accept the other
//! common units so callers never have to convert by hand; drivers convert
//! to the device's wire scale only when formatting a command.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InstrumentError;

/// A quantity that can be built from a number and a unit symbol.
pub trait Quantity: Sized + Copy {
    /// Human-readable dimension name used in error messages.
    const DIMENSION: &'static str;

    /// Build the quantity from `value` expressed in `unit`.
    ///
    /// Unit symbols are matched case-insensitively. Returns `None` for
    /// symbols of a different dimension.
    fn from_unit(value: f64, unit: &str) -> Option<Self>;

    /// Parse strings like `"3.3"`, `"660 mV"` or `"6kHz"`.
    ///
    /// A bare number is interpreted in `default_unit`.
    fn parse_with_default(input: &str, default_unit: &str) -> Result<Self, InstrumentError> {
        let (value, unit) = split_number_unit(input).ok_or_else(|| {
            InstrumentError::Type(format!("expected a {}, got {input:?}", Self::DIMENSION))
        })?;
        let unit = if unit.is_empty() { default_unit } else { unit };
        Self::from_unit(value, unit).ok_or_else(|| {
            InstrumentError::Type(format!(
                "unit {unit:?} is not a {} unit",
                Self::DIMENSION
            ))
        })
    }
}

/// Split a leading decimal number from a trailing unit suffix.
///
/// `"2 ns"` gives `(2.0, "ns")`, `"8000"` gives `(8000.0, "")`.
pub fn split_number_unit(input: &str) -> Option<(f64, &str)> {
    let s = input.trim();
    let bytes = s.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        let b = bytes[end];
        let accepted = b.is_ascii_digit()
            || b == b'.'
            || ((b == b'-' || b == b'+') && (end == 0 || matches!(bytes[end - 1], b'e' | b'E')))
            || ((b == b'e' || b == b'E')
                && end > 0
                && bytes
                    .get(end + 1)
                    .is_some_and(|n| n.is_ascii_digit() || *n == b'-' || *n == b'+'));
        if !accepted {
            break;
        }
        end += 1;
    }
    let value = s[..end].parse::<f64>().ok()?;
    Some((value, s[end..].trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Voltage(f64);

impl Voltage {
    pub fn volts(value: f64) -> Self {
        Self(value)
    }

    pub fn millivolts(value: f64) -> Self {
        Self(value / 1e3)
    }

    pub fn as_volts(self) -> f64 {
        self.0
    }

    pub fn as_millivolts(self) -> f64 {
        self.0 * 1e3
    }
}

impl Quantity for Voltage {
    const DIMENSION: &'static str = "voltage";

    fn from_unit(value: f64, unit: &str) -> Option<Self> {
        let scale = match unit.to_lowercase().as_str() {
            "v" => 1.0,
            "mv" => 1e-3,
            "uv" | "µv" => 1e-6,
            "kv" => 1e3,
            _ => return None,
        };
        Some(Self(value * scale))
    }
}

impl From<f64> for Voltage {
    fn from(volts: f64) -> Self {
        Voltage(volts)
    }
}

impl fmt::Display for Voltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} V", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Frequency(f64);

impl Frequency {
    pub fn hz(value: f64) -> Self {
        Self(value)
    }

    pub fn khz(value: f64) -> Self {
        Self(value * 1e3)
    }

    pub fn mhz(value: f64) -> Self {
        Self(value * 1e6)
    }

    pub fn as_hz(self) -> f64 {
        self.0
    }

    pub fn as_khz(self) -> f64 {
        self.0 / 1e3
    }

    pub fn as_mhz(self) -> f64 {
        self.0 / 1e6
    }
}

impl Quantity for Frequency {
    const DIMENSION: &'static str = "frequency";

    fn from_unit(value: f64, unit: &str) -> Option<Self> {
        let scale = match unit.to_lowercase().as_str() {
            "hz" => 1.0,
            "khz" => 1e3,
            "mhz" => 1e6,
            "ghz" => 1e9,
            _ => return None,
        };
        Some(Self(value * scale))
    }
}

/// A bare number is taken as kilohertz.
impl From<f64> for Frequency {
    fn from(khz: f64) -> Self {
        Frequency::khz(khz)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

/// A signed time interval, stored in nanoseconds.
///
/// Unlike [`std::time::Duration`] this can hold negative values, which
/// lets drivers reject them with a range error instead of a panic.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Time(f64);

impl Time {
    pub fn seconds(value: f64) -> Self {
        Self(value * 1e9)
    }

    pub fn millis(value: f64) -> Self {
        Self(value * 1e6)
    }

    pub fn micros(value: f64) -> Self {
        Self(value * 1e3)
    }

    pub fn nanos(value: f64) -> Self {
        Self(value)
    }

    pub fn as_seconds(self) -> f64 {
        self.0 / 1e9
    }

    pub fn as_millis(self) -> f64 {
        self.0 / 1e6
    }

    pub fn as_nanos(self) -> f64 {
        self.0
    }
}

impl Quantity for Time {
    const DIMENSION: &'static str = "time";

    fn from_unit(value: f64, unit: &str) -> Option<Self> {
        let scale = match unit.to_lowercase().as_str() {
            "s" | "sec" => 1e9,
            "ms" => 1e6,
            "us" | "µs" => 1e3,
            "ns" => 1.0,
            _ => return None,
        };
        Some(Self(value * scale))
    }
}

impl From<std::time::Duration> for Time {
    fn from(duration: std::time::Duration) -> Self {
        Time(duration.as_nanos() as f64)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.abs() >= 1e9 || self.0 == 0.0 {
            write!(f, "{} s", self.as_seconds())
        } else {
            write!(f, "{} ns", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub fn degrees(value: f64) -> Self {
        Self(value)
    }

    pub fn radians(value: f64) -> Self {
        Self(value.to_degrees())
    }

    pub fn as_degrees(self) -> f64 {
        self.0
    }

    pub fn as_radians(self) -> f64 {
        self.0.to_radians()
    }
}

impl Quantity for Angle {
    const DIMENSION: &'static str = "angle";

    fn from_unit(value: f64, unit: &str) -> Option<Self> {
        match unit.to_lowercase().as_str() {
            "deg" | "°" => Some(Self::degrees(value)),
            "rad" => Some(Self::radians(value)),
            _ => None,
        }
    }
}

impl From<f64> for Angle {
    fn from(degrees: f64) -> Self {
        Angle(degrees)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} deg", self.0)
    }
}
