use super::Cc1;
use crate::error::InstrumentError;
use crate::property::{check_non_negative, check_range, parse_reply_number};
use crate::transport::Transport;
use crate::units::{Quantity, Time, split_number_unit};

const MAX_WINDOW_NS: f64 = 7.0;
const MAX_DELAY_NS: f64 = 10.0;
/// The delay line moves in 2 ns steps.
const DELAY_STEP_NS: f64 = 2.0;

/// Parse a time reply that may carry a unit suffix (`"2"` or `"2 ns"`).
fn parse_time_reply(command: &str, body: &str, default_unit: &str) -> Result<Time, InstrumentError> {
    let malformed = || InstrumentError::Protocol(format!("non-numeric reply to {command}: {body:?}"));
    let (value, unit) = split_number_unit(body).ok_or_else(malformed)?;
    let unit = if unit.is_empty() { default_unit } else { unit };
    Time::from_unit(value, unit).ok_or_else(malformed)
}

/// Largest distance from a whole nanosecond still treated as that value.
const WHOLE_NS_TOLERANCE: f64 = 1e-6;

/// Snap `time` to a whole number of nanoseconds.
///
/// Values converted from other units carry rounding noise (3 ns given in
/// seconds is 3.0000000000000004 ns); anything further off than
/// [`WHOLE_NS_TOLERANCE`] is rejected.
fn whole_nanos(property: &'static str, time: Time, expected: &str) -> Result<i64, InstrumentError> {
    let ns = time.as_nanos();
    let snapped = ns.round();
    if !ns.is_finite() || (ns - snapped).abs() > WHOLE_NS_TOLERANCE {
        return Err(InstrumentError::InvalidRange {
            property,
            value: format!("{ns} ns"),
            expected: expected.to_string(),
        });
    }
    Ok(snapped as i64)
}

impl<T: Transport> Cc1<T> {
    /// Coincidence window.
    pub fn window(&mut self) -> Result<Time, InstrumentError> {
        let reply = self.query("WIND?")?;
        parse_time_reply("WIND?", &reply, "ns")
    }

    /// Set the coincidence window, a whole number of nanoseconds in 0..=7.
    pub fn set_window(&mut self, window: impl Into<Time>) -> Result<(), InstrumentError> {
        let ns = whole_nanos("window", window.into(), "a whole number of ns in 0 ..= 7")?;
        check_range("window", ns as f64, 0.0, MAX_WINDOW_NS, "ns")?;
        self.write(&format!(":WIND {ns}"))
    }

    /// Delay applied to channel 2.
    pub fn delay(&mut self) -> Result<Time, InstrumentError> {
        let reply = self.query("DELA?")?;
        parse_time_reply("DELA?", &reply, "ns")
    }

    /// Set the delay, an even number of nanoseconds in 0..=10.
    pub fn set_delay(&mut self, delay: impl Into<Time>) -> Result<(), InstrumentError> {
        const EXPECTED: &str = "an even number of ns in 0 ..= 10";
        let ns = whole_nanos("delay", delay.into(), EXPECTED)?;
        check_range("delay", ns as f64, 0.0, MAX_DELAY_NS, "ns")?;
        if ns % DELAY_STEP_NS as i64 != 0 {
            return Err(InstrumentError::InvalidRange {
                property: "delay",
                value: format!("{ns} ns"),
                expected: EXPECTED.to_string(),
            });
        }
        self.write(&format!(":DELA {ns}"))
    }

    /// Integration time per count update.
    ///
    /// Old firmware reports milliseconds, new firmware seconds.
    pub fn dwell_time(&mut self) -> Result<Time, InstrumentError> {
        let reply = self.query("DWEL?")?;
        let raw = parse_reply_number("DWEL?", &reply)?;
        Ok(Time::seconds(raw * self.table().dwell_reply_scale))
    }

    /// Set the dwell time. Written in seconds in both dialects.
    pub fn set_dwell_time(&mut self, dwell: impl Into<Time>) -> Result<(), InstrumentError> {
        let seconds = dwell.into().as_seconds();
        check_non_negative("dwell_time", seconds, "s")?;
        self.write(&format!(":DWEL {seconds}"))
    }
}
