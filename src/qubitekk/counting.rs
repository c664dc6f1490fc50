use log::info;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::Cc1;
use crate::error::InstrumentError;
use crate::transport::Transport;

/// How the CC1 starts and stops counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    Continuous,
    StartStop,
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerMode::Continuous => f.write_str("continuous"),
            TriggerMode::StartStop => f.write_str("start_stop"),
        }
    }
}

impl FromStr for TriggerMode {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continuous" | "cont" => Ok(TriggerMode::Continuous),
            "start_stop" | "stop" => Ok(TriggerMode::StartStop),
            _ => Err(InstrumentError::InvalidEnumeration {
                kind: "trigger mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Parse a counter reply. Counts are non-negative integers.
pub(super) fn parse_count(command: &str, body: &str) -> Result<u64, InstrumentError> {
    body.trim()
        .parse::<u64>()
        .map_err(|_| InstrumentError::Protocol(format!("invalid count reply to {command}: {body:?}")))
}

impl<T: Transport> Cc1<T> {
    /// Whether the gate input enables counting.
    pub fn gate(&mut self) -> Result<bool, InstrumentError> {
        let reply = self.query("GATE?")?;
        Ok(reply == self.table().gate_enabled_reply)
    }

    pub fn set_gate(&mut self, enabled: bool) -> Result<(), InstrumentError> {
        let table = self.table();
        self.write(if enabled { table.gate_on } else { table.gate_off })
    }

    /// Whether accidental coincidences are subtracted from the counts.
    pub fn subtract(&mut self) -> Result<bool, InstrumentError> {
        Ok(self.query("SUBT?")? == "ON")
    }

    /// Both dialects use the token form for this setting.
    pub fn set_subtract(&mut self, enabled: bool) -> Result<(), InstrumentError> {
        self.write(if enabled { ":SUBT:ON" } else { ":SUBT:OFF" })
    }

    pub fn trigger_mode(&mut self) -> Result<TriggerMode, InstrumentError> {
        let reply = self.query("TRIG?")?;
        if reply == self.table().trigger_start_stop_reply {
            Ok(TriggerMode::StartStop)
        } else {
            Ok(TriggerMode::Continuous)
        }
    }

    pub fn set_trigger_mode(&mut self, mode: TriggerMode) -> Result<(), InstrumentError> {
        let table = self.table();
        let command = match mode {
            TriggerMode::Continuous => table.trigger_continuous,
            TriggerMode::StartStop => table.trigger_start_stop,
        };
        self.write(command)
    }

    /// Coincidences between the two channels in the last dwell period.
    pub fn coincidence_count(&mut self) -> Result<u64, InstrumentError> {
        let reply = self.query("COUN:CO?")?;
        parse_count("COUN:CO?", &reply)
    }

    /// Reset all counters.
    pub fn clear_counts(&mut self) -> Result<(), InstrumentError> {
        self.write("CLEA")?;
        info!("CC1 counters cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cc1, written};
    use super::*;
    use crate::property::{PropertyAccess, PropertyValue};

    #[test]
    fn test_gate_new_firmware() {
        let mut cc = cc1(&[
            "FIRM?",
            "Firmware v2.010",
            "GATE?",
            "ON",
            ":GATE:ON",
            ":GATE:OFF",
        ]);
        assert!(cc.gate().unwrap());
        cc.set_gate(true).unwrap();
        cc.set_gate(false).unwrap();
        assert_eq!(written(&cc), vec!["FIRM?", "GATE?", ":GATE:ON", ":GATE:OFF"]);
    }

    #[test]
    fn test_gate_old_firmware() {
        let mut cc = cc1(&["Firmware v2.001", "1", "", ""]);
        assert!(cc.gate().unwrap());
        cc.set_gate(true).unwrap();
        cc.set_gate(false).unwrap();
        assert_eq!(written(&cc), vec!["FIRM?", "GATE?", ":GATE 1", ":GATE 0"]);
    }

    #[test]
    fn test_gate_old_firmware_reads_after_bare_writes() {
        let mut cc = cc1(&["Firmware v2.001", "", "0"]);
        cc.set_gate(true).unwrap();
        assert!(!cc.gate().unwrap());
    }

    #[test]
    fn test_gate_rejects_non_boolean() {
        for replies in [
            &["FIRM?", "Firmware v2.010"][..],
            &["Firmware v2.001"][..],
        ] {
            let mut cc = cc1(replies);
            assert!(matches!(cc.set("gate", "blo"), Err(InstrumentError::Type(_))));
            assert_eq!(written(&cc), vec!["FIRM?"]);
        }
    }

    #[test]
    fn test_subtract_new_firmware() {
        let mut cc = cc1(&[
            "FIRM?",
            "Firmware v2.010",
            "SUBT?",
            "ON",
            ":SUBT:ON",
            ":SUBT:OFF",
        ]);
        assert!(cc.subtract().unwrap());
        cc.set_subtract(true).unwrap();
        cc.set_subtract(false).unwrap();
        assert_eq!(written(&cc), vec!["FIRM?", "SUBT?", ":SUBT:ON", ":SUBT:OFF"]);
    }

    #[test]
    fn test_subtract_old_firmware_uses_tokens() {
        let mut cc = cc1(&["Firmware v2.001", "OFF"]);
        assert!(!cc.subtract().unwrap());
        cc.set_subtract(true).unwrap();
        assert_eq!(written(&cc), vec!["FIRM?", "SUBT?", ":SUBT:ON"]);
    }

    #[test]
    fn test_subtract_rejects_non_boolean() {
        for replies in [
            &["FIRM?", "Firmware v2.010"][..],
            &["Firmware v2.001"][..],
        ] {
            let mut cc = cc1(replies);
            assert!(matches!(cc.set("subtract", "blo"), Err(InstrumentError::Type(_))));
            assert_eq!(written(&cc), vec!["FIRM?"]);
        }
    }

    #[test]
    fn test_trigger_mode_new_firmware() {
        let mut cc = cc1(&[
            "FIRM?",
            "Firmware v2.010",
            "TRIG?",
            "MODE STOP",
            ":TRIG:MODE CONT",
            ":TRIG:MODE STOP",
        ]);
        assert_eq!(cc.trigger_mode().unwrap(), TriggerMode::StartStop);
        cc.set_trigger_mode(TriggerMode::Continuous).unwrap();
        cc.set_trigger_mode(TriggerMode::StartStop).unwrap();
        assert_eq!(
            written(&cc),
            vec!["FIRM?", "TRIG?", ":TRIG:MODE CONT", ":TRIG:MODE STOP"]
        );
    }

    #[test]
    fn test_trigger_mode_old_firmware() {
        let mut cc = cc1(&["Firmware v2.001", "1", "", ""]);
        assert_eq!(cc.trigger_mode().unwrap(), TriggerMode::StartStop);
        cc.set_trigger_mode(TriggerMode::Continuous).unwrap();
        cc.set_trigger_mode(TriggerMode::StartStop).unwrap();
        assert_eq!(written(&cc), vec!["FIRM?", "TRIG?", ":TRIG 0", ":TRIG 1"]);
    }

    #[test]
    fn test_trigger_mode_rejects_unknown_name() {
        let mut cc = cc1(&["FIRM?", "Firmware v2.010"]);
        let err = cc.set("trigger_mode", "blo").unwrap_err();
        assert!(matches!(
            err,
            InstrumentError::InvalidEnumeration { kind: "trigger mode", .. }
        ));
        assert_eq!(written(&cc), vec!["FIRM?"]);
    }

    #[test]
    fn test_trigger_mode_names() {
        assert_eq!("start_stop".parse::<TriggerMode>().unwrap(), TriggerMode::StartStop);
        assert_eq!("CONT".parse::<TriggerMode>().unwrap(), TriggerMode::Continuous);
        assert_eq!(TriggerMode::Continuous.to_string(), "continuous");
    }

    #[test]
    fn test_clear() {
        let mut cc = cc1(&["FIRM?", "Firmware v2.010", "CLEA"]);
        cc.clear_counts().unwrap();
        assert_eq!(written(&cc), vec!["FIRM?", "CLEA"]);
    }

    #[test]
    fn test_coincidence_count() {
        let mut cc = cc1(&["FIRM?", "Firmware v2.010", "COUN:CO?", "7"]);
        assert_eq!(
            cc.get("coincidence_count").unwrap(),
            PropertyValue::Count(7)
        );
        assert_eq!(written(&cc), vec!["FIRM?", "COUN:CO?"]);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("COUN:C1?", " 20 ").unwrap(), 20);
        assert!(matches!(
            parse_count("COUN:C1?", "-3"),
            Err(InstrumentError::Protocol(_))
        ));
    }
}
