//! Per-dialect command tables.
//!
//! Anything that differs between old and new firmware lives in one
//! [`DialectTable`]; accessors look their wire tokens up here instead of
//! branching on the firmware themselves.

use super::firmware::Dialect;

#[derive(Debug)]
pub(super) struct DialectTable {
    /// The unit echoes each command line before answering.
    pub echoes_commands: bool,
    pub gate_on: &'static str,
    pub gate_off: &'static str,
    /// `GATE?` reply meaning "gate enabled".
    pub gate_enabled_reply: &'static str,
    pub trigger_continuous: &'static str,
    pub trigger_start_stop: &'static str,
    /// `TRIG?` reply meaning start/stop mode.
    pub trigger_start_stop_reply: &'static str,
    /// Seconds per unit in the `DWEL?` reply.
    pub dwell_reply_scale: f64,
}

static OLD: DialectTable = DialectTable {
    echoes_commands: false,
    gate_on: ":GATE 1",
    gate_off: ":GATE 0",
    gate_enabled_reply: "1",
    trigger_continuous: ":TRIG 0",
    trigger_start_stop: ":TRIG 1",
    trigger_start_stop_reply: "1",
    dwell_reply_scale: 1e-3,
};

static NEW: DialectTable = DialectTable {
    echoes_commands: true,
    gate_on: ":GATE:ON",
    gate_off: ":GATE:OFF",
    gate_enabled_reply: "ON",
    trigger_continuous: ":TRIG:MODE CONT",
    trigger_start_stop: ":TRIG:MODE STOP",
    trigger_start_stop_reply: "MODE STOP",
    dwell_reply_scale: 1.0,
};

impl Dialect {
    pub(super) fn table(self) -> &'static DialectTable {
        match self {
            Dialect::Old => &OLD,
            Dialect::New => &NEW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_differ_where_expected() {
        let old = Dialect::Old.table();
        let new = Dialect::New.table();
        assert!(!old.echoes_commands);
        assert!(new.echoes_commands);
        assert_eq!(old.gate_on, ":GATE 1");
        assert_eq!(new.gate_on, ":GATE:ON");
        assert_eq!(old.dwell_reply_scale, 1e-3);
        assert_eq!(new.dwell_reply_scale, 1.0);
    }
}
