use clap::Subcommand;
use serde_json::json;

use benchwire::config::AppConfig;
use benchwire::transport::{self, Transport};
use benchwire::{Cc1, Mhs5200, PropertyAccess, PropertyValue, Session};

#[derive(Subcommand, Debug)]
pub enum MhsCommand {
    /// Print the serial number
    Serial,
    /// Read a channel property (amplitude, duty_cycle, enable, frequency, offset, phase, wave_type)
    Get { channel: usize, property: String },
    /// Write a channel property, e.g. `set 0 amplitude 3.3V`
    Set {
        channel: usize,
        property: String,
        value: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum Cc1Command {
    /// Print the detected firmware version
    Firmware,
    /// Read a property (window, delay, dwell_time, gate, subtract, trigger_mode)
    Get { property: String },
    /// Write a property, e.g. `set window 4ns`
    Set { property: String, value: String },
    /// Read the counts on one input
    Count { channel: usize },
    /// Read the coincidence count
    Coincidences,
    /// Reset all counters
    Clear,
}

#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    fn value(&self, name: &str, value: &PropertyValue) -> Result<(), serde_json::Error> {
        if self.json {
            println!(
                "{}",
                serde_json::to_string(&json!({ "property": name, "value": value }))?
            );
        } else {
            println!("{name}: {value}");
        }
        Ok(())
    }

    fn done(&self, what: &str) {
        if self.json {
            println!("{}", json!({ "ok": what }));
        } else {
            println!("{what}: ok");
        }
    }
}

fn open_session(config: &AppConfig) -> Result<Session<Box<dyn Transport>>, Box<dyn std::error::Error>> {
    let transport = transport::open(&config.transport)?;
    let session = Session::new(transport).with_terminator(&config.session.terminator())?;
    Ok(session)
}

pub fn run_mhs5200(
    config: &AppConfig,
    command: MhsCommand,
    output: Output,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mhs = Mhs5200::from_session(open_session(config)?);

    match command {
        MhsCommand::Serial => {
            let value = mhs.get("serial_number")?;
            output.value("serial_number", &value)?;
        }
        MhsCommand::Get { channel, property } => {
            let value = mhs.channel(channel)?.get(&property)?;
            output.value(&property, &value)?;
        }
        MhsCommand::Set {
            channel,
            property,
            value,
        } => {
            mhs.channel(channel)?.set(&property, &value)?;
            output.done(&property);
        }
    }
    Ok(())
}

pub fn run_cc1(
    config: &AppConfig,
    command: Cc1Command,
    output: Output,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cc1 = Cc1::from_session(open_session(config)?)?;

    match command {
        Cc1Command::Firmware => {
            output.value("firmware", &PropertyValue::Firmware(cc1.firmware()))?;
        }
        Cc1Command::Get { property } => {
            let value = cc1.get(&property)?;
            output.value(&property, &value)?;
        }
        Cc1Command::Set { property, value } => {
            cc1.set(&property, &value)?;
            output.done(&property);
        }
        Cc1Command::Count { channel } => {
            let value = cc1.channel(channel)?.get("count")?;
            output.value("count", &value)?;
        }
        Cc1Command::Coincidences => {
            let value = cc1.get("coincidence_count")?;
            output.value("coincidence_count", &value)?;
        }
        Cc1Command::Clear => {
            cc1.clear_counts()?;
            output.done("clear");
        }
    }
    Ok(())
}
