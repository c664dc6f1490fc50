//! Qubitekk CC1 coincidence counter.
//!
//! The CC1 speaks two command dialects. Which one applies is decided by the
//! firmware banner (`FIRM?`), read once when the driver is constructed:
//! firmware 2.10 and later uses token commands (`:GATE:ON`) and echoes every
//! command line, older firmware uses numeric flags (`:GATE 1`) and does not
//! echo.

use log::debug;

use crate::error::InstrumentError;
use crate::property::{PropertyAccess, PropertyValue, parse_bool};
use crate::session::Session;
use crate::transport::Transport;
use crate::units::{Quantity, Time};

mod channel;
mod counting;
mod dialect;
mod firmware;
mod timing;

pub use channel::Channel;
pub use counting::TriggerMode;
pub use firmware::{Dialect, FirmwareVersion, MAX_FIRMWARE_ATTEMPTS};

use dialect::DialectTable;

/// Number of counting channels.
pub const CHANNEL_COUNT: usize = 2;

const PROPERTY_NAMES: &[&str] = &[
    "firmware",
    "window",
    "delay",
    "dwell_time",
    "gate",
    "subtract",
    "trigger_mode",
    "coincidence_count",
];

/// Wire name of one counting channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChannelAddress {
    counter: &'static str,
}

/// Driver for the Qubitekk CC1.
///
/// # Examples
///
/// ```
/// use benchwire::{Cc1, FirmwareVersion, MockTransport};
///
/// let mock = MockTransport::new(&["FIRM?", "Firmware v2.010", "COUN:C1?", "20"]);
/// let mut cc1 = Cc1::new(mock)?;
/// assert_eq!(cc1.firmware(), FirmwareVersion::new(2, 10, 0));
/// assert_eq!(cc1.channel(0)?.count()?, 20);
/// # Ok::<(), benchwire::InstrumentError>(())
/// ```
pub struct Cc1<T: Transport> {
    session: Session<T>,
    firmware: FirmwareVersion,
    dialect: Dialect,
    channels: [ChannelAddress; CHANNEL_COUNT],
}

impl<T: Transport> Cc1<T> {
    /// Connect over `transport` with the default terminator and detect the
    /// firmware.
    ///
    /// # Errors
    /// `FirmwareNotDetected` if no valid banner arrives within
    /// [`MAX_FIRMWARE_ATTEMPTS`] queries, or any communication error.
    pub fn new(transport: T) -> Result<Self, InstrumentError> {
        Self::from_session(Session::new(transport))
    }

    pub fn from_session(mut session: Session<T>) -> Result<Self, InstrumentError> {
        let firmware = firmware::detect(&mut session)?;
        Ok(Self {
            session,
            firmware,
            dialect: firmware.dialect(),
            channels: [
                ChannelAddress { counter: "C1" },
                ChannelAddress { counter: "C2" },
            ],
        })
    }

    /// Firmware version read at construction.
    pub fn firmware(&self) -> FirmwareVersion {
        self.firmware
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// View of counting channel `idx` (0-based).
    pub fn channel(&mut self, idx: usize) -> Result<Channel<'_, T>, InstrumentError> {
        let address = *self
            .channels
            .get(idx)
            .ok_or(InstrumentError::ChannelOutOfRange {
                idx,
                count: CHANNEL_COUNT,
            })?;
        Ok(Channel::new(self, address.counter))
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    pub fn into_session(self) -> Session<T> {
        self.session
    }

    fn table(&self) -> &'static DialectTable {
        self.dialect.table()
    }

    /// Send a query and return the answer.
    ///
    /// Blank lines left over from earlier bare writes and the echo of the
    /// query itself are skipped.
    fn query(&mut self, command: &str) -> Result<String, InstrumentError> {
        self.session.send_command(command)?;
        let mut echo_pending = self.table().echoes_commands;
        loop {
            let line = self.session.read_line()?;
            if line.is_empty() {
                continue;
            }
            if echo_pending && line == command {
                echo_pending = false;
                continue;
            }
            return Ok(line);
        }
    }

    /// Send a setting. Nothing is read back except the echo on firmware
    /// that produces one.
    fn write(&mut self, command: &str) -> Result<(), InstrumentError> {
        self.session.send_command(command)?;
        if !self.table().echoes_commands {
            return Ok(());
        }

        let echo = loop {
            let line = self.session.read_line()?;
            if !line.is_empty() {
                break line;
            }
        };
        if echo != command {
            return Err(InstrumentError::UnexpectedReply {
                command: command.to_string(),
                expected: command.to_string(),
                actual: echo,
            });
        }
        debug!("CC1 echoed {command}");
        Ok(())
    }
}

impl<T: Transport> PropertyAccess for Cc1<T> {
    fn property_names(&self) -> &'static [&'static str] {
        PROPERTY_NAMES
    }

    fn get(&mut self, name: &str) -> Result<PropertyValue, InstrumentError> {
        match name {
            "firmware" => Ok(PropertyValue::Firmware(self.firmware)),
            "window" => self.window().map(PropertyValue::Time),
            "delay" => self.delay().map(PropertyValue::Time),
            "dwell_time" => self.dwell_time().map(PropertyValue::Time),
            "gate" => self.gate().map(PropertyValue::Bool),
            "subtract" => self.subtract().map(PropertyValue::Bool),
            "trigger_mode" => self.trigger_mode().map(PropertyValue::TriggerMode),
            "coincidence_count" => self.coincidence_count().map(PropertyValue::Count),
            _ => Err(InstrumentError::UnknownProperty(name.to_string())),
        }
    }

    fn set(&mut self, name: &str, raw: &str) -> Result<(), InstrumentError> {
        match name {
            "window" => self.set_window(Time::parse_with_default(raw, "ns")?),
            "delay" => self.set_delay(Time::parse_with_default(raw, "ns")?),
            "dwell_time" => self.set_dwell_time(Time::parse_with_default(raw, "s")?),
            "gate" => self.set_gate(parse_bool(name, raw)?),
            "subtract" => self.set_subtract(parse_bool(name, raw)?),
            "trigger_mode" => self.set_trigger_mode(raw.parse()?),
            "firmware" | "coincidence_count" => Err(InstrumentError::ReadOnly(name.to_string())),
            _ => Err(InstrumentError::UnknownProperty(name.to_string())),
        }
    }
}
