//! MingHe MHS5200 dual-channel function generator.
//!
//! Commands address a channel by a 1-based digit and a one-letter opcode:
//! `:r1a` reads channel 1 amplitude, `:s2f8000` sets channel 2 frequency.
//! Query replies echo the command (`:r1a330`) and every write is answered
//! with `ok`.

use log::debug;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::InstrumentError;
use crate::property::{PropertyAccess, PropertyValue};
use crate::session::Session;
use crate::transport::Transport;

mod channel;

pub use channel::Channel;

/// Number of output channels.
pub const CHANNEL_COUNT: usize = 2;

/// Acknowledgement sent after every accepted write.
const ACK: &str = "ok";

/// Highest arbitrary-waveform slot.
const MAX_ARBITRARY_SLOT: u8 = 15;

/// Waveform codes 100..=115 select arbitrary slots 0..=15.
const ARBITRARY_BASE: u16 = 100;

/// Output waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveType {
    Sine,
    Square,
    Triangular,
    SawtoothUp,
    SawtoothDown,
    /// User-defined waveform stored in slot 0..=15.
    Arbitrary(u8),
}

impl WaveType {
    /// Wire code used after the `w` opcode.
    pub fn code(self) -> Result<u16, InstrumentError> {
        match self {
            WaveType::Sine => Ok(0),
            WaveType::Square => Ok(1),
            WaveType::Triangular => Ok(2),
            WaveType::SawtoothUp => Ok(3),
            WaveType::SawtoothDown => Ok(4),
            WaveType::Arbitrary(slot) if slot <= MAX_ARBITRARY_SLOT => {
                Ok(ARBITRARY_BASE + u16::from(slot))
            }
            WaveType::Arbitrary(slot) => Err(InstrumentError::InvalidEnumeration {
                kind: "wave type",
                value: format!("arbitrary{slot}"),
            }),
        }
    }

    pub fn from_code(code: u16) -> Result<Self, InstrumentError> {
        match code {
            0 => Ok(WaveType::Sine),
            1 => Ok(WaveType::Square),
            2 => Ok(WaveType::Triangular),
            3 => Ok(WaveType::SawtoothUp),
            4 => Ok(WaveType::SawtoothDown),
            c if (ARBITRARY_BASE..=ARBITRARY_BASE + u16::from(MAX_ARBITRARY_SLOT)).contains(&c) => {
                Ok(WaveType::Arbitrary((c - ARBITRARY_BASE) as u8))
            }
            c => Err(InstrumentError::InvalidEnumeration {
                kind: "wave type",
                value: c.to_string(),
            }),
        }
    }
}

impl fmt::Display for WaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveType::Sine => f.write_str("sine"),
            WaveType::Square => f.write_str("square"),
            WaveType::Triangular => f.write_str("triangular"),
            WaveType::SawtoothUp => f.write_str("sawtooth_up"),
            WaveType::SawtoothDown => f.write_str("sawtooth_down"),
            WaveType::Arbitrary(slot) => write!(f, "arbitrary{slot}"),
        }
    }
}

impl FromStr for WaveType {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        let wave = match name.as_str() {
            "sine" => WaveType::Sine,
            "square" => WaveType::Square,
            "triangular" => WaveType::Triangular,
            "sawtooth_up" => WaveType::SawtoothUp,
            "sawtooth_down" => WaveType::SawtoothDown,
            other => other
                .strip_prefix("arbitrary")
                .and_then(|slot| slot.parse::<u8>().ok())
                .filter(|slot| *slot <= MAX_ARBITRARY_SLOT)
                .map(WaveType::Arbitrary)
                .ok_or_else(|| InstrumentError::InvalidEnumeration {
                    kind: "wave type",
                    value: s.to_string(),
                })?,
        };
        Ok(wave)
    }
}

/// Wire address of one output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChannelAddress {
    wire_id: char,
}

/// Driver for the MHS5200 signal generator.
///
/// The instrument itself only carries the serial number; everything else
/// lives on the two output channels, reached through [`Mhs5200::channel`].
///
/// # Examples
///
/// ```
/// use benchwire::{MockTransport, Mhs5200, Voltage};
///
/// let mut mhs = Mhs5200::new(MockTransport::new(&[":r1a330", "ok"]));
/// assert_eq!(mhs.channel(0)?.amplitude()?, Voltage::volts(3.3));
/// mhs.channel(0)?.set_amplitude(Voltage::volts(6.6))?;
/// assert_eq!(mhs.session().get_ref().written_lines(), vec![":r1a", ":s1a660"]);
/// # Ok::<(), benchwire::InstrumentError>(())
/// ```
pub struct Mhs5200<T: Transport> {
    session: Session<T>,
    channels: [ChannelAddress; CHANNEL_COUNT],
}

impl<T: Transport> Mhs5200<T> {
    /// Wrap a transport using the default `"\n"` terminator. No bytes are
    /// exchanged until the first property access.
    pub fn new(transport: T) -> Self {
        Self::from_session(Session::new(transport))
    }

    /// Use an already configured session, e.g. one with another terminator.
    pub fn from_session(session: Session<T>) -> Self {
        Self {
            session,
            channels: [
                ChannelAddress { wire_id: '1' },
                ChannelAddress { wire_id: '2' },
            ],
        }
    }

    /// View of output channel `idx` (0-based).
    pub fn channel(&mut self, idx: usize) -> Result<Channel<'_, T>, InstrumentError> {
        let address = *self
            .channels
            .get(idx)
            .ok_or(InstrumentError::ChannelOutOfRange {
                idx,
                count: CHANNEL_COUNT,
            })?;
        Ok(Channel::new(self, address.wire_id))
    }

    /// Read the serial number reported by `:r0c`.
    pub fn serial_number(&mut self) -> Result<String, InstrumentError> {
        self.query_value(":r0c")
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

    /// Send a read command and return the reply with the command echo removed.
    fn query_value(&mut self, command: &str) -> Result<String, InstrumentError> {
        let reply = self.session.send_query(command)?;
        match reply.strip_prefix(command) {
            Some(value) => Ok(value.trim().to_string()),
            None => Err(InstrumentError::UnexpectedReply {
                command: command.to_string(),
                expected: format!("{command}<value>"),
                actual: reply,
            }),
        }
    }

    /// Send a write command and check the `ok` acknowledgement.
    fn write_value(&mut self, command: &str) -> Result<(), InstrumentError> {
        let reply = self.session.send_query(command)?;
        if reply != ACK {
            return Err(InstrumentError::UnexpectedReply {
                command: command.to_string(),
                expected: ACK.to_string(),
                actual: reply,
            });
        }
        debug!("MHS5200 accepted {command}");
        Ok(())
    }
}

impl<T: Transport> PropertyAccess for Mhs5200<T> {
    fn property_names(&self) -> &'static [&'static str] {
        &["serial_number"]
    }

    fn get(&mut self, name: &str) -> Result<PropertyValue, InstrumentError> {
        match name {
            "serial_number" => Ok(PropertyValue::Text(self.serial_number()?)),
            _ => Err(InstrumentError::UnknownProperty(name.to_string())),
        }
    }

    fn set(&mut self, name: &str, _raw: &str) -> Result<(), InstrumentError> {
        match name {
            "serial_number" => Err(InstrumentError::ReadOnly(name.to_string())),
            _ => Err(InstrumentError::UnknownProperty(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn test_serial_number() {
        let mut mhs = Mhs5200::new(MockTransport::new(&[":r0c5225A1"]));
        assert_eq!(mhs.serial_number().unwrap(), "5225A1");
        assert_eq!(mhs.session().get_ref().written_lines(), vec![":r0c"]);
    }

    #[test]
    fn test_reply_without_echo_is_rejected() {
        let mut mhs = Mhs5200::new(MockTransport::new(&["5225A1"]));
        let err = mhs.serial_number().unwrap_err();
        assert!(matches!(err, InstrumentError::UnexpectedReply { .. }));
    }

    #[test]
    fn test_channel_index_out_of_range() {
        let mut mhs = Mhs5200::new(MockTransport::new(&[]));
        assert!(matches!(
            mhs.channel(2),
            Err(InstrumentError::ChannelOutOfRange { idx: 2, count: 2 })
        ));
        assert!(mhs.session().get_ref().written_lines().is_empty());
    }

    #[test]
    fn test_wave_type_codes() {
        for (code, wave) in [
            (0, WaveType::Sine),
            (1, WaveType::Square),
            (2, WaveType::Triangular),
            (3, WaveType::SawtoothUp),
            (4, WaveType::SawtoothDown),
            (100, WaveType::Arbitrary(0)),
            (115, WaveType::Arbitrary(15)),
        ] {
            assert_eq!(WaveType::from_code(code).unwrap(), wave);
            assert_eq!(wave.code().unwrap(), code);
        }
        assert!(WaveType::from_code(5).is_err());
        assert!(WaveType::from_code(116).is_err());
        assert!(WaveType::Arbitrary(16).code().is_err());
    }

    #[test]
    fn test_wave_type_names() {
        assert_eq!("sawtooth_up".parse::<WaveType>().unwrap(), WaveType::SawtoothUp);
        assert_eq!("Arbitrary3".parse::<WaveType>().unwrap(), WaveType::Arbitrary(3));
        assert_eq!(WaveType::SawtoothDown.to_string(), "sawtooth_down");

        let err = "blo".parse::<WaveType>().unwrap_err();
        assert!(matches!(
            err,
            InstrumentError::InvalidEnumeration { kind: "wave type", .. }
        ));
    }

    #[test]
    fn test_named_serial_number_is_read_only() {
        let mut mhs = Mhs5200::new(MockTransport::new(&[":r0c5225A1"]));
        assert_eq!(
            mhs.get("serial_number").unwrap(),
            PropertyValue::Text("5225A1".to_string())
        );
        assert!(matches!(
            mhs.set("serial_number", "x"),
            Err(InstrumentError::ReadOnly(_))
        ));
        assert!(matches!(
            mhs.get("colour"),
            Err(InstrumentError::UnknownProperty(_))
        ));
    }
}
