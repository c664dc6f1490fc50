use super::{Mhs5200, WaveType};
use crate::error::InstrumentError;
use crate::property::{
    PropertyAccess, PropertyValue, check_non_negative, check_range, parse_bool,
    parse_reply_number,
};
use crate::transport::Transport;
use crate::units::{Angle, Frequency, Quantity, Time, Voltage};

/// Offset wire value that corresponds to 0 V.
const OFFSET_ZERO: f64 = 120.0;

const MAX_AMPLITUDE_V: f64 = 20.0;
const MAX_OFFSET_V: f64 = 1.2;
const MAX_FREQUENCY_HZ: f64 = 25e6;
const MAX_PHASE_DEG: f64 = 360.0;

const PROPERTY_NAMES: &[&str] = &[
    "amplitude",
    "duty_cycle",
    "enable",
    "frequency",
    "offset",
    "phase",
    "wave_type",
];

/// One-letter opcodes following the channel digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opcode {
    Amplitude,
    DutyCycle,
    Enable,
    Frequency,
    Offset,
    Phase,
    WaveType,
}

impl Opcode {
    fn letter(self) -> char {
        match self {
            Opcode::Amplitude => 'a',
            Opcode::DutyCycle => 'd',
            Opcode::Enable => 'b',
            Opcode::Frequency => 'f',
            Opcode::Offset => 'o',
            Opcode::Phase => 'p',
            Opcode::WaveType => 'w',
        }
    }
}

/// Round to the integer the device expects on the wire.
fn wire_int(value: f64) -> i64 {
    value.round() as i64
}

/// A view of one MHS5200 output channel.
///
/// Obtained from [`Mhs5200::channel`]; it borrows the instrument and holds
/// only the channel's wire digit, so creating one costs nothing.
pub struct Channel<'a, T: Transport> {
    mhs: &'a mut Mhs5200<T>,
    wire_id: char,
}

impl<'a, T: Transport> Channel<'a, T> {
    pub(super) fn new(mhs: &'a mut Mhs5200<T>, wire_id: char) -> Self {
        Self { mhs, wire_id }
    }

    /// The digit used for this channel on the wire (`'1'` or `'2'`).
    pub fn wire_id(&self) -> char {
        self.wire_id
    }

    fn read(&mut self, opcode: Opcode) -> Result<String, InstrumentError> {
        let command = format!(":r{}{}", self.wire_id, opcode.letter());
        self.mhs.query_value(&command)
    }

    fn read_number(&mut self, opcode: Opcode) -> Result<f64, InstrumentError> {
        let command = format!(":r{}{}", self.wire_id, opcode.letter());
        let body = self.mhs.query_value(&command)?;
        parse_reply_number(&command, &body)
    }

    fn write(&mut self, opcode: Opcode, value: impl std::fmt::Display) -> Result<(), InstrumentError> {
        let command = format!(":s{}{}{}", self.wire_id, opcode.letter(), value);
        self.mhs.write_value(&command)
    }

    // === Amplitude ===

    /// Peak-to-peak amplitude. The device reports hundredths of a volt.
    pub fn amplitude(&mut self) -> Result<Voltage, InstrumentError> {
        Ok(Voltage::volts(self.read_number(Opcode::Amplitude)? / 100.0))
    }

    /// Set the amplitude, 0 to 20 V.
    ///
    /// # Errors
    /// `InvalidRange` before anything is sent if the value is outside the
    /// device range; `UnexpectedReply` if the device does not answer `ok`.
    pub fn set_amplitude(&mut self, amplitude: impl Into<Voltage>) -> Result<(), InstrumentError> {
        let volts = amplitude.into().as_volts();
        check_range("amplitude", volts, 0.0, MAX_AMPLITUDE_V, "V")?;
        self.write(Opcode::Amplitude, wire_int(volts * 100.0))
    }

    // === Duty cycle ===

    /// Duty cycle, reported by the device as a raw integer and tagged as
    /// seconds without rescaling.
    pub fn duty_cycle(&mut self) -> Result<Time, InstrumentError> {
        Ok(Time::seconds(self.read_number(Opcode::DutyCycle)?))
    }

    pub fn set_duty_cycle(&mut self, duty_cycle: impl Into<Time>) -> Result<(), InstrumentError> {
        let seconds = duty_cycle.into().as_seconds();
        check_non_negative("duty_cycle", seconds, "s")?;
        self.write(Opcode::DutyCycle, wire_int(seconds))
    }

    // === Output enable ===

    pub fn enable(&mut self) -> Result<bool, InstrumentError> {
        let body = self.read(Opcode::Enable)?;
        match body.as_str() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(InstrumentError::Protocol(format!(
                "unexpected enable state {other:?} on channel {}",
                self.wire_id
            ))),
        }
    }

    /// Switch the output on or off.
    ///
    /// The write encoding is inverted: `0` enables and `1` disables.
    pub fn set_enable(&mut self, enable: bool) -> Result<(), InstrumentError> {
        self.write(Opcode::Enable, if enable { 0 } else { 1 })
    }

    // === Frequency ===

    /// Output frequency. The reply counts thousandths of a kilohertz.
    pub fn frequency(&mut self) -> Result<Frequency, InstrumentError> {
        Ok(Frequency::khz(self.read_number(Opcode::Frequency)? / 1000.0))
    }

    pub fn set_frequency(&mut self, frequency: impl Into<Frequency>) -> Result<(), InstrumentError> {
        let frequency = frequency.into();
        check_range("frequency", frequency.as_hz(), 0.0, MAX_FREQUENCY_HZ, "Hz")?;
        self.write(Opcode::Frequency, wire_int(frequency.as_khz() * 1000.0))
    }

    // === Offset ===

    /// DC offset. The wire value is centred on 120 in steps of 10 mV.
    pub fn offset(&mut self) -> Result<Voltage, InstrumentError> {
        let raw = self.read_number(Opcode::Offset)?;
        Ok(Voltage::volts((raw - OFFSET_ZERO) / 100.0))
    }

    pub fn set_offset(&mut self, offset: impl Into<Voltage>) -> Result<(), InstrumentError> {
        let volts = offset.into().as_volts();
        check_range("offset", volts, -MAX_OFFSET_V, MAX_OFFSET_V, "V")?;
        self.write(Opcode::Offset, wire_int(volts * 100.0 + OFFSET_ZERO))
    }

    // === Phase ===

    pub fn phase(&mut self) -> Result<Angle, InstrumentError> {
        Ok(Angle::degrees(self.read_number(Opcode::Phase)?))
    }

    pub fn set_phase(&mut self, phase: impl Into<Angle>) -> Result<(), InstrumentError> {
        let degrees = phase.into().as_degrees();
        check_range("phase", degrees, 0.0, MAX_PHASE_DEG, "deg")?;
        self.write(Opcode::Phase, wire_int(degrees))
    }

    // === Waveform ===

    pub fn wave_type(&mut self) -> Result<WaveType, InstrumentError> {
        let body = self.read(Opcode::WaveType)?;
        let code = body.parse::<u16>().map_err(|_| InstrumentError::InvalidEnumeration {
            kind: "wave type",
            value: body.clone(),
        })?;
        WaveType::from_code(code)
    }

    pub fn set_wave_type(&mut self, wave_type: WaveType) -> Result<(), InstrumentError> {
        let code = wave_type.code()?;
        self.write(Opcode::WaveType, code)
    }
}

impl<T: Transport> PropertyAccess for Channel<'_, T> {
    fn property_names(&self) -> &'static [&'static str] {
        PROPERTY_NAMES
    }

    fn get(&mut self, name: &str) -> Result<PropertyValue, InstrumentError> {
        match name {
            "amplitude" => self.amplitude().map(PropertyValue::Voltage),
            "duty_cycle" => self.duty_cycle().map(PropertyValue::Time),
            "enable" => self.enable().map(PropertyValue::Bool),
            "frequency" => self.frequency().map(PropertyValue::Frequency),
            "offset" => self.offset().map(PropertyValue::Voltage),
            "phase" => self.phase().map(PropertyValue::Angle),
            "wave_type" => self.wave_type().map(PropertyValue::WaveType),
            _ => Err(InstrumentError::UnknownProperty(name.to_string())),
        }
    }

    fn set(&mut self, name: &str, raw: &str) -> Result<(), InstrumentError> {
        match name {
            "amplitude" => self.set_amplitude(Voltage::parse_with_default(raw, "V")?),
            "duty_cycle" => self.set_duty_cycle(Time::parse_with_default(raw, "s")?),
            "enable" => self.set_enable(parse_bool(name, raw)?),
            "frequency" => self.set_frequency(Frequency::parse_with_default(raw, "kHz")?),
            "offset" => self.set_offset(Voltage::parse_with_default(raw, "V")?),
            "phase" => self.set_phase(Angle::parse_with_default(raw, "deg")?),
            "wave_type" => self.set_wave_type(raw.parse()?),
            _ => Err(InstrumentError::UnknownProperty(name.to_string())),
        }
    }
}
