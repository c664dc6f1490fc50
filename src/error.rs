use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("Connection timeout")]
    Timeout,
    #[error("Connection closed by instrument")]
    ConnectionClosed,
    #[error("Firmware not detected after {attempts} attempts")]
    FirmwareNotDetected { attempts: usize },
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Unexpected reply to {command}: expected {expected:?}, got {actual:?}")]
    UnexpectedReply {
        command: String,
        expected: String,
        actual: String,
    },
    #[error("Invalid {property} value {value}: expected {expected}")]
    InvalidRange {
        property: &'static str,
        value: String,
        expected: String,
    },
    #[error("Invalid {kind}: {value:?}")]
    InvalidEnumeration { kind: &'static str, value: String },
    #[error("Type error: {0}")]
    Type(String),
    #[error("Unknown property: {0}")]
    UnknownProperty(String),
    #[error("Property {0} is read-only")]
    ReadOnly(String),
    #[error("Channel index {idx} out of range (instrument has {count} channels)")]
    ChannelOutOfRange { idx: usize, count: usize },
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Coarse classification of [`InstrumentError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failures, timeouts and an undetectable firmware banner.
    Communication,
    /// The device answered with something the protocol does not allow.
    Protocol,
    /// A caller-supplied numeric value outside the accepted domain.
    InvalidRange,
    /// An unrecognized mode or type token, from the caller or the device.
    InvalidEnumeration,
    /// A value of the wrong type for the property.
    Type,
    /// Misuse of the API surface (unknown names, read-only properties, config).
    Usage,
}

impl InstrumentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InstrumentError::Io(_)
            | InstrumentError::Timeout
            | InstrumentError::ConnectionClosed
            | InstrumentError::FirmwareNotDetected { .. } => ErrorKind::Communication,
            #[cfg(feature = "serial")]
            InstrumentError::Serial(_) => ErrorKind::Communication,
            InstrumentError::Protocol(_) | InstrumentError::UnexpectedReply { .. } => {
                ErrorKind::Protocol
            }
            InstrumentError::InvalidRange { .. } => ErrorKind::InvalidRange,
            InstrumentError::InvalidEnumeration { .. } => ErrorKind::InvalidEnumeration,
            InstrumentError::Type(_) => ErrorKind::Type,
            InstrumentError::UnknownProperty(_)
            | InstrumentError::ReadOnly(_)
            | InstrumentError::ChannelOutOfRange { .. }
            | InstrumentError::Config(_) => ErrorKind::Usage,
        }
    }

    pub fn is_communication(&self) -> bool {
        self.kind() == ErrorKind::Communication
    }
}
