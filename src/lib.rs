pub mod config;
pub mod error;
pub mod minghe;
pub mod property;
pub mod qubitekk;
pub mod session;
pub mod transport;
pub mod units;

pub use crate::config::{AppConfig, load_config, load_config_or_default};
pub use error::{ErrorKind, InstrumentError};
pub use minghe::{Mhs5200, WaveType};
pub use property::{PropertyAccess, PropertyValue};
pub use qubitekk::{Cc1, Dialect, FirmwareVersion, TriggerMode};
pub use session::Session;
pub use transport::{MockTransport, Transport};
pub use units::{Angle, Frequency, Quantity, Time, Voltage};
