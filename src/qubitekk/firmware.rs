use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;

use crate::error::InstrumentError;
use crate::session::Session;
use crate::transport::Transport;

/// Firmware banner query.
const FIRMWARE_QUERY: &str = "FIRM?";

/// Every valid banner starts with this token.
const BANNER_PREFIX: &str = "Firmware v";

/// Banner queries sent before giving up.
pub const MAX_FIRMWARE_ATTEMPTS: usize = 5;

/// Version reported by the CC1 firmware banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FirmwareVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FirmwareVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a banner such as `Firmware v2.010.1`.
    ///
    /// Missing minor and patch numbers default to 0. Components are decimal,
    /// so `010` reads as 10. Returns `None` for anything else.
    pub fn parse_banner(banner: &str) -> Option<Self> {
        let digits = banner.trim().strip_prefix(BANNER_PREFIX)?;
        let mut parts = [0u32; 3];
        let mut count = 0;
        for part in digits.split('.') {
            if count == parts.len() {
                return None;
            }
            parts[count] = part.trim().parse().ok()?;
            count += 1;
        }
        Some(Self::new(parts[0], parts[1], parts[2]))
    }

    /// Command dialect spoken by this firmware.
    pub fn dialect(&self) -> Dialect {
        if (self.major, self.minor) >= (2, 10) {
            Dialect::New
        } else {
            Dialect::Old
        }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<(u32, u32, u32)> for FirmwareVersion {
    fn from((major, minor, patch): (u32, u32, u32)) -> Self {
        Self::new(major, minor, patch)
    }
}

/// CC1 command vocabulary, selected by firmware version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Before 2.10: numeric flags, dwell in milliseconds, no command echo.
    Old,
    /// 2.10 and later: token commands and every command line echoed.
    New,
}

/// Ask for the firmware banner until one parses.
///
/// Blank lines and an echo of the query are skipped. A reply that is not a
/// banner (units often send junk right after power-up) triggers another
/// query, up to [`MAX_FIRMWARE_ATTEMPTS`] in total.
pub(super) fn detect<T: Transport>(
    session: &mut Session<T>,
) -> Result<FirmwareVersion, InstrumentError> {
    for attempt in 1..=MAX_FIRMWARE_ATTEMPTS {
        session.send_command(FIRMWARE_QUERY)?;
        let reply = read_banner_line(session)?;

        if let Some(version) = FirmwareVersion::parse_banner(&reply) {
            info!(
                "CC1 firmware {} detected ({:?} dialect)",
                version,
                version.dialect()
            );
            return Ok(version);
        }

        warn!(
            "Unrecognized firmware banner {:?} (attempt {}/{})",
            reply, attempt, MAX_FIRMWARE_ATTEMPTS
        );
    }

    Err(InstrumentError::FirmwareNotDetected {
        attempts: MAX_FIRMWARE_ATTEMPTS,
    })
}

fn read_banner_line<T: Transport>(session: &mut Session<T>) -> Result<String, InstrumentError> {
    loop {
        let line = session.read_line()?;
        if line.is_empty() {
            continue;
        }
        if line == FIRMWARE_QUERY {
            debug!("Skipping firmware query echo");
            continue;
        }
        return Ok(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn test_parse_banner() {
        assert_eq!(
            FirmwareVersion::parse_banner("Firmware v2.010"),
            Some(FirmwareVersion::new(2, 10, 0))
        );
        assert_eq!(
            FirmwareVersion::parse_banner("Firmware v2"),
            Some(FirmwareVersion::new(2, 0, 0))
        );
        assert_eq!(
            FirmwareVersion::parse_banner("Firmware v2.010.1"),
            Some(FirmwareVersion::new(2, 10, 1))
        );
        assert_eq!(
            FirmwareVersion::parse_banner("Firmware v2.001"),
            Some(FirmwareVersion::new(2, 1, 0))
        );
    }

    #[test]
    fn test_parse_banner_rejects_garbage() {
        assert_eq!(FirmwareVersion::parse_banner("Unknown"), None);
        assert_eq!(FirmwareVersion::parse_banner("Firmware v"), None);
        assert_eq!(FirmwareVersion::parse_banner("Firmware v2.x"), None);
        assert_eq!(FirmwareVersion::parse_banner("Firmware v1.2.3.4"), None);
    }

    #[test]
    fn test_dialect_boundary() {
        assert_eq!(FirmwareVersion::new(2, 10, 0).dialect(), Dialect::New);
        assert_eq!(FirmwareVersion::new(3, 0, 0).dialect(), Dialect::New);
        assert_eq!(FirmwareVersion::new(2, 9, 99).dialect(), Dialect::Old);
        assert_eq!(FirmwareVersion::new(2, 0, 0).dialect(), Dialect::Old);
    }

    #[test]
    fn test_display() {
        assert_eq!(FirmwareVersion::new(2, 10, 1).to_string(), "2.10.1");
    }

    #[test]
    fn test_detect_retries_after_garbage() {
        let mut session = Session::new(MockTransport::new(&[
            "FIRM?",
            "Unknown",
            "FIRM?",
            "Firmware v2.010",
        ]));
        assert_eq!(detect(&mut session).unwrap(), FirmwareVersion::new(2, 10, 0));
        assert_eq!(session.get_ref().written_lines(), vec!["FIRM?", "FIRM?"]);
    }

    #[test]
    fn test_detect_gives_up() {
        let replies = ["Unknown"; MAX_FIRMWARE_ATTEMPTS];
        let mut session = Session::new(MockTransport::new(&replies));
        let err = detect(&mut session).unwrap_err();
        assert!(matches!(
            err,
            InstrumentError::FirmwareNotDetected {
                attempts: MAX_FIRMWARE_ATTEMPTS
            }
        ));
        assert!(err.is_communication());
        assert_eq!(
            session.get_ref().written_lines().len(),
            MAX_FIRMWARE_ATTEMPTS
        );
    }

    #[test]
    fn test_detect_without_reply_is_communication_error() {
        let mut session = Session::new(MockTransport::new(&[]));
        let err = detect(&mut session).unwrap_err();
        assert!(matches!(err, InstrumentError::ConnectionClosed));
    }
}
