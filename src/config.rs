use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::session::DEFAULT_TERMINATOR;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    pub transport: TransportConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    Serial {
        port: String,
        baud_rate: u32,
        timeout_ms: u64,
    },
    Tcp {
        address: String,
        connect_timeout_ms: u64,
        read_timeout_ms: u64,
        write_timeout_ms: u64,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Line terminator; `\n` and `\r` escapes are accepted so the value can
    /// also be given through an environment variable.
    pub terminator: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Serial {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 57600,
            timeout_ms: 1000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            terminator: DEFAULT_TERMINATOR.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl SessionConfig {
    /// The terminator with `\n`, `\r` and `\t` escapes expanded.
    pub fn terminator(&self) -> String {
        self.terminator
            .replace("\\r", "\r")
            .replace("\\n", "\n")
            .replace("\\t", "\t")
    }
}

impl AppConfig {
    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.transport {
            TransportConfig::Serial {
                port, baud_rate, ..
            } => {
                if port.trim().is_empty() {
                    return Err(ConfigError::Message("transport.port is empty".into()));
                }
                if *baud_rate == 0 {
                    return Err(ConfigError::Message(
                        "transport.baud_rate must be non-zero".into(),
                    ));
                }
            }
            TransportConfig::Tcp { address, .. } => {
                if address.trim().is_empty() {
                    return Err(ConfigError::Message("transport.address is empty".into()));
                }
            }
        }

        if self.session.terminator().is_empty() {
            return Err(ConfigError::Message("session.terminator is empty".into()));
        }

        Ok(())
    }
}

/// Load configuration from file with layered fallbacks
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

    if let Some(path) = config_path {
        if path.exists() {
            builder = builder.add_source(File::from(path));
        } else {
            return Err(ConfigError::Message(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    } else {
        let possible_paths = ["benchwire.toml", "base_config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
                break;
            }
        }
    }

    // Environment overrides, e.g. BENCHWIRE_TRANSPORT__PORT=/dev/ttyACM0
    builder = builder.add_source(
        Environment::with_prefix("BENCHWIRE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration with better error handling and defaults
pub fn load_config_or_default(config_path: Option<&Path>) -> AppConfig {
    match load_config(config_path) {
        Ok(config) => {
            log::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            log::warn!("Failed to load config ({}), using defaults", e);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.terminator(), "\n");
    }

    #[test]
    fn test_load_tcp_transport_from_file() {
        let file = write_config(
            r#"
            [transport]
            type = "tcp"
            address = "192.168.1.40:4001"
            connect_timeout_ms = 3000
            read_timeout_ms = 800
            write_timeout_ms = 800

            [logging]
            log_level = "debug"
            "#,
        );

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(
            config.transport,
            TransportConfig::Tcp {
                address: "192.168.1.40:4001".to_string(),
                connect_timeout_ms: 3000,
                read_timeout_ms: 800,
                write_timeout_ms: 800,
            }
        );
        assert_eq!(config.logging.log_level, "debug");
        assert_eq!(config.session.terminator(), "\n");
    }

    #[test]
    fn test_escaped_terminator() {
        let file = write_config(
            r#"
            [session]
            terminator = '\r\n'
            "#,
        );
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.session.terminator(), "\r\n");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/benchwire.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_baud_rate_rejected() {
        let file = write_config(
            r#"
            [transport]
            type = "serial"
            port = "/dev/ttyUSB1"
            baud_rate = 0
            timeout_ms = 500
            "#,
        );
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_or_default_falls_back() {
        let config = load_config_or_default(Some(Path::new("/nonexistent/benchwire.toml")));
        assert_eq!(config.transport, TransportConfig::default());
    }
}
