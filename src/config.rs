//! Configuration management for the MikroTik exporter.
//!
//! Supports loading configuration from:
//! - TOML configuration files
//! - Environment variables (with `MIKROTIK_EXPORTER_` prefix)
//! - Command-line arguments

use crate::error::{ExporterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Connection settings for one RouterOS device.
#[derive(Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device name, exported as the `name` label
    pub name: String,

    /// REST API base URL (e.g., "https://192.168.88.1"), exported as the `address` label
    pub address: String,

    /// API user
    #[serde(default)]
    pub username: String,

    /// API password
    #[serde(default)]
    pub password: String,

    /// Verify TLS certificates (RouterOS ships self-signed certs)
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
}

impl std::fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"***REDACTED***")
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

/// Exporter specific settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExporterConfig {
    /// Address to listen on for metrics endpoint
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Per-request timeout against devices, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Collectors to enable (empty = every registered collector)
    #[serde(default)]
    pub collectors: Vec<String>,
}

impl ExporterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            log_level: default_log_level(),
            timeout_seconds: default_timeout(),
            collectors: Vec::new(),
        }
    }
}

/// Main configuration structure for the exporter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Exporter server configuration
    #[serde(default)]
    pub exporter: ExporterConfig,

    /// Devices to poll on every scrape
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

fn default_verify_tls() -> bool {
    false
}

fn default_timeout() -> u64 {
    10
}

fn default_listen_address() -> String {
    "0.0.0.0:9436".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn invalid(message: impl Into<String>) -> ExporterError {
    ExporterError::Config(config::ConfigError::Message(message.into()))
}

impl Settings {
    /// Load configuration from a file and environment variables.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mikrotik_exporter::config::Settings;
    ///
    /// let settings = Settings::load(Some("config/default.toml")).unwrap();
    /// ```
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(config::File::with_name(path));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("MIKROTIK_EXPORTER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration settings.
    pub fn validate(&self) -> Result<()> {
        if self.devices.is_empty() {
            return Err(invalid("at least one device must be configured"));
        }

        let mut names = HashSet::new();
        for device in &self.devices {
            if device.name.is_empty() {
                return Err(invalid("device name cannot be empty"));
            }
            if !names.insert(device.name.as_str()) {
                return Err(invalid(format!("duplicate device name {:?}", device.name)));
            }
            if device.address.is_empty() {
                return Err(invalid(format!(
                    "device {:?} has an empty address",
                    device.name
                )));
            }
            if device.username.is_empty() || device.password.is_empty() {
                return Err(invalid(format!(
                    "device {:?} needs API credentials",
                    device.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str) -> DeviceConfig {
        DeviceConfig {
            name: name.to_string(),
            address: "https://192.168.88.1".to_string(),
            username: "prometheus".to_string(),
            password: "secret".to_string(),
            verify_tls: false,
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.exporter.listen_address, "0.0.0.0:9436");
        assert_eq!(settings.exporter.timeout(), Duration::from_secs(10));
        assert!(settings.exporter.collectors.is_empty());
    }

    #[test]
    fn test_validation_fails_without_devices() {
        assert!(Settings::default().validate().is_err());
    }

    #[test]
    fn test_validation_rejects_duplicate_names() {
        let settings = Settings {
            devices: vec![device("gw"), device("gw")],
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_requires_credentials() {
        let mut dev = device("gw");
        dev.password.clear();
        let settings = Settings {
            devices: vec![dev],
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            devices: vec![device("gw"), device("edge")],
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", device("gw"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
