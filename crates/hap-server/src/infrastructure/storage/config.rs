//! TOML-based configuration for the accessory server.
//!
//! Every field has a default, so the server runs with no config file at
//! all (first boot) and tolerates files written by older versions that
//! lack newer fields.  The two timing parameters — the poll interval
//! that paces the cooperative loop and the idle-eviction threshold —
//! are deliberately exposed here rather than hard-coded.

use hap_core::{AccessoryCategory, DeviceId, TxtRecordSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub accessory: AccessoryConfig,
}

/// Listener and registry settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Instance name published with the discovery advertisement.
    #[serde(default = "default_instance_name")]
    pub instance_name: String,
    /// Maximum number of simultaneously open connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            instance_name: default_instance_name(),
            max_connections: default_max_connections(),
        }
    }
}

/// The two timing parameters of the cooperative loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    /// Readiness-wait window per step, in microseconds.  Short enough
    /// to act as a yield point, not a blocking wait.
    #[serde(default = "default_poll_interval_us")]
    pub poll_interval_us: u64,
    /// A connection silent for longer than this is evicted.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_us: default_poll_interval_us(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Accessory identity published in the TXT metadata records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessoryConfig {
    /// Six-octet device identifier, e.g. `"c4:b3:01:c3:f7:9d"`.
    #[serde(default = "default_device_id")]
    pub device_id: DeviceId,
    /// Model name, e.g. `"HAP1,1"`.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Accessory category, e.g. `"lightbulb"`.
    #[serde(default = "default_category")]
    pub category: AccessoryCategory,
    /// Configuration number; bump when the accessory database changes.
    #[serde(default = "default_one_u32")]
    pub configuration_number: u32,
    /// Current state number.
    #[serde(default = "default_one_u8")]
    pub state_number: u8,
}

impl Default for AccessoryConfig {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            model_name: default_model_name(),
            category: default_category(),
            configuration_number: default_one_u32(),
            state_number: default_one_u8(),
        }
    }
}

// ── Serde default helpers ─────────────────────────────────────────────────────

fn default_port() -> u16 {
    42424
}

fn default_instance_name() -> String {
    "Accessory".to_string()
}

fn default_max_connections() -> usize {
    8
}

fn default_poll_interval_us() -> u64 {
    250
}

fn default_idle_timeout_secs() -> u64 {
    60
}

fn default_device_id() -> DeviceId {
    DeviceId([0; 6])
}

fn default_model_name() -> String {
    "HAP1,1".to_string()
}

fn default_category() -> AccessoryCategory {
    AccessoryCategory::Other
}

fn default_one_u32() -> u32 {
    1
}

fn default_one_u8() -> u8 {
    1
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Parses a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads the config from `path`, falling back to the defaults if
    /// the file does not exist.  A file that exists but fails to parse
    /// is still an error — silently ignoring a broken config hides
    /// operator mistakes.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Builds the TXT record set this config describes.
    pub fn txt_records(&self) -> TxtRecordSet {
        let mut txt = TxtRecordSet::new();
        txt.set_configuration_number(self.accessory.configuration_number)
            .set_device_id(self.accessory.device_id)
            .set_model_name(self.accessory.model_name.clone())
            .set_state_number(self.accessory.state_number)
            .set_category(self.accessory.category);
        txt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_constants() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 42424);
        assert_eq!(config.timing.poll_interval(), Duration::from_micros(250));
        assert_eq!(config.timing.idle_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_full_config_round_trip() {
        let text = r#"
            [server]
            port = 8080
            instance_name = "Kitchen Lamp"
            max_connections = 4

            [timing]
            poll_interval_us = 500
            idle_timeout_secs = 30

            [accessory]
            device_id = "c4:b3:01:c3:f7:9d"
            model_name = "Lamp2,1"
            category = "lightbulb"
            configuration_number = 3
            state_number = 2
        "#;
        let config = AppConfig::from_toml(text).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.instance_name, "Kitchen Lamp");
        assert_eq!(config.server.max_connections, 4);
        assert_eq!(config.timing.poll_interval(), Duration::from_micros(500));
        assert_eq!(config.timing.idle_timeout(), Duration::from_secs(30));
        assert_eq!(config.accessory.category, AccessoryCategory::Lightbulb);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config = AppConfig::from_toml("[server]\nport = 1234\n").unwrap();
        assert_eq!(config.server.port, 1234);
        assert_eq!(config.server.max_connections, 8);
        assert_eq!(config.timing.poll_interval_us, 250);
        assert_eq!(config.accessory.model_name, "HAP1,1");
    }

    #[test]
    fn test_load_or_default_tolerates_missing_file() {
        let config = AppConfig::load_or_default(Path::new("/nonexistent/hap-server.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(AppConfig::from_toml("[server\nport = oops").is_err());
    }

    #[test]
    fn test_txt_records_reflect_accessory_section() {
        let text = r#"
            [accessory]
            device_id = "aa:bb:cc:dd:ee:ff"
            category = "outlet"
            configuration_number = 9
        "#;
        let config = AppConfig::from_toml(text).unwrap();
        let pairs = config.txt_records().pairs();
        assert!(pairs.contains(&("id".to_string(), "aa:bb:cc:dd:ee:ff".to_string())));
        assert!(pairs.contains(&("ci".to_string(), "7".to_string())));
        assert!(pairs.contains(&("c#".to_string(), "9".to_string())));
    }
}
