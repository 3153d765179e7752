//! Configuration management.
//!
//! Settings are loaded from an optional TOML file layered over built-in
//! defaults; the CLI can override the common fields afterwards.

use crate::error::ThermologError;
use config::Config;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub server: ServerSettings,
    pub node: NodeSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the ingest listener binds to.
    pub bind_addr: String,
    pub port: u16,
    /// Path of the append-only reading log.
    pub log_path: String,
    /// Maximum concurrent connection handlers.
    pub max_connections: usize,
    /// Deadline for the single wire-message read, in milliseconds.
    pub read_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NodeSettings {
    /// Ingest server endpoint the node reports to.
    pub server_addr: String,
    pub server_port: u16,
    /// Seconds between acquisition cycles.
    pub interval_secs: u64,
    /// Backoff after a failed acquisition, in seconds.
    pub retry_secs: u64,
    /// Location label stamped on every reading.
    pub location: String,
    /// Acquisition method: "gpio", "serial" or "sim".
    pub method: String,
    /// GPIO pin (BCM numbering) carrying the sensor data line.
    pub gpio_pin: u8,
    /// Serial device path for the alternate transport; empty = auto-detect.
    pub serial_port: String,
    pub serial_baud: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerSettings::default(),
            node: NodeSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8765,
            log_path: "data.csv".to_string(),
            max_connections: 64,
            read_timeout_ms: 10_000,
        }
    }
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1".to_string(),
            server_port: 8765,
            interval_secs: 2,
            retry_secs: 5,
            location: "unknown".to_string(),
            method: "sim".to_string(),
            gpio_pin: 26,
            serial_port: String::new(),
            serial_baud: 9600,
        }
    }
}

impl Settings {
    /// Load settings from `config/<name>.toml`, falling back to defaults when
    /// no file is present.
    pub fn new(config_name: Option<&str>) -> Result<Self, ThermologError> {
        let config_path = format!("config/{}", config_name.unwrap_or("default"));
        let s = Config::builder()
            .add_source(config::File::with_name(&config_path).required(false))
            .build()
            .map_err(ThermologError::Config)?;

        s.try_deserialize().map_err(ThermologError::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_sizing() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8765);
        assert_eq!(settings.server.max_connections, 64);
        assert_eq!(settings.node.interval_secs, 2);
        assert_eq!(settings.node.retry_secs, 5);
    }

    #[test]
    fn partial_toml_overlays_defaults() {
        let toml_str = r#"
            log_level = "debug"

            [server]
            port = 9000
            log_path = "/var/lib/thermolog/data.csv"

            [node]
            location = "lab-A"
            method = "gpio"
        "#;
        let settings: Settings = toml::from_str(toml_str).expect("parse test config");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.server.port, 9000);
        // untouched fields keep their defaults
        assert_eq!(settings.server.max_connections, 64);
        assert_eq!(settings.node.location, "lab-A");
        assert_eq!(settings.node.gpio_pin, 26);
    }
}
