// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration.
//!
//! Loaded once at startup from a YAML file and never mutated afterwards.
//! Keys use the `PascalCase` layout of existing deployments:
//!
//! ```yaml
//! Device:
//!   Name: living-room
//!   Host: 192.168.1.20
//!   Port: 80
//!   Zones: 6
//!   PollInterval: 500ms
//! MQTT:
//!   Host: 192.168.1.50
//!   Port: 1883
//! ```
//!
//! Durations use Go notation (`500ms`, `1m30s`, `2h`).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// Environment variable overriding `Device.Host`.
pub const ENV_DEVICE_HOST: &str = "POWER_PLANT_DEVICE_HOST";
/// Environment variable overriding `Device.Password`.
pub const ENV_DEVICE_PASSWORD: &str = "POWER_PLANT_DEVICE_PASSWORD";
/// Environment variable overriding `MQTT.Host`.
pub const ENV_MQTT_HOST: &str = "POWER_PLANT_MQTT_HOST";
/// Environment variable overriding `MQTT.Password`.
pub const ENV_MQTT_PASSWORD: &str = "POWER_PLANT_MQTT_PASSWORD";

/// Complete bridge configuration.
///
/// # Examples
///
/// ```
/// use powerplant_bridge::config::BridgeConfig;
///
/// let yaml = r"
/// Device:
///   Name: amp
///   Host: 192.168.1.20
///   Zones: 4
///   PollInterval: 500ms
/// MQTT:
///   Host: 192.168.1.50
/// ";
///
/// let config = BridgeConfig::from_yaml_str(yaml).unwrap();
/// assert_eq!(config.device.zones, 4);
/// assert_eq!(config.mqtt.port, 1883);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BridgeConfig {
    /// Amplifier connection settings.
    pub device: DeviceSettings,
    /// Broker connection settings.
    #[serde(rename = "MQTT")]
    pub mqtt: MqttSettings,
}

impl BridgeConfig {
    /// Creates a configuration from its two sections.
    #[must_use]
    pub fn new(device: DeviceSettings, mqtt: MqttSettings) -> Self {
        Self { device, mqtt }
    }

    /// Loads, overrides from the environment, and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, is not valid YAML,
    /// or holds invalid values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!(path = %path.display(), "Loading configuration");

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut config: Self = serde_yaml::from_str(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        tracing::info!(
            device = %config.device.name,
            zones = config.device.zones,
            poll_interval = ?config.device.poll_interval,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parses and validates a YAML document without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the document is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides looked up by environment variable name.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup(ENV_DEVICE_HOST) {
            self.device.host = host;
        }
        if let Some(password) = lookup(ENV_DEVICE_PASSWORD) {
            self.device.password = Some(password);
        }
        if let Some(host) = lookup(ENV_MQTT_HOST) {
            self.mqtt.host = host;
        }
        if let Some(password) = lookup(ENV_MQTT_PASSWORD) {
            self.mqtt.password = Some(password);
        }
    }

    /// Checks every value the bridge relies on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.device.validate()?;
        self.mqtt.validate()
    }
}

/// Amplifier connection settings (`Device` section).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceSettings {
    /// Device name, used as a topic namespace segment.
    pub name: String,
    /// Hostname or IP address. A value with an `http://` or `https://`
    /// scheme is used as the base URL verbatim.
    pub host: String,
    /// HTTP port.
    #[serde(default = "default_device_port")]
    pub port: u16,
    /// Number of individually addressable zones.
    pub zones: usize,
    /// Interval between state publishes.
    #[serde(deserialize_with = "duration")]
    pub poll_interval: Duration,
    /// HTTP basic auth user name.
    #[serde(default)]
    pub username: Option<String>,
    /// HTTP basic auth password.
    #[serde(default)]
    pub password: Option<String>,
    /// TCP connect timeout for device requests.
    #[serde(default = "default_connect_timeout", deserialize_with = "duration")]
    pub connect_timeout: Duration,
    /// Overall timeout for a device request.
    #[serde(default = "default_request_timeout", deserialize_with = "duration")]
    pub request_timeout: Duration,
}

impl DeviceSettings {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default poll interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
    /// Default connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    /// Default request timeout.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates device settings with defaults for everything optional.
    #[must_use]
    pub fn new(name: impl Into<String>, host: impl Into<String>, zones: usize) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: Self::DEFAULT_PORT,
            zones,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            username: None,
            password: None,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets basic auth credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the connect and request timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    /// Returns the credentials when a user name is configured.
    ///
    /// An empty user name counts as no credentials.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username
            .as_deref()
            .filter(|username| !username.is_empty())
            .map(|username| (username, self.password.as_deref().unwrap_or_default()))
    }

    /// Builds the base URL for device requests.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            return self.host.trim_end_matches('/').to_string();
        }
        if self.port == Self::DEFAULT_PORT {
            format!("http://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::invalid("Device.Name", "must not be empty"));
        }
        if self.name.contains(['/', '+', '#']) {
            return Err(ConfigError::invalid(
                "Device.Name",
                format!("{:?} must not contain '/', '+' or '#'", self.name),
            ));
        }
        if self.host.is_empty() {
            return Err(ConfigError::invalid("Device.Host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid("Device.Port", "must not be 0"));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::invalid("Device.PollInterval", "must not be 0"));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::invalid("Device.ConnectTimeout", "must not be 0"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::invalid("Device.RequestTimeout", "must not be 0"));
        }
        Ok(())
    }
}

/// Broker connection settings (`MQTT` section).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MqttSettings {
    /// Broker hostname or IP address.
    pub host: String,
    /// Broker port.
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    /// Broker user name.
    #[serde(default)]
    pub username: Option<String>,
    /// Broker password.
    #[serde(default)]
    pub password: Option<String>,
    /// MQTT keep-alive interval.
    #[serde(default = "default_keep_alive", deserialize_with = "duration")]
    pub keep_alive: Duration,
    /// How long to wait for the broker's `ConnAck` at startup.
    #[serde(default = "default_connection_timeout", deserialize_with = "duration")]
    pub connection_timeout: Duration,
    /// Whether state notifications are published with the retain flag.
    #[serde(default)]
    pub retain: bool,
}

impl MqttSettings {
    /// Default broker port.
    pub const DEFAULT_PORT: u16 = 1883;
    /// Default keep-alive interval.
    pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
    /// Default connection timeout.
    pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates broker settings with defaults for everything optional.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            username: None,
            password: None,
            keep_alive: Self::DEFAULT_KEEP_ALIVE,
            connection_timeout: Self::DEFAULT_CONNECTION_TIMEOUT,
            retain: false,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets broker credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Returns the credentials when a user name is configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username
            .as_deref()
            .filter(|username| !username.is_empty())
            .map(|username| (username, self.password.as_deref().unwrap_or_default()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::invalid("MQTT.Host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid("MQTT.Port", "must not be 0"));
        }
        if self.connection_timeout.is_zero() {
            return Err(ConfigError::invalid("MQTT.ConnectionTimeout", "must not be 0"));
        }
        Ok(())
    }
}

fn default_device_port() -> u16 {
    DeviceSettings::DEFAULT_PORT
}

fn default_connect_timeout() -> Duration {
    DeviceSettings::DEFAULT_CONNECT_TIMEOUT
}

fn default_request_timeout() -> Duration {
    DeviceSettings::DEFAULT_REQUEST_TIMEOUT
}

fn default_mqtt_port() -> u16 {
    MqttSettings::DEFAULT_PORT
}

fn default_keep_alive() -> Duration {
    MqttSettings::DEFAULT_KEEP_ALIVE
}

fn default_connection_timeout() -> Duration {
    MqttSettings::DEFAULT_CONNECTION_TIMEOUT
}

fn duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}

/// Parses a Go-style duration such as `500ms`, `1.5s` or `1h30m`.
///
/// Supported units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare
/// `0` is accepted; any other number needs a unit.
///
/// # Errors
///
/// Returns a description of the problem if the input is malformed.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use powerplant_bridge::config::parse_duration;
///
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// assert!(parse_duration("10").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let trimmed = input.trim();
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }
    if trimmed.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = trimmed;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("expected a number in {input:?}"));
        }
        let (number, tail) = rest.split_at(number_len);
        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid number {number:?} in {input:?}"))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let nanos_per_unit = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("missing unit in {input:?}")),
            other => return Err(format!("unknown unit {other:?} in {input:?}")),
        };

        // Values are non-negative and far below u64::MAX nanoseconds in practice
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let nanos = (value * nanos_per_unit).round() as u64;
        total += Duration::from_nanos(nanos);
        rest = tail;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const MINIMAL: &str = r"
Device:
  Name: amp
  Host: 192.168.1.20
  Zones: 3
  PollInterval: 500ms
MQTT:
  Host: broker.local
";

    #[test]
    fn minimal_config_uses_defaults() {
        let config = BridgeConfig::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(config.device.name, "amp");
        assert_eq!(config.device.port, 80);
        assert_eq!(config.device.poll_interval, Duration::from_millis(500));
        assert_eq!(config.device.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.device.request_timeout, Duration::from_secs(10));
        assert!(config.device.credentials().is_none());
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.keep_alive, Duration::from_secs(30));
        assert!(!config.mqtt.retain);
    }

    #[test]
    fn full_config() {
        let yaml = r"
Device:
  Name: amp
  Host: 192.168.1.20
  Port: 8080
  Zones: 6
  PollInterval: 2s
  Username: admin
  Password: secret
  ConnectTimeout: 1s
  RequestTimeout: 3s
MQTT:
  Host: broker.local
  Port: 8883
  Username: bridge
  Password: hunter2
  KeepAlive: 1m
  ConnectionTimeout: 5s
  Retain: true
";
        let config = BridgeConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.device.port, 8080);
        assert_eq!(config.device.credentials(), Some(("admin", "secret")));
        assert_eq!(config.device.request_timeout, Duration::from_secs(3));
        assert_eq!(config.mqtt.credentials(), Some(("bridge", "hunter2")));
        assert_eq!(config.mqtt.keep_alive, Duration::from_secs(60));
        assert!(config.mqtt.retain);
    }

    #[test]
    fn missing_section_is_a_yaml_error() {
        let result = BridgeConfig::from_yaml_str("Device:\n  Name: amp\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn bad_duration_is_a_yaml_error() {
        let yaml = MINIMAL.replace("500ms", "soon");
        assert!(matches!(
            BridgeConfig::from_yaml_str(&yaml),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn wildcard_in_name_is_rejected() {
        let yaml = MINIMAL.replace("Name: amp", "Name: amp/+");
        let err = BridgeConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "Device.Name"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let yaml = MINIMAL.replace("500ms", "0s");
        let err = BridgeConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { ref field, .. } if field == "Device.PollInterval")
        );
    }

    #[test]
    fn empty_username_means_no_credentials() {
        let settings = DeviceSettings::new("amp", "host", 1).with_credentials("", "x");
        assert!(settings.credentials().is_none());
    }

    #[test]
    fn overrides_replace_hosts_and_passwords() {
        let mut config = BridgeConfig::from_yaml_str(MINIMAL).unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_DEVICE_HOST, "10.0.0.2"),
            (ENV_MQTT_HOST, "10.0.0.3"),
            (ENV_MQTT_PASSWORD, "pw"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.device.host, "10.0.0.2");
        assert_eq!(config.mqtt.host, "10.0.0.3");
        assert_eq!(config.mqtt.password.as_deref(), Some("pw"));
        assert!(config.device.password.is_none());
    }

    #[test]
    fn base_url_variants() {
        assert_eq!(
            DeviceSettings::new("amp", "192.168.1.20", 1).base_url(),
            "http://192.168.1.20"
        );
        assert_eq!(
            DeviceSettings::new("amp", "192.168.1.20", 1)
                .with_port(8080)
                .base_url(),
            "http://192.168.1.20:8080"
        );
        assert_eq!(
            DeviceSettings::new("amp", "http://127.0.0.1:3456/", 1).base_url(),
            "http://127.0.0.1:3456"
        );
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("250ns").unwrap(), Duration::from_nanos(250));
        assert_eq!(parse_duration("3us").unwrap(), Duration::from_micros(3));
        assert_eq!(parse_duration("3µs").unwrap(), Duration::from_micros(3));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1h1m1s").unwrap(), Duration::from_secs(3661));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_errors() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("5 days").is_err());
        assert!(parse_duration("1..2s").is_err());
    }
}
