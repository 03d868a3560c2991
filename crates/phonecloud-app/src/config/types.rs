//! Configuration types for PhoneCloud
//!
//! Defines:
//! - `Settings` - Project settings (.phonecloud/config.toml)
//! - `ConnectionSettings`, `RetrySettings` - Per-section settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

use phonecloud_core::{Device, DeviceStatus};
use phonecloud_link::{
    ConnectionConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_ENDPOINT, DEFAULT_EVENT_CAPACITY,
};

use crate::retry::{HarnessPolicy, DEFAULT_MAX_RETRIES};

/// Project settings (.phonecloud/config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub connection: ConnectionSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    /// Devices known before the first subscribe frame arrives
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl Settings {
    /// Mark the devices to run workflows on.
    ///
    /// With `ids` empty, the configured selection is kept, and if nothing is
    /// selected every non-Pending device is. Otherwise exactly `ids` are
    /// selected; unknown ids are added as Disconnected devices.
    pub fn select_devices(&mut self, ids: &[String]) {
        if ids.is_empty() {
            if !self.devices.iter().any(|d| d.selected) {
                for device in &mut self.devices {
                    device.selected = device.status != DeviceStatus::Pending;
                }
            }
            return;
        }

        for device in &mut self.devices {
            device.selected = ids.contains(&device.id);
        }
        for id in ids {
            if !self.devices.iter().any(|d| &d.id == id) {
                let mut device = Device::new(id.clone(), id.clone()).with_status(DeviceStatus::Disconnected);
                device.selected = true;
                self.devices.push(device);
            }
        }
    }
}

/// Party channel connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Base WebSocket URL (ws:// or wss://)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Fixed delay before reconnecting after the channel closes
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Give up on a handshake that has not completed after this long
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Fail in-flight requests as soon as the channel drops instead of
    /// letting them run into their deadline
    #[serde(default)]
    pub fail_pending_on_disconnect: bool,

    /// Capacity of the session event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            fail_pending_on_disconnect: false,
            event_capacity: default_event_capacity(),
        }
    }
}

impl ConnectionSettings {
    /// Build the transport configuration for `access_token`.
    pub fn to_connection_config(&self, access_token: &str) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(self.endpoint.clone(), access_token);
        config.reconnect_delay = Duration::from_millis(self.reconnect_delay_ms);
        config.connect_timeout = Duration::from_millis(self.connect_timeout_ms);
        config.fail_pending_on_disconnect = self.fail_pending_on_disconnect;
        config
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

/// Per-device retry harness settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    /// Consecutive failures before a device's harness stops
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Wait between a failure and the next attempt
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Re-run the workflow after every success until retries are exhausted
    #[serde(default)]
    pub repeat: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            repeat: false,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> HarnessPolicy {
        HarnessPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
            .with_repeat(self.repeat)
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_delay_ms() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.connection.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.connection.reconnect_delay_ms, 1000);
        assert_eq!(settings.connection.connect_timeout_ms, 10_000);
        assert!(!settings.connection.fail_pending_on_disconnect);
        assert_eq!(settings.retry.max_retries, 5);
        assert_eq!(settings.retry.retry_delay_ms, 5000);
        assert!(!settings.retry.repeat);
        assert!(settings.devices.is_empty());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[retry]
max_retries = 3

[[devices]]
id = "dev-1"
name = "Pixel"
status = "DISCONNECTED"
selected = true
"#,
        )
        .unwrap();

        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.retry.retry_delay_ms, 5000);
        assert_eq!(settings.connection.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.devices.len(), 1);
        assert_eq!(settings.devices[0].status, DeviceStatus::Disconnected);
        assert!(settings.devices[0].selected);
        assert_eq!(settings.devices[0].action, "Idle");
    }

    fn configured() -> Settings {
        let mut settings = Settings::default();
        settings.devices = vec![
            Device::new("a", "A").with_status(DeviceStatus::Disconnected),
            Device::new("b", "B").with_status(DeviceStatus::Pending),
        ];
        settings
    }

    #[test]
    fn test_select_devices_defaults_to_non_pending() {
        let mut settings = configured();
        settings.select_devices(&[]);
        assert!(settings.devices[0].selected);
        assert!(!settings.devices[1].selected);
    }

    #[test]
    fn test_select_devices_keeps_configured_selection() {
        let mut settings = configured();
        settings.devices[1].selected = true;
        settings.select_devices(&[]);
        assert!(!settings.devices[0].selected);
        assert!(settings.devices[1].selected);
    }

    #[test]
    fn test_select_devices_by_id_adds_unknown() {
        let mut settings = configured();
        settings.select_devices(&["b".to_string(), "c".to_string()]);

        let selected: Vec<_> = settings
            .devices
            .iter()
            .filter(|d| d.selected)
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(selected, vec!["b", "c"]);
        assert_eq!(settings.devices[2].status, DeviceStatus::Disconnected);
    }

    #[test]
    fn test_to_connection_config() {
        let connection = ConnectionSettings {
            endpoint: "ws://localhost:9000/ws/party".to_string(),
            reconnect_delay_ms: 250,
            connect_timeout_ms: 2000,
            fail_pending_on_disconnect: true,
            event_capacity: 16,
        };
        let config = connection.to_connection_config("token");

        assert_eq!(config.endpoint, "ws://localhost:9000/ws/party");
        assert_eq!(config.access_token, "token");
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert!(config.fail_pending_on_disconnect);
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let retry = RetrySettings {
            max_retries: 2,
            retry_delay_ms: 10,
            repeat: true,
        };
        let policy = retry.policy();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.retry_delay, Duration::from_millis(10));
        assert!(policy.repeat);
    }
}
