//! Device state flags, clipboard and Wi-Fi.

use serde_json::json;

use phonecloud_core::prelude::*;

use super::catalog;
use super::params::require_non_empty;
use super::DeviceActions;
use crate::correlator::ActionHandle;

impl DeviceActions {
    pub fn check_wifi_enabled(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_WIFI_ENABLED)
    }

    pub fn check_mobile_data_enabled(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_MOBILE_DATA_ENABLED)
    }

    pub fn check_power_connected(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_POWER_CONNECTED)
    }

    pub fn check_airplane_mode_enabled(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_AIRPLANE_MODE_ENABLED)
    }

    pub fn check_vpn_enabled(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_VPN_ENABLED)
    }

    pub fn check_sim_card_exists(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_SIM_CARD_EXISTS)
    }

    pub fn check_gps_enabled(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_GPS_ENABLED)
    }

    pub fn check_usb_debug_enabled(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_USB_DEBUG_ENABLED)
    }

    pub fn check_adb_enabled(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_ADB_ENABLED)
    }

    pub fn check_adb_running(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_ADB_RUNNING)
    }

    pub fn check_rooted(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_ROOTED)
    }

    pub fn get_clipboard(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::GET_CLIPBOARD)
    }

    /// Replace the clipboard contents. Empty content clears it.
    pub fn set_clipboard(&self, content: &str) -> Result<ActionHandle> {
        self.send(catalog::SET_CLIPBOARD, json!({ "content": content }))
    }

    pub fn set_wifi_enabled(&self, enabled: bool) -> Result<ActionHandle> {
        self.send(catalog::SET_WIFI_ENABLED, json!({ "enabled": enabled }))
    }

    /// Join a Wi-Fi network. Open networks take an empty password.
    pub fn connect_wifi(&self, ssid: &str, password: &str) -> Result<ActionHandle> {
        let spec = catalog::CONNECT_WIFI;
        require_non_empty(spec.id, "ssid", ssid)?;
        self.send(spec, json!({ "ssid": ssid, "password": password }))
    }
}
