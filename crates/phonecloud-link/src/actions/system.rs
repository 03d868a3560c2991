//! Shell commands and hardware controls.

use serde_json::json;

use phonecloud_core::prelude::*;

use super::catalog;
use super::params::{require_non_empty, CommandPermission};
use super::DeviceActions;
use crate::correlator::ActionHandle;

impl DeviceActions {
    /// Run a shell command; the result carries its output.
    pub fn execute_command(
        &self,
        command: &str,
        permission: CommandPermission,
    ) -> Result<ActionHandle> {
        let spec = catalog::EXECUTE_COMMAND;
        require_non_empty(spec.id, "command", command)?;
        self.send(
            spec,
            json!({ "command": command, "permission": permission }),
        )
    }

    pub fn vibrate(&self, duration_ms: u64) -> Result<ActionHandle> {
        let spec = catalog::VIBRATE;
        if duration_ms == 0 {
            return Err(Error::invalid_argument(spec.id, "time must be positive"));
        }
        self.send(spec, json!({ "time": duration_ms }))
    }

    /// Set the media volume. The valid range depends on the device.
    pub fn change_volume(&self, volume: u32) -> Result<ActionHandle> {
        self.send(catalog::CHANGE_VOLUME, json!({ "volume": volume }))
    }

    pub fn reboot_device(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::REBOOT_DEVICE)
    }

    pub fn get_device_info(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::GET_DEVICE_INFO)
    }
}
