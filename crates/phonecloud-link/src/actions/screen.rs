//! Screen capture.

use serde_json::json;

use phonecloud_core::prelude::*;

use super::catalog;
use super::params::require_non_empty;
use super::DeviceActions;
use crate::correlator::ActionHandle;

impl DeviceActions {
    /// Capture the screen; the result carries the image as base64.
    pub fn take_screenshot(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::TAKE_SCREENSHOT)
    }

    /// Capture the screen into a file on the device.
    pub fn take_screenshot_to_file(&self, file_path: &str) -> Result<ActionHandle> {
        let spec = catalog::TAKE_SCREENSHOT_TO_FILE;
        require_non_empty(spec.id, "file_path", file_path)?;
        self.send(spec, json!({ "file_path": file_path }))
    }

    /// Dump the current UI hierarchy as XML.
    pub fn dump_screen_xml(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::DUMP_SCREEN_XML)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_screenshot_to_file_payload() {
        let (actions, mut outbound) = subscribed_actions();
        actions
            .take_screenshot_to_file("/sdcard/shot.png")
            .unwrap();

        let payload = next_payload(&mut outbound);
        assert_eq!(payload["action_id"], "take_screenshot_to_file");
        assert_eq!(payload["args"], json!({"file_path": "/sdcard/shot.png"}));
    }

    #[test]
    fn test_screen_deadlines() {
        assert_eq!(
            catalog::TAKE_SCREENSHOT.default_timeout,
            Duration::from_secs(10)
        );
        assert_eq!(
            catalog::DUMP_SCREEN_XML.default_timeout,
            Duration::from_secs(10)
        );
    }
}
