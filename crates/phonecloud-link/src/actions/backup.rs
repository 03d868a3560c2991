//! App-info modding and account backup/restore.

use serde_json::json;

use phonecloud_core::prelude::*;

use super::catalog;
use super::params::require_non_empty;
use super::DeviceActions;
use crate::correlator::ActionHandle;

impl DeviceActions {
    /// Install the helper app used by [`change_app_info`](Self::change_app_info).
    ///
    /// Slow: the default deadline is three minutes.
    pub fn install_change_info_app(&self, api_key: &str) -> Result<ActionHandle> {
        let spec = catalog::INSTALL_CHANGE_INFO_APP;
        require_non_empty(spec.id, "api_key", api_key)?;
        self.send(spec, json!({ "api_key": api_key }))
    }

    /// Randomize the device identity seen by `package_name`.
    pub fn change_app_info(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::CHANGE_APP_INFO, package_name)
    }

    pub fn backup_app_data(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::BACKUP_APP_DATA, package_name)
    }

    /// Restore data previously saved by [`backup_app_data`](Self::backup_app_data).
    pub fn restore_app_data(&self, package_name: &str, backup_path: &str) -> Result<ActionHandle> {
        let spec = catalog::RESTORE_APP_DATA;
        require_non_empty(spec.id, "package_name", package_name)?;
        require_non_empty(spec.id, "backup_path", backup_path)?;
        self.send(
            spec,
            json!({ "package_name": package_name, "backup_path": backup_path }),
        )
    }

    pub fn read_app_data(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::READ_APP_DATA, package_name)
    }

    pub fn backup_and_upload_account(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::BACKUP_AND_UPLOAD_ACCOUNT, package_name)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_restore_payload() {
        let (actions, mut outbound) = subscribed_actions();
        actions
            .restore_app_data("com.x", "/sdcard/backup/com.x.tar")
            .unwrap();

        let payload = next_payload(&mut outbound);
        assert_eq!(payload["action_id"], "restore_app_data");
        assert_eq!(
            payload["args"],
            json!({"package_name": "com.x", "backup_path": "/sdcard/backup/com.x.tar"})
        );
    }

    #[tokio::test]
    async fn test_install_change_info_app_requires_key() {
        let (actions, mut outbound) = subscribed_actions();
        assert!(actions.install_change_info_app("").is_err());
        actions.install_change_info_app("key-123").unwrap();
        assert_eq!(
            next_payload(&mut outbound)["args"],
            json!({"api_key": "key-123"})
        );
    }
}
