//! Application lifecycle and package information.

use serde_json::json;

use phonecloud_core::prelude::*;

use super::catalog;
use super::params::{require_non_empty, require_url, AppListKind};
use super::DeviceActions;
use crate::correlator::ActionHandle;

impl DeviceActions {
    /// Launch an installed application by package name.
    pub fn open_app(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::OPEN_APP, package_name)
    }

    /// Launch an application through a deep link.
    pub fn open_app_deep_link(&self, package_name: &str, url: &str) -> Result<ActionHandle> {
        let spec = catalog::OPEN_APP_DEEP_LINK;
        require_non_empty(spec.id, "package_name", package_name)?;
        require_non_empty(spec.id, "url", url)?;
        self.send(spec, json!({ "package_name": package_name, "url": url }))
    }

    pub fn check_app_installed(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::CHECK_APP_INSTALLED, package_name)
    }

    pub fn check_app_enabled(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::CHECK_APP_ENABLED, package_name)
    }

    pub fn check_app_system(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::CHECK_APP_SYSTEM, package_name)
    }

    pub fn check_app_running(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::CHECK_APP_RUNNING, package_name)
    }

    /// Whether `package_name` holds an Android permission such as
    /// `android.permission.CAMERA`.
    pub fn check_app_permission_granted(
        &self,
        package_name: &str,
        permission: &str,
    ) -> Result<ActionHandle> {
        let spec = catalog::CHECK_APP_PERMISSION_GRANTED;
        require_non_empty(spec.id, "package_name", package_name)?;
        require_non_empty(spec.id, "permission", permission)?;
        self.send(
            spec,
            json!({ "package_name": package_name, "permission": permission }),
        )
    }

    /// List installed applications of the given kind.
    pub fn get_app_installed(&self, kind: AppListKind) -> Result<ActionHandle> {
        self.send(catalog::GET_APP_INSTALLED, json!({ "type": kind }))
    }

    pub fn get_app_name(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::GET_APP_NAME, package_name)
    }

    pub fn get_app_version_code(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::GET_APP_VERSION_CODE, package_name)
    }

    pub fn get_app_version_name(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::GET_APP_VERSION_NAME, package_name)
    }

    /// Information about the activity currently on top of the screen.
    pub fn get_top_activity_info(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::GET_TOP_ACTIVITY_INFO)
    }

    /// Install an APK already present on the device.
    pub fn install_app(&self, file_path: &str) -> Result<ActionHandle> {
        let spec = catalog::INSTALL_APP;
        require_non_empty(spec.id, "file_path", file_path)?;
        self.send(spec, json!({ "file_path": file_path }))
    }

    /// Download and install an APK.
    pub fn install_app_from_url(&self, url: &str) -> Result<ActionHandle> {
        let spec = catalog::INSTALL_APP_FROM_URL;
        require_url(spec.id, url)?;
        self.send(spec, json!({ "url": url }))
    }

    pub fn clear_app_data(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::CLEAR_APP_DATA, package_name)
    }

    pub fn force_stop_app(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::FORCE_STOP_APP, package_name)
    }

    pub fn uninstall_app(&self, package_name: &str) -> Result<ActionHandle> {
        self.package_action(catalog::UNINSTALL_APP, package_name)
    }

    /// Actions whose only argument is `package_name`.
    pub(crate) fn package_action(
        &self,
        spec: catalog::ActionSpec,
        package_name: &str,
    ) -> Result<ActionHandle> {
        require_non_empty(spec.id, "package_name", package_name)?;
        self.send(spec, json!({ "package_name": package_name }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_open_app_payload() {
        let (actions, mut outbound) = subscribed_actions();
        actions.open_app("com.facebook.katana").unwrap();

        let payload = next_payload(&mut outbound);
        assert_eq!(payload["type"], "ACTION_CONTROL");
        assert_eq!(payload["action_id"], "open_app");
        assert_eq!(payload["args"], json!({"package_name": "com.facebook.katana"}));
    }

    #[tokio::test]
    async fn test_open_app_rejects_empty_package() {
        let (actions, mut outbound) = subscribed_actions();
        let err = actions.open_app("").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_permission_and_listing_payloads() {
        let (actions, mut outbound) = subscribed_actions();

        actions
            .check_app_permission_granted("com.x", "android.permission.CAMERA")
            .unwrap();
        assert_eq!(
            next_payload(&mut outbound)["args"],
            json!({"package_name": "com.x", "permission": "android.permission.CAMERA"})
        );

        actions.get_app_installed(AppListKind::System).unwrap();
        let payload = next_payload(&mut outbound);
        assert_eq!(payload["action_id"], "get_app_installed");
        assert_eq!(payload["args"], json!({"type": "SYSTEM"}));
    }

    #[tokio::test]
    async fn test_install_from_url_validates() {
        let (actions, mut outbound) = subscribed_actions();
        assert!(actions.install_app_from_url("not a url").is_err());
        actions
            .install_app_from_url("https://example.com/app.apk")
            .unwrap();
        assert_eq!(
            next_payload(&mut outbound)["action_id"],
            "install_app_from_url"
        );
    }
}
