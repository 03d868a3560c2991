//! Device filesystem and media gallery.

use serde_json::json;

use phonecloud_core::prelude::*;

use super::catalog;
use super::params::{require_non_empty, WriteMode};
use super::DeviceActions;
use crate::correlator::ActionHandle;

impl DeviceActions {
    pub fn create_folder(&self, folder_path: &str) -> Result<ActionHandle> {
        self.folder_action(catalog::CREATE_FOLDER, folder_path)
    }

    pub fn delete_file(&self, file_path: &str) -> Result<ActionHandle> {
        self.file_action(catalog::DELETE_FILE, file_path)
    }

    pub fn delete_folder(&self, folder_path: &str) -> Result<ActionHandle> {
        self.folder_action(catalog::DELETE_FOLDER, folder_path)
    }

    pub fn read_file(&self, file_path: &str) -> Result<ActionHandle> {
        self.file_action(catalog::READ_FILE, file_path)
    }

    /// Write `content` to `file_path`, creating the file if needed.
    pub fn write_file(&self, file_path: &str, content: &str, mode: WriteMode) -> Result<ActionHandle> {
        let spec = catalog::WRITE_FILE;
        require_non_empty(spec.id, "file_path", file_path)?;
        self.send(
            spec,
            json!({ "file_path": file_path, "content": content, "mode": mode }),
        )
    }

    pub fn check_is_file(&self, file_path: &str) -> Result<ActionHandle> {
        self.file_action(catalog::CHECK_IS_FILE, file_path)
    }

    pub fn check_is_folder(&self, folder_path: &str) -> Result<ActionHandle> {
        self.folder_action(catalog::CHECK_IS_FOLDER, folder_path)
    }

    pub fn check_folder_exist(&self, folder_path: &str) -> Result<ActionHandle> {
        self.folder_action(catalog::CHECK_FOLDER_EXIST, folder_path)
    }

    pub fn check_file_exist(&self, file_path: &str) -> Result<ActionHandle> {
        self.file_action(catalog::CHECK_FILE_EXIST, file_path)
    }

    pub fn list_child_files(&self, folder_path: &str) -> Result<ActionHandle> {
        self.folder_action(catalog::LIST_CHILD_FILES, folder_path)
    }

    /// Remove every image from the media gallery.
    pub fn delete_all_image_gallery(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::DELETE_ALL_IMAGE_GALLERY)
    }

    /// Add an image file already on the device to the gallery.
    pub fn insert_image_gallery(&self, file_path: &str) -> Result<ActionHandle> {
        self.file_action(catalog::INSERT_IMAGE_GALLERY, file_path)
    }

    fn file_action(&self, spec: catalog::ActionSpec, file_path: &str) -> Result<ActionHandle> {
        require_non_empty(spec.id, "file_path", file_path)?;
        self.send(spec, json!({ "file_path": file_path }))
    }

    fn folder_action(&self, spec: catalog::ActionSpec, folder_path: &str) -> Result<ActionHandle> {
        require_non_empty(spec.id, "folder_path", folder_path)?;
        self.send(spec, json!({ "folder_path": folder_path }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_write_file_payload() {
        let (actions, mut outbound) = subscribed_actions();
        actions
            .write_file("/sdcard/file.txt", "Hello World", WriteMode::Overwrite)
            .unwrap();

        assert_eq!(
            next_payload(&mut outbound)["args"],
            json!({"file_path": "/sdcard/file.txt", "content": "Hello World", "mode": "Overwrite"})
        );
    }

    #[tokio::test]
    async fn test_folder_actions_use_folder_path() {
        let (actions, mut outbound) = subscribed_actions();
        actions.list_child_files("/sdcard/DCIM").unwrap();

        let payload = next_payload(&mut outbound);
        assert_eq!(payload["action_id"], "list_child_files");
        assert_eq!(payload["args"], json!({"folder_path": "/sdcard/DCIM"}));
    }

    #[tokio::test]
    async fn test_paths_must_not_be_empty() {
        let (actions, mut outbound) = subscribed_actions();
        assert!(actions.delete_file("").is_err());
        assert!(actions.create_folder("").is_err());
        assert!(actions.write_file("", "x", WriteMode::Append).is_err());
        assert!(outbound.try_recv().is_err());
    }
}
