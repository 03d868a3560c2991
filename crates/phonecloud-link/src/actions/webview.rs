//! WebView control for the top activity.

use serde_json::json;

use phonecloud_core::prelude::*;

use super::catalog;
use super::params::{require_non_empty, require_url};
use super::DeviceActions;
use crate::correlator::ActionHandle;

impl DeviceActions {
    /// Url, title and HTML of the page shown in the top WebView.
    pub fn get_webview_page_source(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::GET_WEBVIEW_PAGE_SOURCE)
    }

    pub fn evaluate_javascript_in_webview(&self, javascript: &str) -> Result<ActionHandle> {
        let spec = catalog::EVALUATE_JAVASCRIPT_IN_WEBVIEW;
        require_non_empty(spec.id, "javascript", javascript)?;
        self.send(spec, json!({ "javascript": javascript }))
    }

    pub fn go_to_url_in_webview(&self, url: &str) -> Result<ActionHandle> {
        let spec = catalog::GO_TO_URL_IN_WEBVIEW;
        require_url(spec.id, url)?;
        self.send(spec, json!({ "url": url }))
    }

    pub fn reload_page_in_webview(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::RELOAD_PAGE_IN_WEBVIEW)
    }

    pub fn go_back_in_webview(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::GO_BACK_IN_WEBVIEW)
    }

    pub fn go_forward_in_webview(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::GO_FORWARD_IN_WEBVIEW)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_evaluate_javascript_payload() {
        let (actions, mut outbound) = subscribed_actions();
        actions
            .evaluate_javascript_in_webview("document.title")
            .unwrap();

        let payload = next_payload(&mut outbound);
        assert_eq!(payload["action_id"], "evaluate_javascript_in_webview");
        assert_eq!(payload["args"], json!({"javascript": "document.title"}));
    }

    #[tokio::test]
    async fn test_go_to_url_requires_valid_url() {
        let (actions, _outbound) = subscribed_actions();
        assert!(actions.go_to_url_in_webview("www.google.com").is_err());
        assert!(actions.go_to_url_in_webview("https://www.google.com").is_ok());
    }
}
