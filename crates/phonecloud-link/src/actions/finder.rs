//! Locating nodes, colors and images on screen.
//!
//! Finder actions retry on the device itself according to a [`RetryPolicy`];
//! the request deadline should exceed `count * after_ms`.

use serde_json::json;

use phonecloud_core::prelude::*;

use super::catalog;
use super::params::{require_non_empty, NodeLocator, RetryPolicy, ScrollDirection};
use super::DeviceActions;
use crate::correlator::ActionHandle;

impl DeviceActions {
    /// Find the `position`-th node (0-based) matching `keyword`.
    pub fn find_node(
        &self,
        locator: NodeLocator,
        keyword: &str,
        position: u32,
        retry: RetryPolicy,
    ) -> Result<ActionHandle> {
        let spec = catalog::FIND_NODE;
        require_non_empty(spec.id, "keyword", keyword)?;
        self.send(
            spec,
            json!({
                "type": locator,
                "keyword": keyword,
                "position": position,
                "retry": retry,
            }),
        )
    }

    /// Find every node matching `keyword`.
    pub fn find_nodes(
        &self,
        locator: NodeLocator,
        keyword: &str,
        retry: RetryPolicy,
    ) -> Result<ActionHandle> {
        self.locator_action(catalog::FIND_NODES, locator, keyword, retry)
    }

    pub fn find_node_exist(
        &self,
        locator: NodeLocator,
        keyword: &str,
        retry: RetryPolicy,
    ) -> Result<ActionHandle> {
        self.locator_action(catalog::FIND_NODE_EXIST, locator, keyword, retry)
    }

    pub fn find_node_and_click(
        &self,
        locator: NodeLocator,
        keyword: &str,
        position: u32,
        retry: RetryPolicy,
    ) -> Result<ActionHandle> {
        let spec = catalog::FIND_NODE_AND_CLICK;
        require_non_empty(spec.id, "keyword", keyword)?;
        self.send(
            spec,
            json!({
                "type": locator,
                "keyword": keyword,
                "position": position,
                "retry": retry,
            }),
        )
    }

    /// Find a node and swipe on it. Smaller `swipe_time_ms` swipes faster.
    pub fn find_node_and_scroll(
        &self,
        locator: NodeLocator,
        keyword: &str,
        position: u32,
        direction: ScrollDirection,
        swipe_time_ms: u64,
        retry: RetryPolicy,
    ) -> Result<ActionHandle> {
        let spec = catalog::FIND_NODE_AND_SCROLL;
        require_non_empty(spec.id, "keyword", keyword)?;
        if swipe_time_ms == 0 {
            return Err(Error::invalid_argument(spec.id, "swipe_time must be positive"));
        }
        self.send(
            spec,
            json!({
                "type": locator,
                "keyword": keyword,
                "position": position,
                "scroll_type": direction,
                "swipe_time": swipe_time_ms,
                "retry": retry,
            }),
        )
    }

    pub fn find_color_and_click(&self, color: &str, retry: RetryPolicy) -> Result<ActionHandle> {
        self.color_action(catalog::FIND_COLOR_AND_CLICK, color, retry)
    }

    pub fn find_color_exist(&self, color: &str, retry: RetryPolicy) -> Result<ActionHandle> {
        self.color_action(catalog::FIND_COLOR_EXIST, color, retry)
    }

    pub fn find_color(&self, color: &str, retry: RetryPolicy) -> Result<ActionHandle> {
        self.color_action(catalog::FIND_COLOR, color, retry)
    }

    /// Template-match a base64-encoded image against the screen.
    pub fn find_image(&self, base64_image: &str, retry: RetryPolicy) -> Result<ActionHandle> {
        let spec = catalog::FIND_IMAGE;
        require_non_empty(spec.id, "base64_image", base64_image)?;
        self.send(
            spec,
            json!({ "base64_image": base64_image, "retry": retry }),
        )
    }

    fn locator_action(
        &self,
        spec: catalog::ActionSpec,
        locator: NodeLocator,
        keyword: &str,
        retry: RetryPolicy,
    ) -> Result<ActionHandle> {
        require_non_empty(spec.id, "keyword", keyword)?;
        self.send(
            spec,
            json!({ "type": locator, "keyword": keyword, "retry": retry }),
        )
    }

    fn color_action(
        &self,
        spec: catalog::ActionSpec,
        color: &str,
        retry: RetryPolicy,
    ) -> Result<ActionHandle> {
        require_non_empty(spec.id, "color", color)?;
        self.send(spec, json!({ "color": color, "retry": retry }))
    }
}
