//! Typed facade over the device action vocabulary.
//!
//! [`DeviceActions`] binds a [`RequestCorrelator`] to one device. Each method
//! validates its parameters, applies the action's default deadline (unless
//! overridden with [`DeviceActions::with_timeout`]) and returns an
//! [`ActionHandle`] that resolves to an [`ActionResult`].
//!
//! Two layers of failure exist:
//! - the method returns `Err` synchronously for invalid parameters or when the
//!   device has no live subscription; nothing is sent in that case;
//! - the handle resolves to a failed result for remote failures and timeouts.
//!
//! ```ignore
//! let actions = DeviceActions::new(correlator, "device-1");
//! let result = actions.open_app("com.android.chrome")?.await;
//! if !result.status {
//!     warn!("open_app failed: {:?}", result.error);
//! }
//! ```
//!
//! Methods are grouped by concern in submodules: [`app`], [`webview`],
//! [`device`], [`input`], [`screen`], [`finder`], [`proxy`], [`system`],
//! [`files`] and [`backup`].
//!
//! [`ActionResult`]: phonecloud_core::ActionResult

pub mod app;
pub mod backup;
pub mod catalog;
pub mod device;
pub mod files;
pub mod finder;
pub mod input;
pub mod params;
pub mod proxy;
pub mod screen;
pub mod system;
pub mod webview;

use std::time::Duration;

use serde_json::{json, Value};

use phonecloud_core::prelude::*;

use crate::correlator::{ActionHandle, RequestCorrelator};
use catalog::ActionSpec;

pub use catalog::DEFAULT_ACTION_TIMEOUT;
pub use params::{
    AppListKind, CommandPermission, CoordinateKind, NodeLocator, ProxyKind, ProxySettings,
    RetryPolicy, ScrollDirection, WriteMode,
};

/// Action invoker bound to one device.
///
/// Cheap to clone; all clones share the session's correlator.
#[derive(Debug, Clone)]
pub struct DeviceActions {
    correlator: RequestCorrelator,
    device_id: String,
    timeout_override: Option<Duration>,
}

impl DeviceActions {
    pub fn new(correlator: RequestCorrelator, device_id: impl Into<String>) -> Self {
        Self {
            correlator,
            device_id: device_id.into(),
            timeout_override: None,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn correlator(&self) -> &RequestCorrelator {
        &self.correlator
    }

    /// A copy of this invoker whose calls use `timeout` instead of each
    /// action's default deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout_override: Some(timeout),
            ..self.clone()
        }
    }

    /// Send any action by wire id.
    ///
    /// `args` must be a JSON object (or null, sent as `{}`). Without an
    /// explicit `timeout` the catalog default for `action_id` applies, or
    /// [`DEFAULT_ACTION_TIMEOUT`] for uncatalogued ids.
    pub fn invoke(
        &self,
        action_id: &str,
        args: Value,
        timeout: Option<Duration>,
    ) -> Result<ActionHandle> {
        params::require_non_empty(action_id, "action_id", action_id)?;
        let args = match args {
            Value::Null => json!({}),
            Value::Object(_) => args,
            _ => {
                return Err(Error::invalid_argument(
                    action_id,
                    "arguments must be a JSON object",
                ))
            }
        };
        let timeout = timeout
            .or(self.timeout_override)
            .unwrap_or_else(|| catalog::default_timeout_for(action_id));
        self.correlator
            .send_action(&self.device_id, action_id, args, timeout)
    }

    /// Send a catalogued action with its default (or overridden) deadline.
    pub(crate) fn send(&self, spec: ActionSpec, args: Value) -> Result<ActionHandle> {
        let timeout = self.timeout_override.unwrap_or(spec.default_timeout);
        self.correlator
            .send_action(&self.device_id, spec.id, args, timeout)
    }

    /// Send a catalogued action that takes no arguments.
    pub(crate) fn send_empty(&self, spec: ActionSpec) -> Result<ActionHandle> {
        self.send(spec, json!({}))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::Value;
    use tokio::sync::mpsc;

    use phonecloud_core::{Device, DeviceStatus};

    use super::DeviceActions;
    use crate::correlator::RequestCorrelator;
    use crate::protocol::SubscriptionPayload;
    use crate::registry::DeviceRegistry;

    /// Invoker for a subscribed device `d1`, plus the outbound frame queue.
    pub fn subscribed_actions() -> (DeviceActions, mpsc::UnboundedReceiver<String>) {
        let registry =
            DeviceRegistry::with_devices([Device::new("d1", "One").with_status(DeviceStatus::Disconnected)]);
        registry.upsert_from_subscribe(&SubscriptionPayload {
            device_id: "d1".into(),
            subscription_id: "s1".into(),
        });
        let (correlator, outbound) = RequestCorrelator::new_for_test(registry);
        (DeviceActions::new(correlator, "d1"), outbound)
    }

    /// Pop the next outbound frame and return its `ACTION_CONTROL` payload.
    pub fn next_payload(outbound: &mut mpsc::UnboundedReceiver<String>) -> Value {
        let frame = outbound.try_recv().expect("expected an outbound frame");
        let value: Value = serde_json::from_str(&frame).expect("frame is JSON");
        value["payload"].clone()
    }
}
