//! Session event definitions
//!
//! Every observable state change of a session is published as a
//! [`SessionEvent`] on a broadcast channel; consumers subscribe instead of
//! registering callbacks.

use serde::Serialize;
use serde_json::Value;

/// Events emitted by a running session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The multiplexed transport is open; all subscription ids were reset.
    Connected,

    /// The transport closed unexpectedly.
    Disconnected { reason: Option<String> },

    /// A reconnect attempt has been scheduled.
    ReconnectScheduled { delay_ms: u64 },

    /// The server announced a subscription for a device.
    DeviceSubscribed {
        device_id: String,
        subscription_id: String,
    },

    /// The server withdrew a device's subscription.
    DeviceUnsubscribed { device_id: String },

    /// A pending action was resolved by a reply or by its deadline.
    ActionCompleted {
        device_id: String,
        action_id: String,
        request_id: String,
        status: bool,
        timed_out: bool,
    },

    /// An inbound message that did not match any pending request.
    DeviceMessage { payload: Value },

    /// A workflow reported progress for a device.
    ActionLabel { device_id: String, label: String },

    /// A workflow run started for a device.
    WorkflowStarted { device_id: String, workflow: String },

    /// A workflow run completed successfully.
    WorkflowSucceeded { device_id: String, workflow: String },

    /// A workflow run failed; the harness will retry if attempts remain.
    WorkflowFailed {
        device_id: String,
        workflow: String,
        attempt: u32,
        max_retries: u32,
        error: String,
    },

    /// The harness gave up on a device.
    RetriesExhausted {
        device_id: String,
        workflow: String,
        attempts: u32,
        last_error: String,
    },
}

impl SessionEvent {
    /// The device this event concerns, if any.
    pub fn device_id(&self) -> Option<&str> {
        match self {
            SessionEvent::DeviceSubscribed { device_id, .. }
            | SessionEvent::DeviceUnsubscribed { device_id }
            | SessionEvent::ActionCompleted { device_id, .. }
            | SessionEvent::ActionLabel { device_id, .. }
            | SessionEvent::WorkflowStarted { device_id, .. }
            | SessionEvent::WorkflowSucceeded { device_id, .. }
            | SessionEvent::WorkflowFailed { device_id, .. }
            | SessionEvent::RetriesExhausted { device_id, .. } => Some(device_id),
            SessionEvent::Connected
            | SessionEvent::Disconnected { .. }
            | SessionEvent::ReconnectScheduled { .. }
            | SessionEvent::DeviceMessage { .. } => None,
        }
    }
}
