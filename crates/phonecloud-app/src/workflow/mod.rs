//! Workflows: device automation scripts run under the retry harness.
//!
//! A workflow drives one device through [`WorkflowContext`]. Any error it
//! returns is treated as transient by [`crate::retry::RetryHarness`].

pub mod random;
pub mod scripted;

use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;

use phonecloud_core::prelude::*;
use phonecloud_core::{ActionResult, SessionEvent};
use phonecloud_link::{DeviceActions, DeviceRegistry};

pub use random::{random_number, random_string, RandomStringOptions};
pub use scripted::{Expectation, ScriptedWorkflow, WorkflowStep};

/// A unit of device automation.
///
/// Implement [`Workflow`] (the `Send` variant) so the runner can drive the
/// workflow from a spawned task.
#[trait_variant::make(Workflow: Send)]
pub trait LocalWorkflow {
    /// Display name used in events and logs
    fn name(&self) -> &str;

    /// Run one pass from the beginning.
    async fn run(&self, ctx: &WorkflowContext) -> Result<()>;
}

/// Everything a workflow needs to drive one device.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    actions: DeviceActions,
}

impl WorkflowContext {
    pub fn new(actions: DeviceActions) -> Self {
        Self { actions }
    }

    pub fn device_id(&self) -> &str {
        self.actions.device_id()
    }

    /// Typed action vocabulary for this device.
    pub fn actions(&self) -> &DeviceActions {
        &self.actions
    }

    pub fn registry(&self) -> &DeviceRegistry {
        self.actions.correlator().registry()
    }

    /// Report progress: updates the device's action label and emits
    /// [`SessionEvent::ActionLabel`].
    pub fn report(&self, label: impl Into<String>) {
        let label = label.into();
        self.registry().set_action_label(self.device_id(), label.clone());
        self.emit(SessionEvent::ActionLabel {
            device_id: self.device_id().to_string(),
            label,
        });
    }

    /// Publish a session event. Having no subscribers is not an error.
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.actions.correlator().event_sender().send(event);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.actions.correlator().events()
    }

    /// Invoke an action by wire id and wait for its result.
    ///
    /// Validation and session errors are returned as `Err`; remote failures
    /// and timeouts come back as a failed [`ActionResult`].
    pub async fn invoke(
        &self,
        action_id: &str,
        args: Value,
        timeout: Option<Duration>,
    ) -> Result<ActionResult> {
        let handle = self.actions.invoke(action_id, args, timeout)?;
        Ok(handle.await)
    }

    /// Like [`invoke`](Self::invoke), but a failed result becomes
    /// [`Error::ActionFailed`].
    pub async fn require(&self, action_id: &str, args: Value) -> Result<Value> {
        self.invoke(action_id, args, None)
            .await?
            .into_result(action_id)
    }

    pub async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Wait until the device holds a live subscription.
    ///
    /// Returns `false` when `timeout` elapses first.
    pub async fn wait_until_subscribed(&self, timeout: Duration) -> bool {
        // Subscribe before checking the registry so a frame arriving in
        // between is not missed.
        let mut events = self.subscribe_events();
        if !self.registry().subscription_id_of(self.device_id()).is_empty() {
            return true;
        }

        let device_id = self.device_id().to_string();
        let registry = self.registry().clone();
        let wait = async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::DeviceSubscribed { device_id: id, .. }) if id == device_id => {
                        return true;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Subscription wait lagged by {} events", skipped);
                        if !registry.subscription_id_of(&device_id).is_empty() {
                            return true;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => return false,
                }
            }
        };

        tokio::time::timeout(timeout, wait).await.unwrap_or(false)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use phonecloud_core::{Device, DeviceStatus};
    use phonecloud_link::protocol::SubscriptionPayload;
    use phonecloud_link::RequestCorrelator;
    use tokio::sync::mpsc;

    use super::*;

    /// Context for device `d1`, subscribed as `s1`, with the outbound frame
    /// receiver standing in for the transport.
    pub fn subscribed_context() -> (WorkflowContext, mpsc::UnboundedReceiver<String>) {
        let registry =
            DeviceRegistry::with_devices([Device::new("d1", "One").with_status(DeviceStatus::Disconnected)]);
        registry.upsert_from_subscribe(&SubscriptionPayload {
            device_id: "d1".to_string(),
            subscription_id: "s1".to_string(),
        });
        let (correlator, outbound) = RequestCorrelator::new_for_test(registry);
        (
            WorkflowContext::new(DeviceActions::new(correlator, "d1")),
            outbound,
        )
    }

    /// Reply to the next outbound action frame.
    pub fn reply_next(
        ctx: &WorkflowContext,
        outbound: &mut mpsc::UnboundedReceiver<String>,
        status: bool,
        result: Value,
        error: Option<&str>,
    ) -> Value {
        let frame: Value = serde_json::from_str(&outbound.try_recv().unwrap()).unwrap();
        let payload = frame["payload"].clone();
        let completion = phonecloud_link::CompletionPayload::from_message(&serde_json::json!({
            "request_id": payload["request_id"],
            "status": status,
            "result": result,
            "error": error,
        }))
        .unwrap();
        assert!(ctx.actions().correlator().complete(completion));
        payload
    }
}
