//! Fleet runner: one retry harness per device, all sharing one session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use phonecloud_core::prelude::*;

use crate::retry::{run_with_retry, shutdown_requested, HarnessOutcome, HarnessPolicy};
use crate::session::Session;
use crate::workflow::{Workflow, WorkflowContext};

/// How long a device task waits for its subscription before starting the
/// workflow anyway. The harness absorbs the resulting session errors.
pub const DEFAULT_SUBSCRIBE_WAIT: Duration = Duration::from_secs(30);

/// Final outcome for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReport {
    pub device_id: String,
    pub outcome: HarnessOutcome,
}

/// Runs the same workflow on many devices concurrently.
#[derive(Debug)]
pub struct FleetRunner<W> {
    workflow: Arc<W>,
    policy: HarnessPolicy,
    subscribe_wait: Duration,
}

impl<W> FleetRunner<W>
where
    W: Workflow + Send + Sync + 'static,
{
    pub fn new(workflow: W, policy: HarnessPolicy) -> Self {
        Self {
            workflow: Arc::new(workflow),
            policy,
            subscribe_wait: DEFAULT_SUBSCRIBE_WAIT,
        }
    }

    pub fn with_subscribe_wait(mut self, wait: Duration) -> Self {
        self.subscribe_wait = wait;
        self
    }

    /// Run on every selected device of `session` and wait for all of them.
    pub async fn run_selected(&self, session: &Session) -> Vec<DeviceReport> {
        let device_ids = session.registry().selected();
        self.run(session, &device_ids).await
    }

    /// Run on `device_ids` and wait for all of them.
    pub async fn run(&self, session: &Session, device_ids: &[String]) -> Vec<DeviceReport> {
        let contexts = device_ids
            .iter()
            .map(|id| session.context_for(id.clone()))
            .collect();
        self.run_contexts(contexts, session.shutdown_signal()).await
    }

    /// Run one task per context and wait for all of them.
    pub async fn run_contexts(
        &self,
        contexts: Vec<WorkflowContext>,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<DeviceReport> {
        let tasks = self.spawn_all(contexts, shutdown);
        let mut reports = Vec::with_capacity(tasks.len());

        for (device_id, task) in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("[{}] device task failed: {}", device_id, e);
                    HarnessOutcome::Cancelled
                }
            };
            reports.push(DeviceReport { device_id, outcome });
        }
        reports
    }

    /// Spawn one task per context without waiting.
    pub fn spawn_all(
        &self,
        contexts: Vec<WorkflowContext>,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<(String, JoinHandle<HarnessOutcome>)> {
        info!(
            "Starting workflow '{}' on {} device(s)",
            self.workflow.name(),
            contexts.len()
        );

        contexts
            .into_iter()
            .map(|ctx| {
                let device_id = ctx.device_id().to_string();
                let task = self.spawn_device(ctx, shutdown.clone());
                (device_id, task)
            })
            .collect()
    }

    fn spawn_device(
        &self,
        ctx: WorkflowContext,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<HarnessOutcome> {
        let workflow = Arc::clone(&self.workflow);
        let policy = self.policy;
        let wait = self.subscribe_wait;

        tokio::spawn(async move {
            tokio::select! {
                subscribed = ctx.wait_until_subscribed(wait) => {
                    if !subscribed {
                        warn!(
                            "[{}] no subscription after {:?}, starting anyway",
                            ctx.device_id(),
                            wait
                        );
                    }
                }
                _ = shutdown_requested(&mut shutdown) => return HarnessOutcome::Cancelled,
            }

            run_with_retry(workflow.as_ref(), &ctx, policy, &mut shutdown).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::test_support::subscribed_context;
    use phonecloud_core::{Device, DeviceStatus, SessionEvent};

    struct Named {
        fail_on: &'static str,
    }

    impl Workflow for Named {
        fn name(&self) -> &str {
            "named"
        }

        async fn run(&self, ctx: &WorkflowContext) -> Result<()> {
            ctx.report("working");
            if ctx.device_id() == self.fail_on {
                Err(Error::workflow("bad device"))
            } else {
                Ok(())
            }
        }
    }

    fn context_for(device_id: &str) -> WorkflowContext {
        let (ctx, _outbound) = subscribed_context();
        let actions = phonecloud_link::DeviceActions::new(ctx.actions().correlator().clone(), device_id);
        ctx.registry()
            .seed([Device::new(device_id, device_id).with_status(DeviceStatus::Disconnected)]);
        ctx.registry().upsert_from_subscribe(&phonecloud_link::SubscriptionPayload {
            device_id: device_id.to_string(),
            subscription_id: format!("sub-{}", device_id),
        });
        WorkflowContext::new(actions)
    }

    #[tokio::test]
    async fn test_devices_run_independently() {
        let (_tx, shutdown) = watch::channel(false);
        let runner = FleetRunner::new(
            Named { fail_on: "d1" },
            HarnessPolicy::new(2, Duration::from_millis(1)),
        )
        .with_subscribe_wait(Duration::from_millis(50));

        let reports = runner
            .run_contexts(vec![subscribed_context().0, context_for("d2")], shutdown)
            .await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].device_id, "d1");
        assert!(reports[0].outcome.is_exhausted());
        assert_eq!(reports[1].device_id, "d2");
        assert_eq!(reports[1].outcome, HarnessOutcome::Completed);
    }

    #[tokio::test]
    async fn test_unsubscribed_device_starts_after_wait() {
        let (_tx, shutdown) = watch::channel(false);
        let ctx = context_for("d2");
        ctx.registry().reset_subscriptions();
        let mut events = ctx.subscribe_events();

        let runner = FleetRunner::new(
            Named { fail_on: "none" },
            HarnessPolicy::new(1, Duration::from_millis(1)),
        )
        .with_subscribe_wait(Duration::from_millis(10));

        let reports = runner.run_contexts(vec![ctx], shutdown).await;
        assert_eq!(reports[0].outcome, HarnessOutcome::Completed);

        let mut started = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SessionEvent::WorkflowStarted { ref device_id, .. } if device_id == "d2") {
                started = true;
            }
        }
        assert!(started);
    }

    #[tokio::test]
    async fn test_shutdown_before_subscription_cancels() {
        let (tx, shutdown) = watch::channel(false);
        let ctx = context_for("d2");
        ctx.registry().reset_subscriptions();

        let runner = FleetRunner::new(Named { fail_on: "none" }, HarnessPolicy::default());
        let tasks = runner.spawn_all(vec![ctx], shutdown);
        tx.send(true).unwrap();

        for (_, task) in tasks {
            assert_eq!(task.await.unwrap(), HarnessOutcome::Cancelled);
        }
    }
}
