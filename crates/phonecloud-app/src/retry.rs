//! Per-device retry harness.
//!
//! Runs a [`Workflow`] for one device, restarting it from the beginning after
//! a failure until `max_retries` consecutive failures stall the device. Each
//! device has its own harness; exhausting one never affects another.

use std::time::Duration;

use tokio::sync::watch;

use phonecloud_core::prelude::*;
use phonecloud_core::SessionEvent;

use crate::workflow::{Workflow, WorkflowContext};

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Action label shown for a device whose harness gave up.
pub const STALLED_LABEL: &str = "Stalled: retries exhausted";

/// How a harness reacts to failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessPolicy {
    /// Consecutive failures that stop the harness (at least 1)
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Run the workflow again after each success
    pub repeat: bool,
}

impl Default for HarnessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

impl HarnessPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            retry_delay,
            repeat: false,
        }
    }

    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }
}

/// Harness lifecycle: Idle → Running → {Idle, Waiting → Running, Stopped}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    /// Not running; the last pass (if any) succeeded
    Idle,
    /// Workflow pass in progress
    Running,
    /// Waiting out the retry delay after a failure
    Waiting,
    /// Terminal: retries exhausted or shutdown requested
    Stopped,
}

/// How [`RetryHarness::run`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessOutcome {
    /// The workflow succeeded (run-once mode).
    Completed,
    /// `attempts` consecutive failures; the device is stalled.
    Exhausted { attempts: u32, last_error: String },
    /// Shutdown was requested.
    Cancelled,
}

impl HarnessOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, HarnessOutcome::Completed)
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, HarnessOutcome::Exhausted { .. })
    }
}

/// Retry state for one device.
#[derive(Debug)]
pub struct RetryHarness {
    policy: HarnessPolicy,
    state: HarnessState,
    attempts: u32,
}

impl RetryHarness {
    pub fn new(policy: HarnessPolicy) -> Self {
        Self {
            policy,
            state: HarnessState::Idle,
            attempts: 0,
        }
    }

    pub fn state(&self) -> HarnessState {
        self.state
    }

    /// Consecutive failures since the last success.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> HarnessPolicy {
        self.policy
    }

    /// Drive `workflow` on `ctx`'s device until it completes, exhausts its
    /// retries, or `shutdown` turns true.
    ///
    /// Every error returned by the workflow is treated as transient.
    pub async fn run<W>(
        &mut self,
        workflow: &W,
        ctx: &WorkflowContext,
        shutdown: &mut watch::Receiver<bool>,
    ) -> HarnessOutcome
    where
        W: Workflow + ?Sized,
    {
        let device_id = ctx.device_id().to_string();
        let name = workflow.name().to_string();

        loop {
            if *shutdown.borrow() {
                return self.cancel(&device_id);
            }

            self.state = HarnessState::Running;
            ctx.emit(SessionEvent::WorkflowStarted {
                device_id: device_id.clone(),
                workflow: name.clone(),
            });

            let result = tokio::select! {
                result = workflow.run(ctx) => result,
                _ = shutdown_requested(shutdown) => return self.cancel(&device_id),
            };

            match result {
                Ok(()) => {
                    self.attempts = 0;
                    info!("[{}] workflow '{}' succeeded", device_id, name);
                    ctx.emit(SessionEvent::WorkflowSucceeded {
                        device_id: device_id.clone(),
                        workflow: name.clone(),
                    });
                    if !self.policy.repeat {
                        self.state = HarnessState::Idle;
                        return HarnessOutcome::Completed;
                    }
                }
                Err(e) => {
                    self.attempts += 1;
                    let error = e.to_string();
                    if e.is_recoverable() {
                        warn!(
                            "[{}] workflow '{}' failed (attempt {}/{}): {}",
                            device_id, name, self.attempts, self.policy.max_retries, error
                        );
                    } else {
                        error!(
                            "[{}] workflow '{}' failed (attempt {}/{}): {:?}",
                            device_id, name, self.attempts, self.policy.max_retries, e
                        );
                    }
                    ctx.emit(SessionEvent::WorkflowFailed {
                        device_id: device_id.clone(),
                        workflow: name.clone(),
                        attempt: self.attempts,
                        max_retries: self.policy.max_retries,
                        error: error.clone(),
                    });

                    if self.attempts >= self.policy.max_retries {
                        return self.exhaust(ctx, &device_id, &name, error);
                    }

                    self.state = HarnessState::Waiting;
                    tokio::select! {
                        _ = tokio::time::sleep(self.policy.retry_delay) => {}
                        _ = shutdown_requested(shutdown) => return self.cancel(&device_id),
                    }
                }
            }
        }
    }

    fn exhaust(
        &mut self,
        ctx: &WorkflowContext,
        device_id: &str,
        name: &str,
        last_error: String,
    ) -> HarnessOutcome {
        self.state = HarnessState::Stopped;
        error!(
            "[{}] stopping workflow '{}' after {} consecutive failures",
            device_id, name, self.attempts
        );
        ctx.report(STALLED_LABEL);
        ctx.emit(SessionEvent::RetriesExhausted {
            device_id: device_id.to_string(),
            workflow: name.to_string(),
            attempts: self.attempts,
            last_error: last_error.clone(),
        });
        HarnessOutcome::Exhausted {
            attempts: self.attempts,
            last_error,
        }
    }

    fn cancel(&mut self, device_id: &str) -> HarnessOutcome {
        debug!("[{}] harness cancelled", device_id);
        self.state = HarnessState::Stopped;
        HarnessOutcome::Cancelled
    }
}

/// Run `workflow` once under a fresh harness.
pub async fn run_with_retry<W>(
    workflow: &W,
    ctx: &WorkflowContext,
    policy: HarnessPolicy,
    shutdown: &mut watch::Receiver<bool>,
) -> HarnessOutcome
where
    W: Workflow + ?Sized,
{
    RetryHarness::new(policy).run(workflow, ctx, shutdown).await
}

/// Resolves once the shutdown flag is true. Never resolves if the sender is
/// gone without having signalled.
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
