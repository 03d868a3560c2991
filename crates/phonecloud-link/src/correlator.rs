//! Request/response correlation over the multiplexed connection.
//!
//! [`RequestCorrelator`] assigns each outbound action a fresh request id,
//! parks a deadline-guarded waiter for it, and resolves the waiter when a
//! reply carrying the same id arrives. Replies are matched purely by id; the
//! order in which they arrive is irrelevant.
//!
//! Both resolution paths (reply and deadline) remove the pending entry under
//! the same mutex, so each request resolves exactly once and whichever path
//! loses the race becomes a no-op.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use phonecloud_core::prelude::*;
use phonecloud_core::{ActionResult, SessionEvent};

use crate::protocol::{ActionEnvelope, CompletionPayload};
use crate::registry::DeviceRegistry;

// ---------------------------------------------------------------------------
// Request ids
// ---------------------------------------------------------------------------

/// How request ids are generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestIdGenerator {
    /// Random UUID v4.
    #[default]
    Uuid,
    /// Process-wide counter; for hosts without a usable random source.
    Sequential,
}

/// Process-wide counter backing [`RequestIdGenerator::Sequential`].
static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

impl RequestIdGenerator {
    pub fn next_id(&self) -> String {
        match self {
            RequestIdGenerator::Uuid => uuid::Uuid::new_v4().to_string(),
            RequestIdGenerator::Sequential => format!(
                "req-{}",
                REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionHandle
// ---------------------------------------------------------------------------

/// Completion handle for one outbound action.
///
/// Resolves to the [`ActionResult`] delivered by the reply, the deadline, or
/// session teardown. Never resolves to an error.
#[derive(Debug)]
pub struct ActionHandle {
    request_id: String,
    rx: oneshot::Receiver<ActionResult>,
}

impl ActionHandle {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Future for ActionHandle {
    type Output = ActionResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let request_id = self.request_id.clone();
        Pin::new(&mut self.rx).poll(cx).map(|result| {
            result.unwrap_or_else(|_| {
                ActionResult::failure(format!("Request cancelled: {}", request_id))
            })
        })
    }
}

// ---------------------------------------------------------------------------
// RequestCorrelator
// ---------------------------------------------------------------------------

/// A request waiting for its reply.
struct PendingRequest {
    tx: oneshot::Sender<ActionResult>,
    timer: JoinHandle<()>,
    created_at: Instant,
    device_id: String,
    action_id: String,
}

struct Inner {
    pending: Mutex<HashMap<String, PendingRequest>>,
    registry: DeviceRegistry,
    outbound: mpsc::UnboundedSender<String>,
    events: broadcast::Sender<SessionEvent>,
    ids: RequestIdGenerator,
}

/// Clonable handle to the session's single correlator.
#[derive(Clone)]
pub struct RequestCorrelator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RequestCorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCorrelator")
            .field("pending", &self.pending_count())
            .field("ids", &self.inner.ids)
            .finish()
    }
}

impl RequestCorrelator {
    /// Create a correlator writing frames to `outbound`.
    pub fn new(
        registry: DeviceRegistry,
        outbound: mpsc::UnboundedSender<String>,
        events: broadcast::Sender<SessionEvent>,
        ids: RequestIdGenerator,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(HashMap::new()),
                registry,
                outbound,
                events,
                ids,
            }),
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.inner.registry
    }

    /// Subscribe to session events published by this correlator and the
    /// connection it serves.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Sender side of the session event channel, for layers that publish their own events.
    pub fn event_sender(&self) -> &broadcast::Sender<SessionEvent> {
        &self.inner.events
    }

    /// Send `action_id` with `args` to `device_id`.
    ///
    /// Fails with [`Error::Session`] before writing anything if the device has
    /// no subscription id. Otherwise the returned handle resolves with the
    /// reply, or with a timeout result once `timeout` elapses.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn send_action(
        &self,
        device_id: &str,
        action_id: &str,
        args: Value,
        timeout: Duration,
    ) -> Result<ActionHandle> {
        let subscription_id = self.inner.registry.subscription_id_of(device_id);
        if subscription_id.is_empty() {
            return Err(Error::session(device_id));
        }

        let request_id = self.inner.ids.next_id();
        let frame = ActionEnvelope::new(subscription_id, request_id.clone(), action_id, args)
            .to_frame()?;
        let (tx, rx) = oneshot::channel();

        // Register the waiter before touching the wire so the slot exists if
        // the reply races the send.
        {
            let mut pending = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());
            let timer = self.spawn_deadline(request_id.clone(), timeout);
            pending.insert(
                request_id.clone(),
                PendingRequest {
                    tx,
                    timer,
                    created_at: Instant::now(),
                    device_id: device_id.to_string(),
                    action_id: action_id.to_string(),
                },
            );
        }

        if self.inner.outbound.send(frame).is_err() {
            if let Some(entry) = self.take(&request_id) {
                entry.timer.abort();
            }
            return Err(Error::ChannelClosed);
        }

        trace!(
            "Correlator: sent {} to {} (request {})",
            action_id,
            device_id,
            request_id
        );

        Ok(ActionHandle { request_id, rx })
    }

    /// Resolve the waiter for `completion.request_id`.
    ///
    /// Returns `false` if no request with that id is pending, e.g. because its
    /// deadline already fired.
    pub fn complete(&self, completion: CompletionPayload) -> bool {
        let Some(entry) = self.take(&completion.request_id) else {
            return false;
        };
        entry.timer.abort();

        let request_id = completion.request_id.clone();
        let result = completion.into_action_result();
        debug!(
            "Correlator: {} on {} resolved in {:?} (status={})",
            entry.action_id,
            entry.device_id,
            entry.created_at.elapsed(),
            result.status
        );
        self.publish_completion(&entry, &request_id, &result);
        let _ = entry.tx.send(result);
        true
    }

    /// Resolve every pending request with a failure carrying `reason`.
    ///
    /// Returns the number of requests resolved.
    pub fn cancel_all(&self, reason: &str) -> usize {
        let drained: Vec<(String, PendingRequest)> = {
            let mut pending = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.drain().collect()
        };

        let count = drained.len();
        for (request_id, entry) in drained {
            entry.timer.abort();
            let result = ActionResult::failure(reason);
            self.publish_completion(&entry, &request_id, &result);
            let _ = entry.tx.send(result);
        }
        if count > 0 {
            info!("Correlator: cancelled {} pending request(s): {}", count, reason);
        }
        count
    }

    /// Number of requests still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Deadline path: resolve `request_id` with a timeout result if it is
    /// still pending.
    fn expire(&self, request_id: &str) {
        let Some(entry) = self.take(request_id) else {
            return;
        };

        debug!(
            "Correlator: {} on {} timed out after {:?} (request {})",
            entry.action_id,
            entry.device_id,
            entry.created_at.elapsed(),
            request_id
        );
        let result = ActionResult::timeout(request_id);
        self.publish_completion(&entry, request_id, &result);
        let _ = entry.tx.send(result);
    }

    fn take(&self, request_id: &str) -> Option<PendingRequest> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(request_id)
    }

    fn spawn_deadline(&self, request_id: String, timeout: Duration) -> JoinHandle<()> {
        let correlator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            correlator.expire(&request_id);
        })
    }

    fn publish_completion(&self, entry: &PendingRequest, request_id: &str, result: &ActionResult) {
        let _ = self.inner.events.send(SessionEvent::ActionCompleted {
            device_id: entry.device_id.clone(),
            action_id: entry.action_id.clone(),
            request_id: request_id.to_string(),
            status: result.status,
            timed_out: result.is_timeout(),
        });
    }

    /// Create a correlator whose outbound frames are returned to the caller.
    ///
    /// Intended for tests that play the server side by reading frames and
    /// calling [`complete`](Self::complete).
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn new_for_test(registry: DeviceRegistry) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(64);
        (
            Self::new(registry, outbound_tx, events_tx, RequestIdGenerator::Uuid),
            outbound_rx,
        )
    }
}
