//! Session context: one party-channel connection plus the shutdown signal
//! shared by every device task started on it.

use tokio::sync::{broadcast, watch};

use phonecloud_core::prelude::*;
use phonecloud_core::SessionEvent;
use phonecloud_link::{
    ConnectionConfig, ConnectionManager, DeviceActions, DeviceRegistry, RequestCorrelator,
};

use crate::config::Settings;
use crate::workflow::WorkflowContext;

/// A running control-plane session.
///
/// Created by [`start`](Self::start), torn down by [`stop`](Self::stop).
/// Nothing outlives the session: stopping it ends every device task,
/// closes the transport and fails in-flight requests.
#[derive(Debug)]
pub struct Session {
    manager: ConnectionManager,
    shutdown_tx: watch::Sender<bool>,
}

impl Session {
    /// Connect and start the session.
    ///
    /// Subscribe to `events` before calling to observe the initial
    /// [`SessionEvent::Connected`].
    pub async fn start(
        config: ConnectionConfig,
        registry: DeviceRegistry,
        events: broadcast::Sender<SessionEvent>,
    ) -> Result<Self> {
        info!(
            "Starting session for {} device(s) at {}",
            registry.len(),
            config.endpoint
        );
        let manager = ConnectionManager::connect(config, registry, events)
            .await
            .context("Failed to open the party channel")?;
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            manager,
            shutdown_tx,
        })
    }

    /// Start a session from project settings, seeding the registry with the
    /// configured devices.
    pub async fn from_settings(
        settings: &Settings,
        access_token: &str,
        events: broadcast::Sender<SessionEvent>,
    ) -> Result<Self> {
        let registry = DeviceRegistry::with_devices(settings.devices.iter().cloned());

        let config = settings.connection.to_connection_config(access_token);
        Self::start(config, registry, events).await
    }

    pub fn registry(&self) -> &DeviceRegistry {
        self.manager.registry()
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn correlator(&self) -> RequestCorrelator {
        self.manager.correlator()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.manager.events()
    }

    /// Action facade bound to `device_id`.
    pub fn actions_for(&self, device_id: impl Into<String>) -> DeviceActions {
        DeviceActions::new(self.correlator(), device_id)
    }

    pub fn context_for(&self, device_id: impl Into<String>) -> WorkflowContext {
        WorkflowContext::new(self.actions_for(device_id))
    }

    /// Receiver that turns true when the session stops.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Stop every device task, close the transport and fail in-flight
    /// requests. Calling this twice is harmless.
    pub async fn stop(&self) {
        if self.shutdown_tx.send_replace(true) {
            return;
        }
        info!("Stopping session");
        self.manager.disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_fails_on_unreachable_endpoint() {
        let (events, _) = broadcast::channel(8);
        let config = ConnectionConfig::new("ws://127.0.0.1:1/ws/party", "token");

        let result = Session::start(config, DeviceRegistry::new(), events).await;
        assert!(matches!(result, Err(Error::Transport { .. })));
    }

    #[tokio::test]
    async fn test_from_settings_rejects_bad_endpoint() {
        let mut settings = Settings::default();
        settings.connection.endpoint = "http://example.com".to_string();
        let (events, _) = broadcast::channel(8);

        let result = Session::from_settings(&settings, "token", events).await;
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
