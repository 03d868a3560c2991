//! Device session registry.
//!
//! Tracks every known device's subscription id and connection status. The
//! registry is shared between the connection's read loop, the request
//! correlator's send path and any consumer that snapshots device state, so
//! every update happens under one lock.

use std::sync::{Arc, RwLock};

use phonecloud_core::prelude::*;
use phonecloud_core::{Device, DeviceStatus};

use crate::protocol::SubscriptionPayload;

/// Clonable handle to the shared device table.
///
/// Devices keep the order in which they were seeded.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Arc<RwLock<Vec<Device>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with `devices`.
    pub fn with_devices(devices: impl IntoIterator<Item = Device>) -> Self {
        let registry = Self::new();
        registry.seed(devices);
        registry
    }

    /// Insert devices, replacing any entry with the same id.
    pub fn seed(&self, devices: impl IntoIterator<Item = Device>) {
        let mut guard = self.devices.write().unwrap_or_else(|e| e.into_inner());
        for device in devices {
            match guard.iter_mut().find(|d| d.id == device.id) {
                Some(existing) => *existing = device,
                None => guard.push(device),
            }
        }
    }

    /// Apply a `SUBSCRIBE` announcement.
    ///
    /// Returns `false` if the device is not known to this session.
    pub fn upsert_from_subscribe(&self, payload: &SubscriptionPayload) -> bool {
        let mut guard = self.devices.write().unwrap_or_else(|e| e.into_inner());
        match guard.iter_mut().find(|d| d.id == payload.device_id) {
            Some(device) => {
                device.subscription_id = payload.subscription_id.clone();
                device.status = DeviceStatus::Connected;
                true
            }
            None => {
                debug!(
                    "Registry: subscribe for unknown device {}",
                    payload.device_id
                );
                false
            }
        }
    }

    /// Apply an `UNSUBSCRIBE` announcement.
    ///
    /// Returns `false` if the device is not known to this session.
    pub fn clear_from_unsubscribe(&self, payload: &SubscriptionPayload) -> bool {
        let mut guard = self.devices.write().unwrap_or_else(|e| e.into_inner());
        match guard.iter_mut().find(|d| d.id == payload.device_id) {
            Some(device) => {
                device.subscription_id.clear();
                device.status = DeviceStatus::Disconnected;
                true
            }
            None => {
                debug!(
                    "Registry: unsubscribe for unknown device {}",
                    payload.device_id
                );
                false
            }
        }
    }

    /// Current subscription id of `device_id`, or an empty string.
    pub fn subscription_id_of(&self, device_id: &str) -> String {
        let guard = self.devices.read().unwrap_or_else(|e| e.into_inner());
        guard
            .iter()
            .find(|d| d.id == device_id)
            .map(|d| d.subscription_id.clone())
            .unwrap_or_default()
    }

    /// Drop every subscription id; the server re-announces live ones after a
    /// (re)connect. Connected devices become Disconnected.
    pub fn reset_subscriptions(&self) {
        let mut guard = self.devices.write().unwrap_or_else(|e| e.into_inner());
        for device in guard.iter_mut() {
            device.subscription_id.clear();
            if device.status == DeviceStatus::Connected {
                device.status = DeviceStatus::Disconnected;
            }
        }
    }

    /// Ids of every device that is not Pending, in seed order.
    pub fn connectable_ids(&self) -> Vec<String> {
        let guard = self.devices.read().unwrap_or_else(|e| e.into_inner());
        guard
            .iter()
            .filter(|d| d.status != DeviceStatus::Pending)
            .map(|d| d.id.clone())
            .collect()
    }

    /// Update the progress label of a device.
    pub fn set_action_label(&self, device_id: &str, label: impl Into<String>) -> bool {
        let mut guard = self.devices.write().unwrap_or_else(|e| e.into_inner());
        match guard.iter_mut().find(|d| d.id == device_id) {
            Some(device) => {
                device.action = label.into();
                true
            }
            None => false,
        }
    }

    pub fn set_selected(&self, device_id: &str, selected: bool) -> bool {
        let mut guard = self.devices.write().unwrap_or_else(|e| e.into_inner());
        match guard.iter_mut().find(|d| d.id == device_id) {
            Some(device) => {
                device.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Ids of the selected devices, in seed order.
    pub fn selected(&self) -> Vec<String> {
        let guard = self.devices.read().unwrap_or_else(|e| e.into_inner());
        guard
            .iter()
            .filter(|d| d.selected)
            .map(|d| d.id.clone())
            .collect()
    }

    pub fn get(&self, device_id: &str) -> Option<Device> {
        let guard = self.devices.read().unwrap_or_else(|e| e.into_inner());
        guard.iter().find(|d| d.id == device_id).cloned()
    }

    /// Consistent copy of the whole table.
    pub fn snapshot(&self) -> Vec<Device> {
        self.devices
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.devices.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(device_id: &str, id: &str) -> SubscriptionPayload {
        SubscriptionPayload {
            device_id: device_id.to_string(),
            subscription_id: id.to_string(),
        }
    }

    fn registry() -> DeviceRegistry {
        DeviceRegistry::with_devices([
            Device::new("d1", "One").with_status(DeviceStatus::Disconnected),
            Device::new("d2", "Two").with_status(DeviceStatus::Pending),
            Device::new("d3", "Three").with_status(DeviceStatus::Unknown),
        ])
    }

    #[test]
    fn test_subscribe_sets_id_and_status() {
        let registry = registry();
        assert!(registry.upsert_from_subscribe(&sub("d1", "s1")));

        let device = registry.get("d1").unwrap();
        assert_eq!(device.subscription_id, "s1");
        assert_eq!(device.status, DeviceStatus::Connected);
        assert_eq!(registry.subscription_id_of("d1"), "s1");
    }

    #[test]
    fn test_unsubscribe_clears_id() {
        let registry = registry();
        registry.upsert_from_subscribe(&sub("d1", "s1"));
        assert!(registry.clear_from_unsubscribe(&sub("d1", "s1")));

        let device = registry.get("d1").unwrap();
        assert!(device.subscription_id.is_empty());
        assert_eq!(device.status, DeviceStatus::Disconnected);
        assert_eq!(registry.subscription_id_of("d1"), "");
    }

    #[test]
    fn test_unknown_device_is_ignored() {
        let registry = registry();
        assert!(!registry.upsert_from_subscribe(&sub("ghost", "s9")));
        assert!(!registry.clear_from_unsubscribe(&sub("ghost", "s9")));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.subscription_id_of("ghost"), "");
    }

    #[test]
    fn test_reset_subscriptions() {
        let registry = registry();
        registry.upsert_from_subscribe(&sub("d1", "s1"));
        registry.upsert_from_subscribe(&sub("d3", "s3"));

        registry.reset_subscriptions();

        for device in registry.snapshot() {
            assert!(device.subscription_id.is_empty());
            assert_ne!(device.status, DeviceStatus::Connected);
        }
        assert_eq!(registry.get("d2").unwrap().status, DeviceStatus::Pending);
    }

    #[test]
    fn test_connectable_ids_skip_pending() {
        let registry = registry();
        assert_eq!(registry.connectable_ids(), vec!["d1", "d3"]);
    }

    #[test]
    fn test_seed_replaces_existing() {
        let registry = registry();
        registry.seed([Device::new("d2", "Two").with_status(DeviceStatus::Disconnected)]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.connectable_ids(), vec!["d1", "d2", "d3"]);
    }

    #[test]
    fn test_selection_and_labels() {
        let registry = registry();
        assert!(registry.set_selected("d3", true));
        assert!(registry.set_selected("d1", true));
        assert!(!registry.set_selected("ghost", true));
        assert_eq!(registry.selected(), vec!["d1", "d3"]);

        assert!(registry.set_action_label("d1", "Opening app"));
        assert_eq!(registry.get("d1").unwrap().action, "Opening app");
    }

    #[test]
    fn test_concurrent_readers_see_whole_updates() {
        let registry = registry();
        let writer = registry.clone();

        let handle = std::thread::spawn(move || {
            for i in 0..200 {
                writer.upsert_from_subscribe(&sub("d1", &format!("s{}", i)));
                writer.clear_from_unsubscribe(&sub("d1", ""));
            }
        });

        for _ in 0..200 {
            let device = registry.get("d1").unwrap();
            // id and status always change together
            assert_eq!(
                device.subscription_id.is_empty(),
                device.status != DeviceStatus::Connected
            );
        }
        handle.join().unwrap();
    }
}
