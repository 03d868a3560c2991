//! Domain types shared by the link and app layers

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────
// Devices
// ─────────────────────────────────────────────────────────────────

/// Connection status of a remote device as seen by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    /// Provisioned but not yet usable; excluded from the connection endpoint.
    Pending,
    /// Holds a live subscription on the multiplexed connection.
    Connected,
    /// Known, but without a live subscription.
    Disconnected,
    #[default]
    #[serde(other)]
    Unknown,
}

impl DeviceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Pending => "PENDING",
            DeviceStatus::Connected => "CONNECTED",
            DeviceStatus::Disconnected => "DISCONNECTED",
            DeviceStatus::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A remote device known to the session.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Device {
    /// Unique device identifier
    pub id: String,

    /// Human-readable device name
    #[serde(default, alias = "device_name")]
    pub name: String,

    #[serde(default)]
    pub status: DeviceStatus,

    /// Server-issued subscription id; empty while not subscribed
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subscription_id: String,

    /// Whether the operator selected this device for the next workflow run
    #[serde(default)]
    pub selected: bool,

    /// Last progress label reported by a workflow
    #[serde(default = "default_action_label")]
    pub action: String,
}

fn default_action_label() -> String {
    "Idle".to_string()
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: DeviceStatus::Unknown,
            subscription_id: String::new(),
            selected: false,
            action: default_action_label(),
        }
    }

    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the device currently holds a subscription id.
    pub fn is_subscribed(&self) -> bool {
        !self.subscription_id.is_empty()
    }

    /// Name for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Action results
// ─────────────────────────────────────────────────────────────────

/// Outcome of one remote action.
///
/// Callers must check [`status`](Self::status) before trusting
/// [`result`](Self::result). `error` is only populated when `status` is false.
/// Deadline expiry produces an ordinary failed result, distinguishable from a
/// remote failure only by its error text.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActionResult {
    pub status: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    /// Build a result from a completion payload, normalizing `error` so it is
    /// present exactly when `status` is false.
    pub fn new(status: bool, result: Value, error: Option<String>) -> Self {
        let error = if status {
            None
        } else {
            Some(error.unwrap_or_else(|| "remote reported failure".to_string()))
        };
        Self {
            status,
            result,
            error,
        }
    }

    pub fn success(result: Value) -> Self {
        Self::new(true, result, None)
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::new(false, Value::Null, Some(error.into()))
    }

    /// The result delivered when a request's deadline fires first.
    pub fn timeout(request_id: &str) -> Self {
        Self::failure(format!("Timeout for request_id: {}", request_id))
    }

    pub fn is_success(&self) -> bool {
        self.status
    }

    /// Whether this result timed out rather than failing remotely.
    pub fn is_timeout(&self) -> bool {
        !self.status
            && self
                .error
                .as_deref()
                .is_some_and(|e| e.starts_with("Timeout for request_id: "))
    }

    /// `status` is true and the payload is truthy (see [`is_truthy`]).
    pub fn is_truthy(&self) -> bool {
        self.status && is_truthy(&self.result)
    }

    /// Convert into a `Result`, raising [`Error::ActionFailed`] on failure.
    ///
    /// This is how workflow code turns a remote failure into a retryable error.
    pub fn into_result(self, action: &str) -> Result<Value> {
        if self.status {
            Ok(self.result)
        } else {
            Err(Error::action_failed(
                action,
                self.error.unwrap_or_default(),
            ))
        }
    }
}

/// Loose truthiness used by device actions that answer with booleans,
/// numbers, strings or objects: `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
