//! Typed parameters accepted by device actions, and their validation.

use serde::{Deserialize, Serialize};

use phonecloud_core::prelude::*;

/// How a UI node is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeLocator {
    #[serde(rename = "XPATH")]
    XPath,
    Text,
    Description,
    ResourceId,
    ClassName,
    TextOrDescription,
}

/// Device-side retry policy for finder actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts before the device gives up
    pub count: u32,
    /// Pause between attempts, in milliseconds
    pub after_ms: u64,
}

impl RetryPolicy {
    pub const fn new(count: u32, after_ms: u64) -> Self {
        Self { count, after_ms }
    }

    /// Single attempt, no waiting.
    pub const fn once() -> Self {
        Self::new(1, 0)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, 100)
    }
}

/// How pointer coordinates are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoordinateKind {
    /// Fractions of the screen size, each within `0.0..=1.0`.
    Ratio,
    /// Absolute pixels.
    Coordinate,
}

/// Which installed applications to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppListKind {
    #[default]
    All,
    User,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    Http,
    Socks4,
    Socks5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScrollDirection {
    ScrollLeft,
    ScrollRight,
    ScrollTop,
    ScrollBottom,
}

/// Privilege level for shell commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandPermission {
    #[default]
    Default,
    Adb,
    Root,
}

/// Credentials and address of a proxy server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub kind: ProxyKind,
    pub host: String,
    pub port: u16,
    /// Empty when the proxy needs no authentication
    pub username: String,
    pub password: String,
}

impl ProxySettings {
    pub fn new(kind: ProxyKind, host: impl Into<String>, port: u16) -> Self {
        Self {
            kind,
            host: host.into(),
            port,
            username: String::new(),
            password: String::new(),
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

pub(crate) fn require_non_empty(action: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_argument(
            action,
            format!("{} must not be empty", field),
        ));
    }
    Ok(())
}

pub(crate) fn require_url(action: &str, value: &str) -> Result<()> {
    require_non_empty(action, "url", value)?;
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| Error::invalid_argument(action, format!("invalid url '{}': {}", value, e)))
}

/// Ratio coordinates must lie within the unit square; absolute ones must be
/// non-negative.
pub(crate) fn require_point(action: &str, kind: CoordinateKind, x: f64, y: f64) -> Result<()> {
    if !x.is_finite() || !y.is_finite() {
        return Err(Error::invalid_argument(action, "coordinates must be finite"));
    }
    let in_range = match kind {
        CoordinateKind::Ratio => (0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y),
        CoordinateKind::Coordinate => x >= 0.0 && y >= 0.0,
    };
    if !in_range {
        return Err(Error::invalid_argument(
            action,
            format!("point ({}, {}) out of range for {:?}", x, y, kind),
        ));
    }
    Ok(())
}
