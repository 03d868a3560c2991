//! # phonecloud-core - Core Domain Types
//!
//! Foundation crate for the PhoneCloud control-plane client. Provides domain
//! types, error handling, session events and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing, toml).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`Device`] - A remote device with its subscription id and progress label
//! - [`DeviceStatus`] - Pending, Connected, Disconnected, Unknown
//! - [`ActionResult`] - Outcome of one remote action (`status`, `result`, `error`)
//!
//! ### Events (`events`)
//! - [`SessionEvent`] - Connection, subscription, action and workflow events
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with a `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use phonecloud_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all PhoneCloud crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use events::SessionEvent;
pub use types::{is_truthy, ActionResult, Device, DeviceStatus};
