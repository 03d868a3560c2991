//! Configuration file parsing for PhoneCloud
//!
//! Supports `.phonecloud/config.toml` (connection, retry and device settings).
//! The access credential is supplied separately.

pub mod settings;
pub mod types;

pub use settings::{config_path, init_config_dir, load_settings, resolve_access_token, API_KEY_ENV};
pub use types::*;
