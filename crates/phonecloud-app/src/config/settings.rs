//! Settings parser for .phonecloud/config.toml

use std::path::{Path, PathBuf};

use phonecloud_core::prelude::*;

use super::types::Settings;

const CONFIG_FILENAME: &str = "config.toml";
const PHONECLOUD_DIR: &str = ".phonecloud";

/// Environment variable holding the access credential.
pub const API_KEY_ENV: &str = "PHONECLOUD_API_KEY";

const DEFAULT_CONFIG: &str = r#"# PhoneCloud Configuration

[connection]
endpoint = "wss://phonecloud.dynns.com/ws/party"
reconnect_delay_ms = 1000            # Fixed delay between reconnect attempts
connect_timeout_ms = 10000           # A stalled handshake counts as a failed attempt
fail_pending_on_disconnect = false   # true = fail in-flight actions when the channel drops
event_capacity = 256

[retry]
max_retries = 5         # Consecutive failures before a device is stalled
retry_delay_ms = 5000
repeat = false          # true = run the workflow again after each success

# Devices to connect. Status PENDING devices are skipped.
# [[devices]]
# id = "device-id"
# name = "Pixel 7"
# status = "DISCONNECTED"
# selected = true
"#;

/// Path of the settings file inside `project_path`.
pub fn config_path(project_path: &Path) -> PathBuf {
    project_path.join(PHONECLOUD_DIR).join(CONFIG_FILENAME)
}

/// Load settings from `.phonecloud/config.toml`.
///
/// A missing or malformed file yields defaults.
pub fn load_settings(project_path: &Path) -> Settings {
    let config_path = config_path(project_path);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create default config files in .phonecloud/ directory
pub fn init_config_dir(project_path: &Path) -> Result<PathBuf> {
    let phonecloud_dir = project_path.join(PHONECLOUD_DIR);

    if !phonecloud_dir.exists() {
        std::fs::create_dir_all(&phonecloud_dir)
            .map_err(|e| Error::config(format!("Failed to create .phonecloud dir: {}", e)))?;
    }

    let config_path = phonecloud_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        std::fs::write(&config_path, DEFAULT_CONFIG)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(config_path)
}

/// Pick the access credential: `explicit` first, then [`API_KEY_ENV`].
///
/// The credential is never read from or written to the config file.
pub fn resolve_access_token(explicit: Option<&str>) -> Result<String> {
    if let Some(token) = explicit.filter(|t| !t.trim().is_empty()) {
        return Ok(token.trim().to_string());
    }

    match std::env::var(API_KEY_ENV) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(Error::MissingCredential),
    }
}
