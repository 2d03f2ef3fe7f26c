//! Platform-specific configuration paths.
//!
//! - **User config**: `~/.config/sonance/config.toml` (Linux),
//!   `~/Library/Application Support/sonance/config.toml` (macOS),
//!   `%APPDATA%\sonance\config.toml` (Windows)
//!
//! # Example
//!
//! ```rust,no_run
//! use sonance_config::paths;
//!
//! println!("Config file: {:?}", paths::user_config_path());
//! ```

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "sonance";

/// File name of the user configuration.
const CONFIG_FILE: &str = "config.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the path of the user configuration file, which may not exist.
pub fn user_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}
