//! Application directory paths for the launcher front-end.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! | Purpose | Linux |
//! |---------|-------|
//! | Config | `~/.config/et-launcher/` |
//! | Data (logs) | `~/.local/share/et-launcher/` |
//!
//! # Environment Overrides
//!
//! - `ET_LAUNCHER_CONFIG_DIR` — overrides [`config_dir`]
//! - `ET_LAUNCHER_DATA_DIR` — overrides [`data_dir`]

use std::path::PathBuf;

const APP_DIR_NAME: &str = "et-launcher";

/// Front-end config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ET_LAUNCHER_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("/tmp/et-launcher-config"))
}

/// Front-end data directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ET_LAUNCHER_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("/tmp/et-launcher-data"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}
