//! Configuration for the launcher front-end.
//!
//! Everything here is front-end presentation policy. The operator identity
//! record (`UserConfig`) is owned and persisted by the host and never
//! appears in this file.

use crate::error::{LauncherError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which front-end shape to present.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiVariant {
    /// Form, status fields, buttons and console always on screen; the
    /// configuration is loaded at startup.
    #[default]
    Inline,
    /// Configuration lives in a dialog opened by the host menu event.
    Dialog,
}

/// Top-level front-end configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Front-end shape.
    pub variant: UiVariant,
    /// Console sink settings.
    pub console: ConsoleConfig,
    /// Status mirror refresh policy.
    pub status: StatusConfig,
    /// App launcher buttons, in display order.
    pub apps: Vec<AppButton>,
    /// Host process connection.
    pub host: HostConfig,
    /// Diagnostic logging.
    pub logging: LoggingConfig,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            variant: UiVariant::default(),
            console: ConsoleConfig::default(),
            status: StatusConfig::default(),
            apps: vec![
                AppButton::new("App 1", "emacs"),
                AppButton::new("App 2", "date"),
            ],
            host: HostConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Console sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Initial visibility. `None` uses the variant default (inline: shown,
    /// dialog: hidden until the host toggles it).
    pub visible: Option<bool>,
    /// Number of lines visible in the console viewport.
    pub viewport_rows: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            visible: None,
            viewport_rows: 12,
        }
    }
}

impl ConsoleConfig {
    /// Visibility the console starts with for `variant`.
    #[must_use]
    pub fn initial_visibility(&self, variant: UiVariant) -> bool {
        self.visible
            .unwrap_or(matches!(variant, UiVariant::Inline))
    }
}

/// Status mirror refresh policy.
///
/// The host pushes no status events, so the mirrors are read at startup
/// and otherwise only on explicit request. Setting `poll_interval_secs`
/// adds periodic client-side re-reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub poll_interval_secs: Option<u64>,
}

/// One app launcher button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppButton {
    /// Console prefix, e.g. `App 1`.
    pub label: String,
    /// Name passed to the host's `run_app` command.
    pub app_name: String,
}

impl AppButton {
    #[must_use]
    pub fn new(label: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            app_name: app_name.into(),
        }
    }
}

/// How to reach the host process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Host executable speaking NDJSON envelopes on stdin/stdout.
    pub command: String,
    /// Arguments passed to the host executable.
    pub args: Vec<String>,
    /// Capacity of the host event broadcast channel.
    pub event_capacity: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            command: "et-host".to_owned(),
            args: Vec::new(),
            event_capacity: 128,
        }
    }
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Also write a daily-rotated log file under the data directory.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            file: false,
        }
    }
}

impl LauncherConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| LauncherError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LauncherError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config_dir>/config.toml`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        crate::launcher_dirs::config_file()
    }

    /// Load an explicit config file, or the default one if it exists.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let path = Self::default_config_path();
        if path.exists() {
            Self::from_file(&path)
        } else {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Reject settings the front-end cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.console.viewport_rows == 0 {
            return Err(LauncherError::Config(
                "console.viewport_rows must be at least 1".to_owned(),
            ));
        }
        if self.status.poll_interval_secs == Some(0) {
            return Err(LauncherError::Config(
                "status.poll_interval_secs must be positive when set".to_owned(),
            ));
        }
        for (index, app) in self.apps.iter().enumerate() {
            if app.label.trim().is_empty() || app.app_name.trim().is_empty() {
                return Err(LauncherError::Config(format!(
                    "apps[{index}] needs a non-empty label and app_name"
                )));
            }
        }
        if self.host.command.trim().is_empty() {
            return Err(LauncherError::Config(
                "host.command cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }
}
