//! Console sink: the append-only operator log.

use crate::error::{LauncherError, Result};
use crate::ui::view::ViewBindings;

/// Tracing target console lines are mirrored under.
pub const CONSOLE_TARGET: &str = "et_launcher::console";

/// A user-visible operation whose outcome ends up on the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LoadUserConfig,
    SaveUserConfig,
    LoadMode,
    SetMode,
    LoadActiveRadio,
    CalculateGrid,
    /// App launch, labelled by whatever triggered it (e.g. `App 1`).
    Launch { label: String },
}

impl Action {
    /// Console line for a failed outcome.
    #[must_use]
    pub fn failure_line(&self, error: &LauncherError) -> String {
        match self {
            Self::Launch { label } => format!("{label} Error: {error}"),
            other => format!("Failed to {other}: {error}"),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadUserConfig => f.write_str("load user config"),
            Self::SaveUserConfig => f.write_str("save user config"),
            Self::LoadMode => f.write_str("load mode"),
            Self::SetMode => f.write_str("set mode"),
            Self::LoadActiveRadio => f.write_str("load active radio"),
            Self::CalculateGrid => f.write_str("calculate grid square"),
            Self::Launch { label } => write!(f, "run {label}"),
        }
    }
}

/// Append-only, auto-scrolling console bound to the view.
///
/// Appends happen under the document lock, so completions racing on
/// different tasks never interleave within a line.
#[derive(Clone)]
pub struct ConsoleSink {
    view: ViewBindings,
}

impl ConsoleSink {
    #[must_use]
    pub fn new(view: ViewBindings) -> Self {
        Self { view }
    }

    /// Append `message` as one line and scroll to the newest line.
    pub fn append(&self, message: &str) {
        tracing::info!(target: CONSOLE_TARGET, "{message}");
        self.view.console_output().update(|el| {
            el.value.push_str(message);
            el.value.push('\n');
            el.scroll_top = el.max_scroll();
        });
    }

    /// Show or hide the console. Content is untouched.
    pub fn set_visible(&self, visible: bool) {
        tracing::debug!(visible, "console visibility changed");
        self.view.console_container().set_visible(visible);
    }

    #[must_use]
    pub fn is_visible(&self) -> Option<bool> {
        self.view.console_container().visible()
    }

    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.view.console_output().get()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.text()
            .map(|text| text.lines().map(ToOwned::to_owned).collect())
            .unwrap_or_default()
    }

    /// Report a command outcome.
    ///
    /// Success appends `success(&value)`; failure appends the action's
    /// failure line and logs the error. Returns the value on success.
    pub fn report<T>(
        &self,
        action: &Action,
        outcome: Result<T>,
        success: impl FnOnce(&T) -> String,
    ) -> Option<T> {
        match outcome {
            Ok(value) => {
                self.append(&success(&value));
                Some(value)
            }
            Err(error) => {
                tracing::error!(action = %action, error = %error, "host command failed");
                self.append(&action.failure_line(&error));
                None
            }
        }
    }
}
