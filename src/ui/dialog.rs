//! User configuration form and its dialog state machine.
//!
//! ```text
//! Closed -> Loading -> Editing -> Saving -> Closed   (dialog, saved)
//!                         ^          |
//!                         +----------+               (save failed)
//!                      Editing -> Closed             (cancelled)
//! ```
//!
//! The inline variant has no dialog to close: its form is always on screen
//! and accepts edits and submits in `Closed` as well as `Editing`, and a
//! successful save returns it to `Editing`.

use crate::bridge::{HostClient, UserConfig};
use crate::config::UiVariant;
use crate::ui::console::{Action, ConsoleSink};
use crate::ui::view::ViewBindings;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Loading,
    Editing,
    Saving,
}

/// The user configuration form.
#[derive(Clone)]
pub struct ConfigDialog {
    host: HostClient,
    view: ViewBindings,
    console: ConsoleSink,
    state: Arc<Mutex<DialogState>>,
}

impl ConfigDialog {
    #[must_use]
    pub fn new(host: HostClient, view: ViewBindings, console: ConsoleSink) -> Self {
        Self {
            host,
            view,
            console,
            state: Arc::new(Mutex::new(DialogState::Closed)),
        }
    }

    #[must_use]
    pub fn state(&self) -> DialogState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(DialogState::Closed)
    }

    /// Whether the form currently accepts edits and actions.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        let state = self.state();
        match self.view.variant() {
            UiVariant::Inline => matches!(state, DialogState::Closed | DialogState::Editing),
            UiVariant::Dialog => state == DialogState::Editing,
        }
    }

    /// Whether the dialog element is currently shown.
    #[must_use]
    pub fn is_open(&self) -> bool {
        match self.view.variant() {
            UiVariant::Inline => true,
            UiVariant::Dialog => self.view.config_dialog().visible().unwrap_or(false),
        }
    }

    /// Fetch the configuration from the host and present it for editing.
    ///
    /// Ignored unless the dialog is closed.
    pub async fn open(&self) -> DialogState {
        if !self.transition(&[DialogState::Closed], DialogState::Loading) {
            tracing::debug!(state = ?self.state(), "open ignored; dialog already active");
            return self.state();
        }

        let outcome = self.host.read_user_config().await;
        let loaded = self.console.report(&Action::LoadUserConfig, outcome, |_| {
            "User config loaded successfully".to_owned()
        });

        match loaded {
            Some(config) => {
                self.fill_form(&config);
                if self.view.variant() == UiVariant::Dialog {
                    self.view.config_dialog().set_visible(true);
                }
                self.set_state(DialogState::Editing);
            }
            None => self.set_state(DialogState::Closed),
        }
        self.state()
    }

    /// Ask the host for the grid square and overwrite only the grid field.
    pub async fn calculate_grid(&self) -> bool {
        if !self.is_interactive() {
            tracing::debug!(state = ?self.state(), "grid calculation ignored; form not editable");
            return false;
        }

        let outcome = self.host.get_gridsquare().await;
        let Some(grid) = self.console.report(&Action::CalculateGrid, outcome, |grid| {
            format!("Grid square calculated: {grid}")
        }) else {
            return false;
        };

        // The dialog may have been cancelled while the host was working.
        if !self.is_interactive() {
            tracing::debug!("grid result arrived after the form closed; discarding");
            return false;
        }
        self.view.grid().set(&grid)
    }

    /// Submit the current field values to the host.
    ///
    /// Returns `true` when the host accepted the save.
    pub async fn submit(&self) -> bool {
        let from: &[DialogState] = match self.view.variant() {
            UiVariant::Inline => &[DialogState::Closed, DialogState::Editing],
            UiVariant::Dialog => &[DialogState::Editing],
        };
        let previous = self.state();
        if !self.transition(from, DialogState::Saving) {
            tracing::debug!(state = ?previous, "submit ignored; form not editable");
            return false;
        }

        let config = match self.read_form() {
            Ok(config) => config,
            Err(missing) => {
                self.console
                    .append(&format!("Cannot save user config: {missing} is required"));
                self.set_state(previous);
                return false;
            }
        };

        let outcome = self.host.write_user_config(&config).await;
        let saved = self
            .console
            .report(&Action::SaveUserConfig, outcome, |_| {
                "User config saved successfully".to_owned()
            })
            .is_some();

        match (saved, self.view.variant()) {
            (true, UiVariant::Dialog) => self.close(),
            _ => self.set_state(DialogState::Editing),
        }
        saved
    }

    /// Discard in-progress edits and close the dialog without saving.
    pub fn cancel(&self) -> bool {
        if self.view.variant() == UiVariant::Inline {
            tracing::debug!("cancel ignored; inline form has no dialog");
            return false;
        }
        if self.state() != DialogState::Editing {
            tracing::debug!(state = ?self.state(), "cancel ignored; dialog not editing");
            return false;
        }
        self.close();
        true
    }

    fn close(&self) {
        self.view.config_dialog().set_visible(false);
        self.fill_form(&UserConfig::default());
        self.set_state(DialogState::Closed);
    }

    fn fill_form(&self, config: &UserConfig) {
        self.view.callsign().set(&config.callsign);
        self.view.grid().set(&config.grid);
        self.view.winlink_passwd().set(&config.winlink_passwd);
    }

    /// Current field values, or the name of the first empty/missing field.
    fn read_form(&self) -> Result<UserConfig, &'static str> {
        let field = |value: Option<String>, name: &'static str| match value {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(name),
        };
        Ok(UserConfig {
            callsign: field(self.view.callsign().get(), "callsign")?,
            grid: field(self.view.grid().get(), "grid")?,
            winlink_passwd: field(self.view.winlink_passwd().get(), "winlink password")?,
        })
    }

    fn transition(&self, from: &[DialogState], to: DialogState) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        if from.contains(&*state) {
            tracing::debug!(from = ?*state, to = ?to, "config dialog transition");
            *state = to;
            true
        } else {
            false
        }
    }

    fn set_state(&self, to: DialogState) {
        if let Ok(mut state) = self.state.lock() {
            tracing::debug!(from = ?*state, to = ?to, "config dialog transition");
            *state = to;
        }
    }
}
