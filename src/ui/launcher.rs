//! App launcher buttons.
//!
//! Launches are independent: nothing stops two of them running at once,
//! and the host decides whether to serialize them. Exit notices arrive
//! later through the `app-exited` event and are only related to the launch
//! by app name.

use crate::bridge::HostClient;
use crate::config::AppButton;
use crate::ui::console::{Action, ConsoleSink};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppLauncher {
    host: HostClient,
    console: ConsoleSink,
    buttons: Arc<[AppButton]>,
}

impl AppLauncher {
    #[must_use]
    pub fn new(host: HostClient, console: ConsoleSink, buttons: Vec<AppButton>) -> Self {
        Self {
            host,
            console,
            buttons: buttons.into(),
        }
    }

    #[must_use]
    pub fn buttons(&self) -> &[AppButton] {
        &self.buttons
    }

    /// Run `app_name` and log the host's answer prefixed with `label`.
    pub async fn launch(&self, label: &str, app_name: &str) -> Option<String> {
        tracing::info!(label, app = app_name, "launching app");
        let action = Action::Launch {
            label: label.to_owned(),
        };
        let outcome = self.host.run_app(app_name).await;
        let result = self
            .console
            .report(&action, outcome, |message| format!("{label}: {message}"));
        if let Some(message) = &result {
            tracing::debug!(label, result = %message, "app launch finished");
        }
        result
    }

    /// Press the button at `index` (zero-based).
    pub async fn press(&self, index: usize) -> Option<String> {
        let Some(button) = self.buttons.get(index).cloned() else {
            tracing::warn!(index, buttons = self.buttons.len(), "no such app button");
            return None;
        };
        self.launch(&button.label, &button.app_name).await
    }

    /// Launch by app name, labelled like its button if one exists.
    pub async fn launch_by_name(&self, app_name: &str) -> Option<String> {
        let label = self.label_for(app_name);
        self.launch(&label, app_name).await
    }

    #[must_use]
    pub fn label_for(&self, app_name: &str) -> String {
        self.buttons
            .iter()
            .find(|b| b.app_name == app_name)
            .map_or_else(|| app_name.to_owned(), |b| b.label.clone())
    }
}
