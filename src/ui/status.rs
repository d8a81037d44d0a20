//! Read-only status mirrors for the host's mode and active radio.

use crate::bridge::HostClient;
use crate::error::LauncherError;
use crate::ui::console::{Action, ConsoleSink};
use crate::ui::view::{Binding, ViewBindings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Mode,
    ActiveRadio,
}

impl StatusKind {
    fn element_name(self) -> &'static str {
        match self {
            Self::Mode => "mode display",
            Self::ActiveRadio => "radio display",
        }
    }
}

/// One status field, refreshed only by explicit reads.
#[derive(Clone)]
pub struct StatusMirror {
    kind: StatusKind,
    host: HostClient,
    view: ViewBindings,
    console: ConsoleSink,
}

impl StatusMirror {
    #[must_use]
    pub fn new(
        kind: StatusKind,
        host: HostClient,
        view: ViewBindings,
        console: ConsoleSink,
    ) -> Self {
        Self {
            kind,
            host,
            view,
            console,
        }
    }

    #[must_use]
    pub fn kind(&self) -> StatusKind {
        self.kind
    }

    /// Currently displayed value.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        self.field().get()
    }

    /// Re-read the value from the host.
    ///
    /// On failure the displayed value is left as it was.
    pub async fn refresh(&self) -> bool {
        let (action, outcome) = match self.kind {
            StatusKind::Mode => (Action::LoadMode, self.host.read_et_mode().await),
            StatusKind::ActiveRadio => (
                Action::LoadActiveRadio,
                self.host.read_active_radio().await,
            ),
        };
        // Success is only reported once the value is on screen.
        let shown = outcome.and_then(|value| {
            if self.field().set(&value) {
                Ok(value)
            } else {
                Err(LauncherError::View(format!(
                    "{} element is missing",
                    self.kind.element_name()
                )))
            }
        });
        let kind = self.kind;
        self.console
            .report(&action, shown, |_| match kind {
                StatusKind::Mode => "Mode loaded successfully".to_owned(),
                StatusKind::ActiveRadio => "Active radio loaded successfully".to_owned(),
            })
            .is_some()
    }

    /// Ask the host to switch mode, then re-read it.
    pub async fn set_mode(&self, mode: &str) -> bool {
        if self.kind != StatusKind::Mode {
            tracing::warn!(kind = ?self.kind, "set_mode called on a non-mode mirror");
            return false;
        }
        let outcome = self.host.write_et_mode(mode).await;
        let written = self
            .console
            .report(&Action::SetMode, outcome, |_| format!("Mode set to {mode}"))
            .is_some();
        written && self.refresh().await
    }

    fn field(&self) -> Binding<'_> {
        match self.kind {
            StatusKind::Mode => self.view.mode_display(),
            StatusKind::ActiveRadio => self.view.radio_display(),
        }
    }
}
