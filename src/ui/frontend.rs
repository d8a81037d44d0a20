//! Front-end composition root.
//!
//! Builds the view bindings and components once, registers the host event
//! subscriptions, and runs the variant's startup sequence. Commands
//! triggered by events run as tracked background tasks so the dispatch loop
//! never waits on the host.

use crate::bridge::contract::{EventName, HostEvent};
use crate::bridge::{Bridge, EventDispatcher, HostClient, Subscription};
use crate::config::{LauncherConfig, UiVariant};
use crate::ui::console::ConsoleSink;
use crate::ui::dialog::ConfigDialog;
use crate::ui::launcher::AppLauncher;
use crate::ui::status::{StatusKind, StatusMirror};
use crate::ui::view::{Document, SharedDocument, ViewBindings};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

pub struct Frontend {
    config: LauncherConfig,
    host: HostClient,
    view: ViewBindings,
    console: ConsoleSink,
    dialog: ConfigDialog,
    mode: StatusMirror,
    radio: StatusMirror,
    launcher: AppLauncher,
    dispatcher: EventDispatcher,
    subscriptions: Vec<Subscription>,
    tasks: TaskTracker,
    cancel: CancellationToken,
    pump: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
}

impl Frontend {
    /// Build a front-end over the standard markup for the configured variant.
    #[must_use]
    pub fn new(config: LauncherConfig, bridge: Arc<dyn Bridge>) -> Self {
        let variant = config.variant;
        let document = Document::for_variant(
            variant,
            config.console.viewport_rows,
            config.console.initial_visibility(variant),
        );
        Self::with_document(config, bridge, Arc::new(Mutex::new(document)))
    }

    /// Build a front-end over an existing document.
    #[must_use]
    pub fn with_document(
        config: LauncherConfig,
        bridge: Arc<dyn Bridge>,
        document: SharedDocument,
    ) -> Self {
        let host = HostClient::new(bridge);
        let view = ViewBindings::bind(document, config.variant);
        let console = ConsoleSink::new(view.clone());
        let dialog = ConfigDialog::new(host.clone(), view.clone(), console.clone());
        let mode = StatusMirror::new(
            StatusKind::Mode,
            host.clone(),
            view.clone(),
            console.clone(),
        );
        let radio = StatusMirror::new(
            StatusKind::ActiveRadio,
            host.clone(),
            view.clone(),
            console.clone(),
        );
        let launcher = AppLauncher::new(host.clone(), console.clone(), config.apps.clone());

        Self {
            config,
            host,
            view,
            console,
            dialog,
            mode,
            radio,
            launcher,
            dispatcher: EventDispatcher::new(),
            subscriptions: Vec::new(),
            tasks: TaskTracker::new(),
            cancel: CancellationToken::new(),
            pump: None,
            poller: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    #[must_use]
    pub fn view(&self) -> &ViewBindings {
        &self.view
    }

    #[must_use]
    pub fn console(&self) -> &ConsoleSink {
        &self.console
    }

    #[must_use]
    pub fn dialog(&self) -> &ConfigDialog {
        &self.dialog
    }

    #[must_use]
    pub fn mode(&self) -> &StatusMirror {
        &self.mode
    }

    #[must_use]
    pub fn radio(&self) -> &StatusMirror {
        &self.radio
    }

    #[must_use]
    pub fn launcher(&self) -> &AppLauncher {
        &self.launcher
    }

    #[must_use]
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Register the host event handlers. Calling this twice is a no-op.
    pub fn subscribe(&mut self) {
        if !self.subscriptions.is_empty() {
            return;
        }

        let console = self.console.clone();
        self.subscriptions
            .push(self.dispatcher.listen(EventName::ToggleConsole, move |event| {
                if let HostEvent::ToggleConsole(visible) = event {
                    console.set_visible(*visible);
                }
            }));

        let launcher = self.launcher.clone();
        let tasks = self.tasks.clone();
        self.subscriptions
            .push(self.dispatcher.listen(EventName::RunApp, move |event| {
                if let HostEvent::RunApp(app_name) = event {
                    let launcher = launcher.clone();
                    let app_name = app_name.clone();
                    tasks.spawn(async move {
                        launcher.launch_by_name(&app_name).await;
                    });
                }
            }));

        let console = self.console.clone();
        self.subscriptions
            .push(self.dispatcher.listen(EventName::AppExited, move |event| {
                if let HostEvent::AppExited(app_name) = event {
                    console.append(&format!("{app_name} exited"));
                }
            }));

        let dialog = self.dialog.clone();
        let tasks = self.tasks.clone();
        self.subscriptions
            .push(self.dispatcher.listen(EventName::OpenUserConfig, move |_| {
                let dialog = dialog.clone();
                tasks.spawn(async move {
                    dialog.open().await;
                });
            }));

        tracing::info!(subscriptions = self.subscriptions.len(), "host event handlers registered");
    }

    /// Subscribe, start pumping host events, and kick off startup loads.
    pub fn start(&mut self) {
        self.subscribe();

        if self.pump.is_none() {
            let events = self.host.bridge().subscribe_events();
            self.pump = Some(self.dispatcher.spawn(events));
        }

        let startup = self.startup_task();
        self.tasks.spawn(startup);

        if self.poller.is_none() {
            match self.config.status.poll_interval_secs {
                Some(0) => {
                    tracing::warn!("status.poll_interval_secs is 0; status polling disabled");
                }
                Some(secs) => {
                    self.poller = Some(self.spawn_status_polling(Duration::from_secs(secs)));
                }
                None => {}
            }
        }
    }

    /// Whether periodic status re-reads are running.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// The variant's startup loads.
    ///
    /// Inline loads the configuration form alongside both status mirrors;
    /// the dialog variant waits for the host's open request.
    pub async fn startup(&self) {
        self.startup_task().await;
    }

    fn startup_task(&self) -> impl Future<Output = ()> + Send + 'static {
        let variant = self.config.variant;
        let dialog = self.dialog.clone();
        let mode = self.mode.clone();
        let radio = self.radio.clone();
        async move {
            match variant {
                UiVariant::Inline => {
                    tokio::join!(dialog.open(), mode.refresh(), radio.refresh());
                }
                UiVariant::Dialog => {
                    tokio::join!(mode.refresh(), radio.refresh());
                }
            }
        }
    }

    fn spawn_status_polling(&self, period: Duration) -> JoinHandle<()> {
        let mode = self.mode.clone();
        let radio = self.radio.clone();
        let cancel = self.cancel.clone();
        tracing::info!(period_secs = period.as_secs(), "status polling enabled");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; startup already loaded both.
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        tokio::join!(mode.refresh(), radio.refresh());
                    }
                }
            }
        })
    }

    /// Run `future` as a tracked front-end task.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tasks.spawn(future)
    }

    /// Wait until every tracked task (startup, event-triggered commands)
    /// has finished.
    pub async fn settle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Dispose subscriptions, stop background loops and drain tasks.
    pub async fn shutdown(mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
        self.cancel.cancel();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(poller) = self.poller.take() {
            let _ = poller.await;
        }
        self.tasks.close();
        self.tasks.wait().await;
        tracing::info!("front-end shut down");
    }
}
