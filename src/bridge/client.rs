//! Front-end side of the command/event bridge.
//!
//! [`Bridge`] is the single seam through which every component talks to the
//! host: one-shot `invoke` calls and a broadcast stream of pushed events.
//! [`HostClient`] layers the typed command table on top of it so components
//! never touch raw JSON.

use crate::bridge::contract::{CommandName, EventEnvelope, UserConfig};
use crate::error::{LauncherError, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Transport-agnostic command/event channel to the host.
#[async_trait::async_trait]
pub trait Bridge: Send + Sync + 'static {
    /// Invoke a host command and wait for its outcome.
    ///
    /// A rejected command surfaces as [`LauncherError::Host`]. There is no
    /// timeout and no retry.
    async fn invoke(
        &self,
        command: CommandName,
        args: serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Subscribe to events pushed by the host.
    fn subscribe_events(&self) -> broadcast::Receiver<EventEnvelope>;
}

/// Typed wrapper over a [`Bridge`] exposing the host command table.
#[derive(Clone)]
pub struct HostClient {
    bridge: Arc<dyn Bridge>,
}

impl HostClient {
    #[must_use]
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self { bridge }
    }

    #[must_use]
    pub fn bridge(&self) -> &Arc<dyn Bridge> {
        &self.bridge
    }

    pub async fn read_user_config(&self) -> Result<UserConfig> {
        self.call(CommandName::ReadUserConfig, serde_json::json!({}))
            .await
    }

    pub async fn write_user_config(&self, config: &UserConfig) -> Result<()> {
        self.bridge
            .invoke(
                CommandName::WriteUserConfig,
                serde_json::json!({ "config": config }),
            )
            .await
            .map(|_| ())
    }

    pub async fn read_et_mode(&self) -> Result<String> {
        self.call(CommandName::ReadEtMode, serde_json::json!({}))
            .await
    }

    pub async fn write_et_mode(&self, content: &str) -> Result<()> {
        self.bridge
            .invoke(
                CommandName::WriteEtMode,
                serde_json::json!({ "content": content }),
            )
            .await
            .map(|_| ())
    }

    pub async fn read_active_radio(&self) -> Result<String> {
        self.call(CommandName::ReadActiveRadio, serde_json::json!({}))
            .await
    }

    pub async fn get_gridsquare(&self) -> Result<String> {
        self.call(CommandName::GetGridsquare, serde_json::json!({}))
            .await
    }

    /// Ask the host to run `app_name`; resolves to the host's status message.
    pub async fn run_app(&self, app_name: &str) -> Result<String> {
        self.call(
            CommandName::RunApp,
            serde_json::json!({ "appName": app_name }),
        )
        .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        command: CommandName,
        args: serde_json::Value,
    ) -> Result<T> {
        tracing::debug!(command = %command, "invoking host command");
        let value = self.bridge.invoke(command, args).await?;
        serde_json::from_value(value).map_err(|e| {
            LauncherError::Payload(format!("{command} returned an unexpected result: {e}"))
        })
    }
}
