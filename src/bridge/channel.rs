//! In-process host command channel and router.
//!
//! Embedders that host the launcher inside their own process implement
//! [`HostHandler`] and drive a [`HostCommandServer`]; the front-end talks to
//! it through the paired [`ChannelBridge`]. Tests use the same pair with
//! recording handlers.

use crate::bridge::client::Bridge;
use crate::bridge::contract::{
    CommandEnvelope, CommandName, EventEnvelope, HostEvent, ResponseEnvelope, UserConfig,
};
use crate::error::{LauncherError, Result};
use tokio::sync::{broadcast, mpsc, oneshot};

/// Outcome of a host-side command. Errors are plain messages shown to the
/// operator verbatim.
pub type HostResult<T> = std::result::Result<T, String>;

/// Host-side implementation of the command table.
pub trait HostHandler: Send + Sync + 'static {
    fn read_user_config(&self) -> HostResult<UserConfig>;
    fn write_user_config(&self, config: UserConfig) -> HostResult<()>;
    fn read_et_mode(&self) -> HostResult<String>;
    fn write_et_mode(&self, _content: &str) -> HostResult<()> {
        Err("write_et_mode is not supported by this host".to_owned())
    }
    fn read_active_radio(&self) -> HostResult<String>;
    fn get_gridsquare(&self) -> HostResult<String>;
    fn run_app(&self, app_name: &str) -> HostResult<String>;
}

struct HostCommandRequest {
    envelope: CommandEnvelope,
    response_tx: oneshot::Sender<ResponseEnvelope>,
}

/// Front-end half of an in-process channel.
#[derive(Clone)]
pub struct ChannelBridge {
    request_tx: mpsc::Sender<HostCommandRequest>,
    event_tx: broadcast::Sender<EventEnvelope>,
}

impl ChannelBridge {
    /// Send a prepared envelope and wait for the raw response.
    pub async fn send(&self, envelope: CommandEnvelope) -> Result<ResponseEnvelope> {
        envelope.validate()?;

        let (response_tx, response_rx) = oneshot::channel();
        self.request_tx
            .send(HostCommandRequest {
                envelope,
                response_tx,
            })
            .await
            .map_err(|e| {
                LauncherError::Channel(format!("failed to send host command request: {e}"))
            })?;

        response_rx
            .await
            .map_err(|e| LauncherError::Channel(format!("host command response dropped: {e}")))
    }
}

#[async_trait::async_trait]
impl Bridge for ChannelBridge {
    async fn invoke(
        &self,
        command: CommandName,
        args: serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.send(CommandEnvelope::with_new_id(command, args))
            .await?
            .into_result()
    }

    fn subscribe_events(&self) -> broadcast::Receiver<EventEnvelope> {
        self.event_tx.subscribe()
    }
}

/// Pushes host events to every subscribed front-end.
#[derive(Clone)]
pub struct HostEventEmitter {
    event_tx: broadcast::Sender<EventEnvelope>,
}

impl HostEventEmitter {
    /// Emit a typed event. Returns the number of subscribers reached.
    pub fn emit(&self, event: &HostEvent) -> usize {
        self.emit_envelope(EventEnvelope::from_event(event))
    }

    /// Emit a raw envelope, e.g. one the front-end does not understand.
    pub fn emit_envelope(&self, envelope: EventEnvelope) -> usize {
        self.event_tx.send(envelope).unwrap_or(0)
    }
}

/// Host half of an in-process channel.
pub struct HostCommandServer<H: HostHandler> {
    request_rx: mpsc::Receiver<HostCommandRequest>,
    event_tx: broadcast::Sender<EventEnvelope>,
    handler: H,
}

#[must_use]
pub fn command_channel<H: HostHandler>(
    request_capacity: usize,
    event_capacity: usize,
    handler: H,
) -> (ChannelBridge, HostCommandServer<H>) {
    let (event_tx, _event_rx) = broadcast::channel(event_capacity.max(1));
    command_channel_with_events(request_capacity, event_tx, handler)
}

/// Create a command channel using an existing event broadcast sender.
#[must_use]
pub fn command_channel_with_events<H: HostHandler>(
    request_capacity: usize,
    event_tx: broadcast::Sender<EventEnvelope>,
    handler: H,
) -> (ChannelBridge, HostCommandServer<H>) {
    let (request_tx, request_rx) = mpsc::channel(request_capacity.max(1));

    (
        ChannelBridge {
            request_tx,
            event_tx: event_tx.clone(),
        },
        HostCommandServer {
            request_rx,
            event_tx,
            handler,
        },
    )
}

impl<H: HostHandler> HostCommandServer<H> {
    /// Handle for pushing events to the front-end.
    #[must_use]
    pub fn emitter(&self) -> HostEventEmitter {
        HostEventEmitter {
            event_tx: self.event_tx.clone(),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.request_rx.recv().await {
            let response = self.route(&request.envelope);
            let _ = request.response_tx.send(response);
        }
        tracing::debug!("host command channel closed");
    }

    /// Route a command envelope to the handler.
    #[must_use]
    pub fn route(&self, envelope: &CommandEnvelope) -> ResponseEnvelope {
        let request_id = envelope.request_id.clone();
        let outcome = match envelope.command {
            CommandName::ReadUserConfig => self
                .handler
                .read_user_config()
                .and_then(|config| to_payload(&config)),
            CommandName::WriteUserConfig => parse_user_config(&envelope.payload)
                .and_then(|config| self.handler.write_user_config(config))
                .map(|()| serde_json::Value::Null),
            CommandName::ReadEtMode => self.handler.read_et_mode().map(serde_json::Value::String),
            CommandName::WriteEtMode => {
                parse_string_field(&envelope.payload, "content", envelope.command)
                    .and_then(|content| self.handler.write_et_mode(&content))
                    .map(|()| serde_json::Value::Null)
            }
            CommandName::ReadActiveRadio => self
                .handler
                .read_active_radio()
                .map(serde_json::Value::String),
            CommandName::GetGridsquare => self
                .handler
                .get_gridsquare()
                .map(serde_json::Value::String),
            CommandName::RunApp => {
                parse_string_field(&envelope.payload, "appName", envelope.command)
                    .and_then(|app| self.handler.run_app(&app))
                    .map(serde_json::Value::String)
            }
        };

        match outcome {
            Ok(payload) => ResponseEnvelope::ok(request_id, payload),
            Err(message) => {
                tracing::debug!(command = %envelope.command, error = %message, "host command rejected");
                ResponseEnvelope::error(request_id, message)
            }
        }
    }
}

fn to_payload<T: serde::Serialize>(value: &T) -> HostResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| format!("failed to serialize result: {e}"))
}

fn parse_user_config(payload: &serde_json::Value) -> HostResult<UserConfig> {
    let Some(raw) = payload.get("config") else {
        return Err("write_user_config requires payload.config".to_owned());
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| format!("write_user_config payload.config is invalid: {e}"))
}

fn parse_string_field(
    payload: &serde_json::Value,
    field: &str,
    command: CommandName,
) -> HostResult<String> {
    let Some(raw) = payload.get(field).and_then(serde_json::Value::as_str) else {
        return Err(format!("{command} requires payload.{field}"));
    };
    if raw.trim().is_empty() {
        return Err(format!("{command} requires a non-empty payload.{field}"));
    }
    Ok(raw.to_owned())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    struct FixedHost;

    impl HostHandler for FixedHost {
        fn read_user_config(&self) -> HostResult<UserConfig> {
            Ok(UserConfig {
                callsign: "N0CALL".to_owned(),
                grid: "AB12cd".to_owned(),
                winlink_passwd: "secret".to_owned(),
            })
        }
        fn write_user_config(&self, _config: UserConfig) -> HostResult<()> {
            Ok(())
        }
        fn read_et_mode(&self) -> HostResult<String> {
            Err("Failed to read et-mode: No such file or directory".to_owned())
        }
        fn read_active_radio(&self) -> HostResult<String> {
            Ok("NO-RADIO".to_owned())
        }
        fn get_gridsquare(&self) -> HostResult<String> {
            Ok("AB12cd".to_owned())
        }
        fn run_app(&self, app_name: &str) -> HostResult<String> {
            Ok(format!("started {app_name}"))
        }
    }

    fn make_server() -> HostCommandServer<FixedHost> {
        let (_client, server) = command_channel(8, 8, FixedHost);
        server
    }

    fn make_envelope(command: CommandName, payload: serde_json::Value) -> CommandEnvelope {
        CommandEnvelope::new("test-req-1", command, payload)
    }

    #[test]
    fn read_user_config_serializes_wire_fields() {
        let resp = make_server().route(&make_envelope(
            CommandName::ReadUserConfig,
            serde_json::json!({}),
        ));
        assert!(resp.ok);
        assert_eq!(resp.request_id, "test-req-1");
        assert_eq!(resp.payload["winlinkPasswd"], "secret");
    }

    #[test]
    fn handler_error_becomes_error_response() {
        let resp = make_server().route(&make_envelope(
            CommandName::ReadEtMode,
            serde_json::json!({}),
        ));
        assert!(!resp.ok);
        assert_eq!(
            resp.error.as_deref(),
            Some("Failed to read et-mode: No such file or directory")
        );
    }

    #[test]
    fn run_app_requires_app_name() {
        let resp = make_server().route(&make_envelope(CommandName::RunApp, serde_json::json!({})));
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some("run_app requires payload.appName"));

        let resp = make_server().route(&make_envelope(
            CommandName::RunApp,
            serde_json::json!({"appName": "date"}),
        ));
        assert!(resp.ok);
        assert_eq!(resp.payload, "started date");
    }

    #[test]
    fn write_user_config_rejects_missing_config() {
        let resp = make_server().route(&make_envelope(
            CommandName::WriteUserConfig,
            serde_json::json!({"callsign": "N0CALL"}),
        ));
        assert!(!resp.ok);
    }

    #[test]
    fn write_et_mode_defaults_to_unsupported() {
        let resp = make_server().route(&make_envelope(
            CommandName::WriteEtMode,
            serde_json::json!({"content": "vara-fm"}),
        ));
        assert!(!resp.ok);
        assert!(resp.error.unwrap().contains("not supported"));
    }

    #[tokio::test]
    async fn invoke_round_trips_through_server_task() {
        let (client, server) = command_channel(8, 8, FixedHost);
        let handle = tokio::spawn(server.run());

        let radio = client
            .invoke(CommandName::ReadActiveRadio, serde_json::json!({}))
            .await
            .expect("read_active_radio should succeed");
        assert_eq!(radio, "NO-RADIO");

        let err = client
            .invoke(CommandName::ReadEtMode, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Host(_)));

        handle.abort();
    }

    #[tokio::test]
    async fn invoke_fails_when_server_is_gone() {
        let (client, server) = command_channel(8, 8, FixedHost);
        drop(server);
        let err = client
            .invoke(CommandName::GetGridsquare, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Channel(_)));
    }

    #[tokio::test]
    async fn emitter_reaches_subscribers() {
        let (client, server) = command_channel(8, 8, FixedHost);
        let mut events = client.subscribe_events();
        let emitter = server.emitter();

        assert_eq!(emitter.emit(&HostEvent::AppExited("emacs".to_owned())), 1);
        let envelope = events.recv().await.unwrap();
        assert_eq!(envelope.event, "app-exited");
        assert_eq!(envelope.payload, "emacs");
    }
}
