//! Versioned command/event envelopes exchanged with the launcher host.

use serde::{Deserialize, Serialize};

/// Contract version for command/event envelopes.
pub const EVENT_VERSION: u32 = 1;

/// Commands the front-end may invoke on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandName {
    #[serde(rename = "read_user_config")]
    ReadUserConfig,
    #[serde(rename = "write_user_config")]
    WriteUserConfig,
    #[serde(rename = "read_et_mode")]
    ReadEtMode,
    #[serde(rename = "write_et_mode")]
    WriteEtMode,
    #[serde(rename = "read_active_radio")]
    ReadActiveRadio,
    #[serde(rename = "get_gridsquare")]
    GetGridsquare,
    #[serde(rename = "run_app")]
    RunApp,
}

impl CommandName {
    /// Render command name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadUserConfig => "read_user_config",
            Self::WriteUserConfig => "write_user_config",
            Self::ReadEtMode => "read_et_mode",
            Self::WriteEtMode => "write_et_mode",
            Self::ReadActiveRadio => "read_active_radio",
            Self::GetGridsquare => "get_gridsquare",
            Self::RunApp => "run_app",
        }
    }

    /// Parse a command name from wire format.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "read_user_config" => Some(Self::ReadUserConfig),
            "write_user_config" => Some(Self::WriteUserConfig),
            "read_et_mode" => Some(Self::ReadEtMode),
            "write_et_mode" => Some(Self::WriteEtMode),
            "read_active_radio" => Some(Self::ReadActiveRadio),
            "get_gridsquare" => Some(Self::GetGridsquare),
            "run_app" => Some(Self::RunApp),
            _ => None,
        }
    }
}

impl std::fmt::Display for CommandName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events the host may push to the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    ToggleConsole,
    RunApp,
    AppExited,
    OpenUserConfig,
}

impl EventName {
    /// All events the front-end understands.
    pub const ALL: [Self; 4] = [
        Self::ToggleConsole,
        Self::RunApp,
        Self::AppExited,
        Self::OpenUserConfig,
    ];

    /// Render event name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToggleConsole => "toggle-console",
            Self::RunApp => "run-app",
            Self::AppExited => "app-exited",
            Self::OpenUserConfig => "open-user-config",
        }
    }

    /// Parse an event name from wire format.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "toggle-console" => Some(Self::ToggleConsole),
            "run-app" => Some(Self::RunApp),
            "app-exited" => Some(Self::AppExited),
            "open-user-config" => Some(Self::OpenUserConfig),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator identity record owned by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub callsign: String,
    pub grid: String,
    #[serde(rename = "winlinkPasswd")]
    pub winlink_passwd: String,
}

/// A typed host event with its decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// `true` shows the console, `false` hides it.
    ToggleConsole(bool),
    /// Launch the named application as if its button were clicked.
    RunApp(String),
    /// The named application exited.
    AppExited(String),
    /// Open the user configuration dialog.
    OpenUserConfig,
}

impl HostEvent {
    #[must_use]
    pub fn name(&self) -> EventName {
        match self {
            Self::ToggleConsole(_) => EventName::ToggleConsole,
            Self::RunApp(_) => EventName::RunApp,
            Self::AppExited(_) => EventName::AppExited,
            Self::OpenUserConfig => EventName::OpenUserConfig,
        }
    }

    /// Wire payload for this event.
    #[must_use]
    pub fn payload(&self) -> serde_json::Value {
        match self {
            Self::ToggleConsole(visible) => serde_json::Value::Bool(*visible),
            Self::RunApp(app) | Self::AppExited(app) => serde_json::Value::String(app.clone()),
            Self::OpenUserConfig => serde_json::Value::Null,
        }
    }

    /// Decode an event envelope.
    ///
    /// Returns `Ok(None)` for event names this front-end does not subscribe
    /// to, and an error when a known event carries a malformed payload.
    pub fn decode(envelope: &EventEnvelope) -> Result<Option<Self>, ContractError> {
        let Some(name) = EventName::parse(&envelope.event) else {
            return Ok(None);
        };
        let payload = &envelope.payload;
        let event = match name {
            EventName::ToggleConsole => {
                let visible = payload.as_bool().ok_or_else(|| {
                    ContractError::invalid_payload(name, "expected a boolean payload")
                })?;
                Self::ToggleConsole(visible)
            }
            EventName::RunApp => Self::RunApp(app_name_payload(name, payload)?),
            EventName::AppExited => Self::AppExited(app_name_payload(name, payload)?),
            EventName::OpenUserConfig => Self::OpenUserConfig,
        };
        Ok(Some(event))
    }
}

fn app_name_payload(name: EventName, payload: &serde_json::Value) -> Result<String, ContractError> {
    let Some(raw) = payload.as_str() else {
        return Err(ContractError::invalid_payload(
            name,
            "expected an application name string",
        ));
    };
    if raw.trim().is_empty() {
        return Err(ContractError::invalid_payload(
            name,
            "application name cannot be empty",
        ));
    }
    Ok(raw.to_owned())
}

/// A versioned response envelope from host -> front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Build a successful response envelope.
    #[must_use]
    pub fn ok(request_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload,
            error: None,
        }
    }

    /// Build an error response envelope.
    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }

    /// Convert into the command outcome seen by front-end callers.
    pub fn into_result(self) -> crate::Result<serde_json::Value> {
        if self.ok {
            Ok(self.payload)
        } else {
            Err(crate::LauncherError::Host(
                self.error
                    .unwrap_or_else(|| "host rejected the command".to_owned()),
            ))
        }
    }
}

/// A versioned command envelope from front-end -> host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub v: u32,
    pub request_id: String,
    pub command: CommandName,
    pub payload: serde_json::Value,
}

impl CommandEnvelope {
    /// Build a v1 command envelope.
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        command: CommandName,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            command,
            payload,
        }
    }

    /// Build an envelope with a fresh random request id.
    #[must_use]
    pub fn with_new_id(command: CommandName, payload: serde_json::Value) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), command, payload)
    }

    /// Validate envelope version and required identifiers.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.v != EVENT_VERSION {
            return Err(ContractError::new(
                ContractErrorKind::UnsupportedVersion,
                format!(
                    "unsupported contract version {}; expected {}",
                    self.v, EVENT_VERSION
                ),
            ));
        }
        if self.request_id.trim().is_empty() {
            return Err(ContractError::new(
                ContractErrorKind::InvalidEnvelope,
                "request_id cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// A versioned event envelope from host -> front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub v: u32,
    pub event_id: String,
    pub event: String,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Build a v1 event envelope.
    #[must_use]
    pub fn new(
        event_id: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            event_id: event_id.into(),
            event: event.into(),
            payload,
        }
    }

    /// Wrap a typed host event with a fresh random event id.
    #[must_use]
    pub fn from_event(event: &HostEvent) -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            event.name().as_str(),
            event.payload(),
        )
    }
}

/// Contract validation error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractErrorKind {
    UnsupportedVersion,
    InvalidEnvelope,
    InvalidPayload,
}

/// Contract validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractError {
    pub kind: ContractErrorKind,
    pub message: String,
}

impl ContractError {
    #[must_use]
    pub fn new(kind: ContractErrorKind, message: String) -> Self {
        Self { kind, message }
    }

    fn invalid_payload(event: EventName, detail: &str) -> Self {
        Self::new(
            ContractErrorKind::InvalidPayload,
            format!("{event}: {detail}"),
        )
    }
}

impl std::fmt::Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ContractError {}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn command_names_match_wire_format() {
        for name in [
            CommandName::ReadUserConfig,
            CommandName::WriteUserConfig,
            CommandName::ReadEtMode,
            CommandName::WriteEtMode,
            CommandName::ReadActiveRadio,
            CommandName::GetGridsquare,
            CommandName::RunApp,
        ] {
            assert_eq!(CommandName::parse(name.as_str()), Some(name));
            let json = serde_json::to_value(name).unwrap();
            assert_eq!(json, serde_json::Value::String(name.as_str().to_owned()));
        }
        assert_eq!(CommandName::parse("host.ping"), None);
    }

    #[test]
    fn user_config_uses_camel_case_password_field() {
        let config = UserConfig {
            callsign: "N0CALL".to_owned(),
            grid: "AB12cd".to_owned(),
            winlink_passwd: "secret".to_owned(),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"callsign": "N0CALL", "grid": "AB12cd", "winlinkPasswd": "secret"})
        );
    }

    #[test]
    fn decode_toggle_console_requires_bool() {
        let good = EventEnvelope::new("e1", "toggle-console", serde_json::json!(false));
        assert_eq!(
            HostEvent::decode(&good).unwrap(),
            Some(HostEvent::ToggleConsole(false))
        );

        let bad = EventEnvelope::new("e2", "toggle-console", serde_json::json!("yes"));
        let err = HostEvent::decode(&bad).unwrap_err();
        assert_eq!(err.kind, ContractErrorKind::InvalidPayload);
    }

    #[test]
    fn decode_app_events_require_non_empty_name() {
        let exited = EventEnvelope::new("e1", "app-exited", serde_json::json!("emacs"));
        assert_eq!(
            HostEvent::decode(&exited).unwrap(),
            Some(HostEvent::AppExited("emacs".to_owned()))
        );

        let blank = EventEnvelope::new("e2", "run-app", serde_json::json!("  "));
        assert!(HostEvent::decode(&blank).is_err());
    }

    #[test]
    fn decode_unknown_event_is_ignored() {
        let envelope = EventEnvelope::new("e1", "shell-output", serde_json::json!("hi"));
        assert_eq!(HostEvent::decode(&envelope).unwrap(), None);
    }

    #[test]
    fn open_user_config_ignores_payload() {
        let envelope = EventEnvelope::new("e1", "open-user-config", serde_json::json!({"x": 1}));
        assert_eq!(
            HostEvent::decode(&envelope).unwrap(),
            Some(HostEvent::OpenUserConfig)
        );
    }

    #[test]
    fn validate_rejects_wrong_version_and_blank_id() {
        let mut envelope = CommandEnvelope::new("req", CommandName::RunApp, serde_json::json!({}));
        assert!(envelope.validate().is_ok());

        envelope.v = 2;
        let err = envelope.validate().unwrap_err();
        assert_eq!(err.kind, ContractErrorKind::UnsupportedVersion);

        envelope.v = EVENT_VERSION;
        envelope.request_id = "   ".to_owned();
        let err = envelope.validate().unwrap_err();
        assert_eq!(err.kind, ContractErrorKind::InvalidEnvelope);
    }

    #[test]
    fn error_response_surfaces_host_message() {
        let err = ResponseEnvelope::error("req", "no such file")
            .into_result()
            .unwrap_err();
        assert_eq!(err.to_string(), "no such file");
    }
}
