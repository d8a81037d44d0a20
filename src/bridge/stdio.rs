//! Newline-delimited JSON bridge to an out-of-process host.
//!
//! Writes `CommandEnvelope` lines to the host's stdin and reads
//! `ResponseEnvelope` and `EventEnvelope` lines from its stdout. Responses
//! are matched to their callers by `request_id`; every other well-formed
//! line is treated as an event and broadcast to subscribers.
//!
//! The host's stderr is left to the host for diagnostics.

use crate::bridge::client::Bridge;
use crate::bridge::contract::{CommandEnvelope, CommandName, EventEnvelope, ResponseEnvelope};
use crate::config::HostConfig;
use crate::error::{LauncherError, Result};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{Mutex, broadcast, oneshot};
use tokio::task::JoinHandle;

type PendingMap = HashMap<String, oneshot::Sender<ResponseEnvelope>>;

/// Outstanding requests. `closed` is set once the host output has ended;
/// no new request may wait after that.
#[derive(Default)]
struct PendingTable {
    waiters: PendingMap,
    closed: bool,
}
type BoxedWriter = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;

/// Bridge speaking NDJSON over an async reader/writer pair.
pub struct StdioBridge {
    writer: Arc<Mutex<BoxedWriter>>,
    pending: Arc<StdMutex<PendingTable>>,
    event_tx: broadcast::Sender<EventEnvelope>,
    reader_handle: JoinHandle<()>,
}

impl StdioBridge {
    /// Attach to an already-open transport.
    ///
    /// `reader` carries host output (responses and events), `writer` carries
    /// commands to the host.
    pub fn connect<R, W>(reader: R, writer: W, event_capacity: usize) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (event_tx, _event_rx) = broadcast::channel(event_capacity.max(1));
        let pending = Arc::new(StdMutex::new(PendingTable::default()));
        let boxed: Box<dyn AsyncWrite + Send + Unpin> = Box::new(writer);

        let reader_handle = tokio::spawn(run_reader(
            reader,
            Arc::clone(&pending),
            event_tx.clone(),
        ));

        Self {
            writer: Arc::new(Mutex::new(BufWriter::new(boxed))),
            pending,
            event_tx,
            reader_handle,
        }
    }

    /// Spawn the configured host process and attach to its stdio.
    pub fn spawn_host(config: &HostConfig) -> Result<(Self, tokio::process::Child)> {
        let mut child = tokio::process::Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                LauncherError::Channel(format!(
                    "failed to spawn host `{}`: {e}",
                    config.command
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LauncherError::Channel("host process has no stdin".to_owned()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LauncherError::Channel("host process has no stdout".to_owned()))?;

        tracing::info!(command = %config.command, pid = ?child.id(), "host process started");
        Ok((Self::connect(stdout, stdin, config.event_capacity), child))
    }

    /// Number of commands still waiting for a response.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.pending.lock().map(|p| p.waiters.len()).unwrap_or(0)
    }

    /// Whether the host output has ended. Every later command fails.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pending.lock().map(|p| p.closed).unwrap_or(true)
    }

    async fn write_envelope(&self, envelope: &CommandEnvelope) -> Result<()> {
        let json = serde_json::to_string(envelope).map_err(|e| {
            LauncherError::Payload(format!("failed to serialize command envelope: {e}"))
        })?;
        let mut w = self.writer.lock().await;
        write_line(&mut w, &json).await
    }

    fn register(&self, request_id: &str) -> Result<oneshot::Receiver<ResponseEnvelope>> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| LauncherError::Channel("pending request table poisoned".to_owned()))?;
        if pending.closed {
            return Err(LauncherError::Channel(
                "host output closed; no response can arrive".to_owned(),
            ));
        }
        pending.waiters.insert(request_id.to_owned(), tx);
        Ok(rx)
    }

    fn forget(&self, request_id: &str) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.waiters.remove(request_id);
        }
    }
}

impl Drop for StdioBridge {
    fn drop(&mut self) {
        self.reader_handle.abort();
    }
}

#[async_trait::async_trait]
impl Bridge for StdioBridge {
    async fn invoke(
        &self,
        command: CommandName,
        args: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let envelope = CommandEnvelope::with_new_id(command, args);
        envelope.validate()?;

        let response_rx = self.register(&envelope.request_id)?;
        if let Err(e) = self.write_envelope(&envelope).await {
            self.forget(&envelope.request_id);
            return Err(e);
        }

        let response = response_rx.await.map_err(|_| {
            LauncherError::Channel(format!(
                "host closed before answering {command} ({})",
                envelope.request_id
            ))
        })?;
        response.into_result()
    }

    fn subscribe_events(&self) -> broadcast::Receiver<EventEnvelope> {
        self.event_tx.subscribe()
    }
}

/// Read host output line-by-line until EOF, routing responses and events.
async fn run_reader<R>(
    reader: R,
    pending: Arc<StdMutex<PendingTable>>,
    event_tx: broadcast::Sender<EventEnvelope>,
) where
    R: AsyncRead + Send + Unpin + 'static,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!("host output closed (EOF)");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read host output; stopping reader");
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let value: serde_json::Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, raw_line = %trimmed, "skipping malformed host line");
                continue;
            }
        };

        if value.get("ok").is_some() {
            route_response(value, &pending);
        } else if value.get("event").is_some() {
            match serde_json::from_value::<EventEnvelope>(value) {
                Ok(event) => {
                    // No subscribers is fine; events are fire-and-forget.
                    let _ = event_tx.send(event);
                }
                Err(e) => tracing::warn!(error = %e, "skipping malformed event envelope"),
            }
        } else {
            tracing::warn!(raw_line = %trimmed, "host line is neither response nor event");
        }
    }

    // Dropping the senders fails every outstanding call with a channel error.
    if let Ok(mut pending) = pending.lock() {
        if !pending.waiters.is_empty() {
            tracing::warn!(outstanding = pending.waiters.len(), "failing requests left by host");
        }
        pending.closed = true;
        pending.waiters.clear();
    }
}

fn route_response(value: serde_json::Value, pending: &StdMutex<PendingTable>) {
    let response: ResponseEnvelope = match serde_json::from_value(value) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed response envelope");
            return;
        }
    };

    let waiter = pending
        .lock()
        .ok()
        .and_then(|mut p| p.waiters.remove(&response.request_id));
    match waiter {
        Some(tx) => {
            let _ = tx.send(response);
        }
        None => tracing::warn!(
            request_id = %response.request_id,
            "response for unknown request; dropping"
        ),
    }
}

/// Write a single JSON line and flush.
async fn write_line(writer: &mut BoxedWriter, json: &str) -> Result<()> {
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| LauncherError::Channel(format!("failed to write to host: {e}")))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| LauncherError::Channel(format!("failed to write newline to host: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| LauncherError::Channel(format!("failed to flush host input: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::time::Duration;
    use tokio::io::{DuplexStream, Lines};

    /// Host side of a duplex pair.
    struct FakeHost {
        commands: Lines<BufReader<tokio::io::ReadHalf<DuplexStream>>>,
        output: tokio::io::WriteHalf<DuplexStream>,
    }

    impl FakeHost {
        async fn next_command(&mut self) -> CommandEnvelope {
            let line = tokio::time::timeout(Duration::from_secs(5), self.commands.next_line())
                .await
                .expect("timeout waiting for command")
                .expect("read command")
                .expect("unexpected EOF");
            serde_json::from_str(&line).expect("command envelope")
        }

        async fn send_line(&mut self, line: &str) {
            self.output.write_all(line.as_bytes()).await.unwrap();
            self.output.write_all(b"\n").await.unwrap();
            self.output.flush().await.unwrap();
        }

        async fn reply(&mut self, response: &ResponseEnvelope) {
            let json = serde_json::to_string(response).unwrap();
            self.send_line(&json).await;
        }
    }

    fn pair() -> (StdioBridge, FakeHost) {
        let (front, host) = tokio::io::duplex(4096);
        let (front_read, front_write) = tokio::io::split(front);
        let (host_read, host_write) = tokio::io::split(host);
        let bridge = StdioBridge::connect(front_read, front_write, 16);
        let fake = FakeHost {
            commands: BufReader::new(host_read).lines(),
            output: host_write,
        };
        (bridge, fake)
    }

    #[tokio::test]
    async fn response_is_matched_by_request_id() {
        let (bridge, mut host) = pair();
        let bridge = Arc::new(bridge);

        let call = {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move {
                bridge
                    .invoke(CommandName::ReadEtMode, serde_json::json!({}))
                    .await
            })
        };

        let command = host.next_command().await;
        assert_eq!(command.command, CommandName::ReadEtMode);
        host.reply(&ResponseEnvelope::ok(
            command.request_id,
            serde_json::json!("winlink"),
        ))
        .await;

        let value = call.await.unwrap().expect("command should succeed");
        assert_eq!(value, "winlink");
        assert_eq!(bridge.pending_requests(), 0);
    }

    #[tokio::test]
    async fn error_response_becomes_host_error() {
        let (bridge, mut host) = pair();
        let bridge = Arc::new(bridge);

        let call = {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move {
                bridge
                    .invoke(
                        CommandName::RunApp,
                        serde_json::json!({"appName": "emacs"}),
                    )
                    .await
            })
        };

        let command = host.next_command().await;
        assert_eq!(command.payload["appName"], "emacs");
        host.reply(&ResponseEnvelope::error(command.request_id, "not found"))
            .await;

        let err = call.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "not found");
    }

    #[tokio::test]
    async fn events_and_garbage_lines_are_separated() {
        let (bridge, mut host) = pair();
        let mut events = bridge.subscribe_events();

        host.send_line("this is not json").await;
        host.send_line(r#"{"unrelated": true}"#).await;
        let event = EventEnvelope::new("ev-1", "toggle-console", serde_json::json!(true));
        host.send_line(&serde_json::to_string(&event).unwrap())
            .await;

        let received = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timeout waiting for event")
            .unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn host_eof_fails_outstanding_calls() {
        let (bridge, mut host) = pair();
        let bridge = Arc::new(bridge);

        let call = {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move {
                bridge
                    .invoke(CommandName::ReadActiveRadio, serde_json::json!({}))
                    .await
            })
        };

        let _ = host.next_command().await;
        drop(host);

        let err = call.await.unwrap().unwrap_err();
        assert!(matches!(err, LauncherError::Channel(_)));
    }

    #[tokio::test]
    async fn commands_after_host_eof_fail_fast() {
        // Output ends at once while the command side keeps accepting writes.
        let bridge = StdioBridge::connect(tokio::io::empty(), tokio::io::sink(), 4);

        tokio::time::timeout(Duration::from_secs(5), async {
            while !bridge.is_closed() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("reader should observe EOF");

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            bridge.invoke(CommandName::GetGridsquare, serde_json::json!({})),
        )
        .await
        .expect("command after EOF must not hang")
        .unwrap_err();
        assert!(matches!(err, LauncherError::Channel(_)));
        assert_eq!(bridge.pending_requests(), 0);
    }
}
