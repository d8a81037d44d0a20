//! Event subscription registry and dispatch loop.
//!
//! Subscriptions are registered once at startup and normally live for the
//! rest of the session. Each [`Subscription`] handle can still be disposed
//! explicitly, which tests use to verify that handlers stop firing.

use crate::bridge::contract::{EventEnvelope, EventName, HostEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Callback invoked for every matching host event.
///
/// Handlers run on the dispatch task and must not block; anything that
/// needs to await a command spawns its own task.
pub type EventHandler = Arc<dyn Fn(&HostEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<EventName, Vec<(u64, EventHandler)>>>,
}

impl Registry {
    fn remove(&self, event: EventName, id: u64) -> bool {
        let Ok(mut handlers) = self.handlers.lock() else {
            return false;
        };
        let Some(list) = handlers.get_mut(&event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(handler_id, _)| *handler_id != id);
        before != list.len()
    }
}

/// Owns every event subscription of the front-end.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    registry: Arc<Registry>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event`.
    pub fn listen<F>(&self, event: EventName, handler: F) -> Subscription
    where
        F: Fn(&HostEvent) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut handlers) = self.registry.handlers.lock() {
            handlers
                .entry(event)
                .or_default()
                .push((id, Arc::new(handler)));
        }
        tracing::debug!(event = %event, id, "subscribed to host event");
        Subscription {
            id,
            event,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Number of live handlers for `event`.
    #[must_use]
    pub fn handler_count(&self, event: EventName) -> usize {
        self.registry
            .handlers
            .lock()
            .map(|h| h.get(&event).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Decode one envelope and run its handlers. Returns how many ran.
    ///
    /// Unknown events and malformed payloads are logged and dropped.
    pub fn dispatch(&self, envelope: &EventEnvelope) -> usize {
        let event = match HostEvent::decode(envelope) {
            Ok(Some(event)) => event,
            Ok(None) => {
                tracing::debug!(event = %envelope.event, "ignoring unknown host event");
                return 0;
            }
            Err(e) => {
                tracing::warn!(
                    event = %envelope.event,
                    event_id = %envelope.event_id,
                    error = %e,
                    "dropping malformed host event"
                );
                return 0;
            }
        };

        // Snapshot so handlers may subscribe or dispose without deadlocking.
        let handlers: Vec<EventHandler> = match self.registry.handlers.lock() {
            Ok(map) => map
                .get(&event.name())
                .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default(),
            Err(_) => return 0,
        };

        tracing::debug!(event = %event.name(), handlers = handlers.len(), "dispatching host event");
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    /// Pump `events` into the registered handlers until the channel closes.
    pub fn spawn(&self, mut events: broadcast::Receiver<EventEnvelope>) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(envelope) => {
                        dispatcher.dispatch(&envelope);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "event dispatcher lagged; some events were dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("host event channel closed; stopping dispatcher");
                        break;
                    }
                }
            }
        })
    }
}

/// Handle to one registered handler.
///
/// Dropping the handle leaves the handler registered; call
/// [`Subscription::dispose`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    event: EventName,
    registry: Weak<Registry>,
}

impl Subscription {
    #[must_use]
    pub fn event(&self) -> EventName {
        self.event
    }

    /// Unregister the handler. Returns `false` if it was already gone.
    pub fn dispose(self) -> bool {
        let removed = self
            .registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.event, self.id));
        tracing::debug!(event = %self.event, id = self.id, removed, "disposed subscription");
        removed
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn toggle(visible: bool) -> EventEnvelope {
        EventEnvelope::from_event(&HostEvent::ToggleConsole(visible))
    }

    #[test]
    fn handlers_only_see_their_event() {
        let dispatcher = EventDispatcher::new();
        let toggles = Arc::new(Mutex::new(Vec::new()));
        let exits = Arc::new(AtomicUsize::new(0));

        let recorded = Arc::clone(&toggles);
        let _toggle = dispatcher.listen(EventName::ToggleConsole, move |event| {
            if let HostEvent::ToggleConsole(visible) = event {
                recorded.lock().unwrap().push(*visible);
            }
        });
        let counted = Arc::clone(&exits);
        let _exit = dispatcher.listen(EventName::AppExited, move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(dispatcher.dispatch(&toggle(false)), 1);
        assert_eq!(dispatcher.dispatch(&toggle(true)), 1);
        assert_eq!(*toggles.lock().unwrap(), vec![false, true]);
        assert_eq!(exits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handlers_fire_every_time() {
        let dispatcher = EventDispatcher::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&count);
        let _sub = dispatcher.listen(EventName::OpenUserConfig, move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        let envelope = EventEnvelope::from_event(&HostEvent::OpenUserConfig);
        for _ in 0..50 {
            dispatcher.dispatch(&envelope);
        }
        assert_eq!(count.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn dispose_stops_delivery() {
        let dispatcher = EventDispatcher::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&count);
        let sub = dispatcher.listen(EventName::ToggleConsole, move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.dispatch(&toggle(true));
        assert!(sub.dispose());
        dispatcher.dispatch(&toggle(true));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.handler_count(EventName::ToggleConsole), 0);
    }

    #[test]
    fn malformed_and_unknown_events_run_nothing() {
        let dispatcher = EventDispatcher::new();
        let _sub = dispatcher.listen(EventName::ToggleConsole, |_| {
            panic!("handler must not run for malformed payloads");
        });

        let bad = EventEnvelope::new("e1", "toggle-console", serde_json::json!("nope"));
        assert_eq!(dispatcher.dispatch(&bad), 0);

        let unknown = EventEnvelope::new("e2", "shell-output", serde_json::json!("hi"));
        assert_eq!(dispatcher.dispatch(&unknown), 0);
    }

    #[tokio::test]
    async fn spawned_pump_dispatches_until_closed() {
        let dispatcher = EventDispatcher::new();
        let (tx, rx) = broadcast::channel(8);
        let count = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&count);
        let _sub = dispatcher.listen(EventName::AppExited, move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        let handle = dispatcher.spawn(rx);
        tx.send(EventEnvelope::from_event(&HostEvent::AppExited(
            "date".to_owned(),
        )))
        .unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
