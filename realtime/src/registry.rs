//! Connection registry: one shared websocket connection per hub path.
//!
//! DESIGN
//! ======
//! The registry is the single source of truth for live hub connections.
//! Connecting to a hub that already has an entry returns the existing
//! handle, even while the first handshake is still in flight: the entry
//! is reserved under the lock before the first await, so two racing
//! `connect` calls for the same hub produce exactly one handshake.
//!
//! A transport-level reconnect keeps the registry entry (state moves to
//! [`ConnectionState::Reconnecting`] and back); only a terminal close
//! removes it. Disconnecting a hub tears down its pump task and drops the
//! entry unconditionally.
//!
//! ERROR HANDLING
//! ==============
//! A failed handshake removes the reserved entry and surfaces as
//! [`RegistryError::Connect`], leaving the registry clean for a later
//! retry. Sending on a hub with no live transport is a synchronous
//! [`RegistryError::NotConnected`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use wire::{Envelope, decode_envelope, encode_envelope};

use crate::transport::{Connector, TokenProvider, Transport, TransportError, TransportEvent};

/// Error type for registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The initial handshake for a hub failed.
    #[error("connect to hub '{hub}' failed: {source}")]
    Connect {
        hub: String,
        #[source]
        source: TransportError,
    },
    /// A send was attempted on a hub with no live transport.
    #[error("hub '{hub}' is not connected")]
    NotConnected { hub: String },
    /// The underlying transport rejected a send.
    #[error("send on hub '{hub}' failed: {source}")]
    Send {
        hub: String,
        #[source]
        source: TransportError,
    },
}

/// Lifecycle of one hub connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Lifecycle transitions surfaced to the hub layer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LifecycleEvent {
    Connected,
    Reconnecting,
    Reconnected,
    Closed,
}

type EventHandler = Arc<dyn Fn(&Envelope) + Send + Sync>;
type LifecycleHandler = Arc<dyn Fn(LifecycleEvent) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct ConnectionShared {
    hub: String,
    state: Mutex<ConnectionState>,
    transport: Mutex<Option<Arc<dyn Transport>>>,
    // Single slot per event target; re-registering replaces.
    handlers: Mutex<HashMap<String, EventHandler>>,
    lifecycle: Mutex<Option<LifecycleHandler>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to one shared hub connection. Clones refer to the same
/// underlying connection.
#[derive(Clone)]
pub struct HubConnection {
    shared: Arc<ConnectionShared>,
}

impl std::fmt::Debug for HubConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConnection")
            .field("hub", &self.shared.hub)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl HubConnection {
    fn new(hub: &str) -> Self {
        Self {
            shared: Arc::new(ConnectionShared {
                hub: hub.to_owned(),
                state: Mutex::new(ConnectionState::Connecting),
                transport: Mutex::new(None),
                handlers: Mutex::new(HashMap::new()),
                lifecycle: Mutex::new(None),
                pump: Mutex::new(None),
            }),
        }
    }

    /// Hub path this connection serves, e.g. `hubs/chat`.
    #[must_use]
    pub fn hub(&self) -> &str {
        &self.shared.hub
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *lock(&self.shared.state)
    }

    /// Register the handler for a server event target. One slot per
    /// target: registering again replaces the previous handler.
    pub fn on(&self, target: &str, handler: impl Fn(&Envelope) + Send + Sync + 'static) {
        lock(&self.shared.handlers).insert(target.to_owned(), Arc::new(handler));
    }

    /// Drop the handler for a target, if any.
    pub fn off(&self, target: &str) {
        lock(&self.shared.handlers).remove(target);
    }

    /// Register the lifecycle observer. One slot; registering again
    /// replaces.
    pub fn on_lifecycle(&self, handler: impl Fn(LifecycleEvent) + Send + Sync + 'static) {
        *lock(&self.shared.lifecycle) = Some(Arc::new(handler));
    }

    /// Send an invocation envelope to the server.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotConnected`] unless the state is exactly
    /// [`ConnectionState::Connected`] (a reconnecting transport would
    /// silently drop the frame), or [`RegistryError::Send`] when the
    /// transport rejects the frame.
    pub async fn invoke(&self, target: &str, data: Value) -> Result<(), RegistryError> {
        if self.state() != ConnectionState::Connected {
            return Err(RegistryError::NotConnected { hub: self.shared.hub.clone() });
        }
        let transport = lock(&self.shared.transport).clone();
        let Some(transport) = transport else {
            return Err(RegistryError::NotConnected { hub: self.shared.hub.clone() });
        };
        let envelope = Envelope::invocation(target, data).with_hub(&self.shared.hub);
        transport
            .send(encode_envelope(&envelope))
            .await
            .map_err(|source| RegistryError::Send { hub: self.shared.hub.clone(), source })
    }

    fn set_state(&self, next: ConnectionState) {
        *lock(&self.shared.state) = next;
    }

    fn emit_lifecycle(&self, event: LifecycleEvent) {
        let handler = lock(&self.shared.lifecycle).clone();
        if let Some(handler) = handler {
            handler(event);
        }
    }

    fn dispatch(&self, envelope: &Envelope) {
        // Clone the handler out of the lock so a handler can re-register
        // without deadlocking.
        let handler = lock(&self.shared.handlers).get(&envelope.target).cloned();
        match handler {
            Some(handler) => handler(envelope),
            None => debug!(hub = %self.shared.hub, target = %envelope.target, "unhandled hub event"),
        }
    }

    async fn teardown(&self) {
        let transport = lock(&self.shared.transport).take();
        if let Some(transport) = transport {
            transport.close().await;
        }
        if let Some(pump) = lock(&self.shared.pump).take() {
            pump.abort();
        }
        self.set_state(ConnectionState::Disconnected);
    }
}

struct RegistryInner {
    base_url: String,
    connector: Arc<dyn Connector>,
    token: TokenProvider,
    entries: Mutex<HashMap<String, HubConnection>>,
}

/// Registry of shared hub connections, keyed by hub path.
#[derive(Clone)]
pub struct HubRegistry {
    inner: Arc<RegistryInner>,
}

impl HubRegistry {
    /// `base_url` is the server's http(s) origin; hub websocket URLs are
    /// derived from it.
    #[must_use]
    pub fn new(base_url: &str, connector: Arc<dyn Connector>, token: TokenProvider) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                base_url: base_url.trim_end_matches('/').to_owned(),
                connector,
                token,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Websocket URL for a hub path.
    #[must_use]
    pub fn ws_url(&self, hub: &str) -> String {
        let base = &self.inner.base_url;
        let ws = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.clone()
        };
        format!("{ws}/{hub}")
    }

    /// Connection for a hub, if one is registered.
    #[must_use]
    pub fn get(&self, hub: &str) -> Option<HubConnection> {
        lock(&self.inner.entries).get(hub).cloned()
    }

    /// True only while the hub's state is exactly
    /// [`ConnectionState::Connected`]; connecting and reconnecting hubs
    /// report false.
    #[must_use]
    pub fn is_connected(&self, hub: &str) -> bool {
        self.get(hub)
            .is_some_and(|connection| connection.state() == ConnectionState::Connected)
    }

    /// Connect to a hub, or return the existing connection. Idempotent:
    /// concurrent calls for the same hub share one handshake.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Connect`] when the handshake fails; the
    /// registry holds no entry for the hub afterwards.
    pub async fn connect(&self, hub: &str) -> Result<HubConnection, RegistryError> {
        // Reserve the entry before the first await so a racing connect
        // finds it and returns the in-flight handle.
        let connection = {
            let mut entries = lock(&self.inner.entries);
            if let Some(existing) = entries.get(hub) {
                return Ok(existing.clone());
            }
            let connection = HubConnection::new(hub);
            entries.insert(hub.to_owned(), connection.clone());
            connection
        };

        let url = self.ws_url(hub);
        let handshake = self
            .inner
            .connector
            .connect(&url, Arc::clone(&self.inner.token))
            .await;
        let (transport, events) = match handshake {
            Ok(pair) => pair,
            Err(source) => {
                lock(&self.inner.entries).remove(hub);
                connection.set_state(ConnectionState::Disconnected);
                return Err(RegistryError::Connect { hub: hub.to_owned(), source });
            }
        };

        *lock(&connection.shared.transport) = Some(transport);
        connection.set_state(ConnectionState::Connected);
        connection.emit_lifecycle(LifecycleEvent::Connected);

        let pump = tokio::spawn(run_event_pump(
            connection.clone(),
            Arc::downgrade(&self.inner),
            events,
        ));
        *lock(&connection.shared.pump) = Some(pump);

        Ok(connection)
    }

    /// Tear down a hub connection and drop its entry. No-op for unknown
    /// hubs.
    pub async fn disconnect(&self, hub: &str) {
        let connection = lock(&self.inner.entries).remove(hub);
        if let Some(connection) = connection {
            connection.teardown().await;
        }
    }

    /// Tear down every registered connection.
    pub async fn disconnect_all(&self) {
        let connections: Vec<_> = lock(&self.inner.entries).drain().map(|(_, c)| c).collect();
        for connection in connections {
            connection.teardown().await;
        }
    }
}

/// Consume transport events for one connection: decode and dispatch
/// inbound envelopes, track lifecycle state, and drop the registry entry
/// on terminal close.
async fn run_event_pump(
    connection: HubConnection,
    registry: Weak<RegistryInner>,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Message(text) => match decode_envelope(&text) {
                Ok(envelope) => connection.dispatch(&envelope),
                Err(e) => {
                    warn!(hub = %connection.shared.hub, error = %e, "dropping undecodable frame");
                }
            },
            TransportEvent::Reconnecting => {
                connection.set_state(ConnectionState::Reconnecting);
                connection.emit_lifecycle(LifecycleEvent::Reconnecting);
            }
            TransportEvent::Reconnected => {
                connection.set_state(ConnectionState::Connected);
                connection.emit_lifecycle(LifecycleEvent::Reconnected);
            }
            TransportEvent::Closed => {
                if let Some(inner) = registry.upgrade() {
                    lock(&inner.entries).remove(&connection.shared.hub);
                }
                *lock(&connection.shared.transport) = None;
                connection.set_state(ConnectionState::Disconnected);
                connection.emit_lifecycle(LifecycleEvent::Closed);
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
