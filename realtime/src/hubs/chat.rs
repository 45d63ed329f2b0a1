//! Chat hub: rooms, messages, and join/leave traffic.
//!
//! Chat has multiple independent local consumers (message list, roster,
//! typing indicator), so inbound events fan out through an owned
//! [`EventDispatcher`] under stable local names rather than the wire
//! targets. Lifecycle transitions surface on the same dispatcher as
//! `connecting` / `reconnected` / `disconnected`.

use serde_json::{Value, json};
use tracing::{error, warn};

use wire::events::targets;

use crate::dispatch::EventDispatcher;
use crate::registry::{HubConnection, HubRegistry, LifecycleEvent, RegistryError};

/// Dispatcher event names for chat consumers.
pub mod events {
    pub const MESSAGE_RECEIVED: &str = "messageReceived";
    pub const USER_JOINED: &str = "userJoined";
    pub const USER_LEFT: &str = "userLeft";
    pub const USER_TYPING: &str = "userTyping";
    pub const CONNECTING: &str = "connecting";
    pub const RECONNECTED: &str = "reconnected";
    pub const DISCONNECTED: &str = "disconnected";
}

pub struct ChatHub {
    registry: HubRegistry,
    dispatcher: EventDispatcher,
}

impl ChatHub {
    pub const PATH: &'static str = "hubs/chat";

    #[must_use]
    pub fn new(registry: HubRegistry) -> Self {
        Self { registry, dispatcher: EventDispatcher::new() }
    }

    /// Dispatcher local consumers subscribe on.
    #[must_use]
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Connect and wire inbound events into the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Connect`] when the handshake fails.
    pub async fn connect(&self) -> Result<HubConnection, RegistryError> {
        let connection = self.registry.connect(Self::PATH).await?;

        for (target, local) in [
            (targets::RECEIVE_MESSAGE, events::MESSAGE_RECEIVED),
            (targets::USER_JOINED, events::USER_JOINED),
            (targets::USER_LEFT, events::USER_LEFT),
            (targets::USER_TYPING, events::USER_TYPING),
        ] {
            let dispatcher = self.dispatcher.clone();
            connection.on(target, move |envelope| {
                dispatcher.emit(local, &envelope.data);
            });
        }

        let dispatcher = self.dispatcher.clone();
        connection.on_lifecycle(move |event| {
            let local = match event {
                LifecycleEvent::Reconnecting => events::CONNECTING,
                LifecycleEvent::Reconnected => events::RECONNECTED,
                LifecycleEvent::Closed => events::DISCONNECTED,
                LifecycleEvent::Connected => return,
            };
            dispatcher.emit(local, &Value::Null);
        });

        Ok(connection)
    }

    pub async fn disconnect(&self) {
        self.registry.disconnect(Self::PATH).await;
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.registry.is_connected(Self::PATH)
    }

    /// Announce this user to the chat hub.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotConnected`] before `connect`, or the transport
    /// failure after logging.
    pub async fn join_chat(&self, user_id: &str) -> Result<(), RegistryError> {
        self.request("JoinChat", json!({ "userId": user_id })).await
    }

    /// Join a room.
    ///
    /// # Errors
    ///
    /// See [`ChatHub::join_chat`].
    pub async fn join_room(&self, room: &str) -> Result<(), RegistryError> {
        self.request("JoinRoom", json!({ "room": room })).await
    }

    /// Leave a room.
    ///
    /// # Errors
    ///
    /// See [`ChatHub::join_chat`].
    pub async fn leave_room(&self, room: &str) -> Result<(), RegistryError> {
        self.request("LeaveRoom", json!({ "room": room })).await
    }

    /// Send a message to a room.
    ///
    /// # Errors
    ///
    /// See [`ChatHub::join_chat`].
    pub async fn send_message(&self, room: &str, content: &str) -> Result<(), RegistryError> {
        self.request("SendMessage", json!({ "room": room, "content": content }))
            .await
    }

    async fn request(&self, target: &str, data: Value) -> Result<(), RegistryError> {
        let Some(connection) = self.registry.get(Self::PATH) else {
            warn!(target, "chat call on unconnected hub");
            return Err(RegistryError::NotConnected { hub: Self::PATH.to_owned() });
        };
        connection.invoke(target, data).await.inspect_err(|e| {
            error!(error = %e, target, "chat call failed");
        })
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
