//! Notifications hub: per-user notification feed.
//!
//! Like chat, notifications fan out through an owned [`EventDispatcher`]
//! so the badge counter, toast layer, and feed view subscribe
//! independently.

use serde_json::{Value, json};
use tracing::{error, warn};

use wire::events::targets;

use crate::dispatch::EventDispatcher;
use crate::registry::{HubConnection, HubRegistry, LifecycleEvent, RegistryError};

/// Dispatcher event names for notification consumers.
pub mod events {
    pub const NOTIFICATION_RECEIVED: &str = "notificationReceived";
    pub const IDEA_VOTED: &str = "ideaVoted";
    pub const IDEA_COMMENTED: &str = "ideaCommented";
    pub const IDEA_UPDATED: &str = "ideaUpdated";
    pub const CONNECTING: &str = "connecting";
    pub const RECONNECTED: &str = "reconnected";
    pub const DISCONNECTED: &str = "disconnected";
}

pub struct NotificationsHub {
    registry: HubRegistry,
    dispatcher: EventDispatcher,
}

impl NotificationsHub {
    pub const PATH: &'static str = "hubs/notifications";

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
            (targets::RECEIVE_NOTIFICATION, events::NOTIFICATION_RECEIVED),
            (targets::ON_IDEA_VOTED, events::IDEA_VOTED),
            (targets::ON_IDEA_COMMENTED, events::IDEA_COMMENTED),
            (targets::ON_IDEA_UPDATED, events::IDEA_UPDATED),
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

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotConnected`] before `connect`, or the transport
    /// failure after logging.
    pub async fn mark_as_read(&self, notification_id: &str) -> Result<(), RegistryError> {
        self.request("MarkAsRead", json!({ "id": notification_id })).await
    }

    /// Mark every notification read.
    ///
    /// # Errors
    ///
    /// See [`NotificationsHub::mark_as_read`].
    pub async fn mark_all_as_read(&self) -> Result<(), RegistryError> {
        self.request("MarkAllAsRead", json!({})).await
    }

    async fn request(&self, target: &str, data: Value) -> Result<(), RegistryError> {
        let Some(connection) = self.registry.get(Self::PATH) else {
            warn!(target, "notifications call on unconnected hub");
            return Err(RegistryError::NotConnected { hub: Self::PATH.to_owned() });
        };
        connection.invoke(target, data).await.inspect_err(|e| {
            error!(error = %e, target, "notifications call failed");
        })
    }
}
