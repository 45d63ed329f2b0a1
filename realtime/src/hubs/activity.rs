//! Activity hub: ephemeral typing / viewing / idle pings.
//!
//! All outbound traffic here is best-effort. Losing a typing ping is
//! harmless (the next keystroke resends it), so failures are logged and
//! swallowed instead of surfacing to the caller.

use serde_json::json;
use tracing::{debug, warn};

use wire::events::{ActivityEvent, targets};

use crate::presence::{LocalTypingGate, PresenceEngine};
use crate::registry::{HubConnection, HubRegistry, RegistryError};

pub struct ActivityHub {
    registry: HubRegistry,
    typing_gate: LocalTypingGate,
}

impl ActivityHub {
    pub const PATH: &'static str = "hubs/activity";

    #[must_use]
    pub fn new(registry: HubRegistry) -> Self {
        Self { registry, typing_gate: LocalTypingGate::new() }
    }

    /// Connect (or join the existing connection) to the activity hub.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Connect`] when the handshake fails.
    pub async fn connect(&self) -> Result<HubConnection, RegistryError> {
        self.registry.connect(Self::PATH).await
    }

    pub async fn disconnect(&self) {
        self.registry.disconnect(Self::PATH).await;
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.registry.is_connected(Self::PATH)
    }

    /// Route the five activity broadcasts into a presence engine. Safe
    /// no-op before the hub is connected.
    pub fn attach_presence(&self, presence: &PresenceEngine) {
        let Some(connection) = self.registry.get(Self::PATH) else {
            debug!("activity hub not connected; presence not attached");
            return;
        };
        for target in [
            targets::ON_USER_TYPING,
            targets::ON_USER_STOPPED_TYPING,
            targets::ON_USER_VIEWING,
            targets::ON_USER_IDLE,
            targets::ON_ACTIVE_USERS_UPDATED,
        ] {
            let presence = presence.clone();
            connection.on(target, move |envelope| {
                match ActivityEvent::parse(&envelope.target, &envelope.data) {
                    Some(Ok(event)) => route(&presence, event),
                    Some(Err(e)) => warn!(error = %e, "dropping malformed activity event"),
                    None => {}
                }
            });
        }
    }

    /// Announce typing on an entity. Throttled to one ping per local
    /// gate window; renewals inside the window are silently skipped.
    pub async fn send_typing(&self, entity_id: &str) {
        if !self.typing_gate.should_send() {
            return;
        }
        self.best_effort(
            "SendTypingActivity",
            json!({ "entityId": entity_id, "isTyping": true }),
        )
        .await;
    }

    /// Announce that typing on an entity stopped. Resets the gate so the
    /// next keystroke announces immediately.
    pub async fn send_stopped_typing(&self, entity_id: &str) {
        self.typing_gate.reset();
        self.best_effort(
            "SendTypingActivity",
            json!({ "entityId": entity_id, "isTyping": false }),
        )
        .await;
    }

    pub async fn send_viewing(&self, entity_id: &str) {
        self.best_effort("SendViewingActivity", json!({ "entityId": entity_id }))
            .await;
    }

    pub async fn send_idle(&self) {
        self.best_effort("SendIdleActivity", json!({})).await;
    }

    async fn best_effort(&self, target: &str, data: serde_json::Value) {
        let Some(connection) = self.registry.get(Self::PATH) else {
            debug!(target, "activity ping skipped; hub not connected");
            return;
        };
        if let Err(e) = connection.invoke(target, data).await {
            warn!(error = %e, target, "activity ping failed");
        }
    }
}

fn route(presence: &PresenceEngine, event: ActivityEvent) {
    match event {
        ActivityEvent::UserTyping { user_id, user_name, entity_id } => {
            presence.note_typing(&entity_id, &user_id, &user_name);
        }
        ActivityEvent::UserStoppedTyping { user_id, entity_id } => {
            presence.note_stopped_typing(&entity_id, &user_id);
        }
        ActivityEvent::UserViewing { user_id, entity_id, .. } => {
            presence.note_viewing(&user_id, &entity_id);
        }
        ActivityEvent::UserIdle { user_id } => {
            presence.note_idle(&user_id);
        }
        ActivityEvent::ActiveUsersUpdated(users) => {
            presence.set_active_users(
                users
                    .into_iter()
                    .map(|u| wire::types::ChatUser { user_id: u.user_id, user_name: u.user_name })
                    .collect(),
            );
        }
    }
}

#[cfg(test)]
#[path = "activity_test.rs"]
mod tests;
