//! Ideas hub: idea lifecycle and aggregate-count broadcasts.

use tracing::{debug, warn};

use wire::events::{IdeasEvent, targets};
use wire::types::Idea;

use crate::optimistic::IdeaSync;
use crate::registry::{HubConnection, HubRegistry, RegistryError};

pub struct IdeasHub {
    registry: HubRegistry,
}

impl IdeasHub {
    pub const PATH: &'static str = "hubs/ideas";

    #[must_use]
    pub fn new(registry: HubRegistry) -> Self {
        Self { registry }
    }

    /// Connect (or join the existing connection) to the ideas hub.
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

    /// Route every ideas broadcast into the optimistic store. Safe no-op
    /// before the hub is connected.
    pub fn attach_sync(&self, sync: &IdeaSync) {
        let Some(connection) = self.registry.get(Self::PATH) else {
            debug!("ideas hub not connected; sync not attached");
            return;
        };
        for target in [
            targets::ON_IDEA_CREATED,
            targets::ON_IDEA_UPDATED,
            targets::ON_IDEA_DELETED,
            targets::ON_VOTE_UPDATED,
            targets::ON_COMMENT_COUNT_UPDATED,
            targets::ON_IDEA_STATUS_UPDATED,
        ] {
            let sync = sync.clone();
            connection.on(target, move |envelope| {
                match IdeasEvent::parse(&envelope.target, &envelope.data) {
                    Some(Ok(event)) => route(&sync, event),
                    Some(Err(e)) => warn!(error = %e, "dropping malformed ideas event"),
                    None => {}
                }
            });
        }
    }

    /// Typed subscription to idea-created broadcasts. Replaces any routing
    /// previously registered for that target. Safe no-op before connect.
    pub fn on_idea_created(&self, handler: impl Fn(Idea) + Send + Sync + 'static) {
        let Some(connection) = self.registry.get(Self::PATH) else {
            debug!("ideas hub not connected; subscription dropped");
            return;
        };
        connection.on(targets::ON_IDEA_CREATED, move |envelope| {
            match IdeasEvent::parse(&envelope.target, &envelope.data) {
                Some(Ok(IdeasEvent::IdeaCreated(idea))) => handler(idea),
                Some(Err(e)) => warn!(error = %e, "dropping malformed idea-created event"),
                _ => {}
            }
        });
    }

    pub fn off_idea_created(&self) {
        if let Some(connection) = self.registry.get(Self::PATH) {
            connection.off(targets::ON_IDEA_CREATED);
        }
    }
}

fn route(sync: &IdeaSync, event: IdeasEvent) {
    match event {
        IdeasEvent::IdeaCreated(idea) => {
            sync.apply_idea_created(&idea);
        }
        IdeasEvent::IdeaUpdated(idea) => {
            sync.apply_idea_updated(&idea);
        }
        IdeasEvent::IdeaDeleted { idea_id } => {
            sync.apply_idea_deleted(&idea_id);
        }
        IdeasEvent::VoteUpdated(update) => {
            sync.apply_vote_update(&update);
        }
        IdeasEvent::CommentCountUpdated { idea_id, count } => {
            sync.apply_comment_count(&idea_id, count);
        }
        IdeasEvent::IdeaStatusUpdated { idea_id, status } => {
            sync.apply_status_updated(&idea_id, &status);
        }
    }
}

#[cfg(test)]
#[path = "ideas_test.rs"]
mod tests;
