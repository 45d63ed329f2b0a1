//! Votes hub: vote tally broadcasts. Receive-only; vote submission goes
//! through REST so the backend can answer with authoritative state.

use tracing::{debug, warn};

use wire::events::{VotesEvent, targets};
use wire::types::VoteUpdate;

use crate::optimistic::IdeaSync;
use crate::registry::{HubConnection, HubRegistry, RegistryError};

pub struct VotesHub {
    registry: HubRegistry,
}

impl VotesHub {
    pub const PATH: &'static str = "hubs/votes";

    #[must_use]
    pub fn new(registry: HubRegistry) -> Self {
        Self { registry }
    }

    /// Connect (or join the existing connection) to the votes hub.
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

    /// Route vote broadcasts into the optimistic store. Safe no-op before
    /// the hub is connected.
    pub fn attach_sync(&self, sync: &IdeaSync) {
        let Some(connection) = self.registry.get(Self::PATH) else {
            debug!("votes hub not connected; sync not attached");
            return;
        };
        for target in [targets::ON_VOTE_UPDATED, targets::ON_VOTE_REMOVED] {
            let sync = sync.clone();
            connection.on(target, move |envelope| {
                match VotesEvent::parse(&envelope.target, &envelope.data) {
                    Some(Ok(VotesEvent::VoteUpdated(update))) => {
                        sync.apply_vote_update(&update);
                    }
                    Some(Ok(VotesEvent::VoteRemoved { idea_id })) => {
                        sync.apply_vote_removed(&idea_id);
                    }
                    Some(Err(e)) => warn!(error = %e, "dropping malformed votes event"),
                    None => {}
                }
            });
        }
    }

    /// Typed subscription to vote-updated broadcasts. Safe no-op before
    /// connect.
    pub fn on_vote_updated(&self, handler: impl Fn(VoteUpdate) + Send + Sync + 'static) {
        let Some(connection) = self.registry.get(Self::PATH) else {
            debug!("votes hub not connected; subscription dropped");
            return;
        };
        connection.on(targets::ON_VOTE_UPDATED, move |envelope| {
            match VotesEvent::parse(&envelope.target, &envelope.data) {
                Some(Ok(VotesEvent::VoteUpdated(update))) => handler(update),
                Some(Err(e)) => warn!(error = %e, "dropping malformed vote-updated event"),
                _ => {}
            }
        });
    }

    pub fn off_vote_updated(&self) {
        if let Some(connection) = self.registry.get(Self::PATH) {
            connection.off(targets::ON_VOTE_UPDATED);
        }
    }
}

#[cfg(test)]
#[path = "votes_test.rs"]
mod tests;
