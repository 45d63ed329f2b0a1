//! Comments hub: comment lifecycle broadcasts. Receive-only.

use tracing::{debug, warn};

use wire::events::{CommentsEvent, targets};
use wire::types::Comment;

use crate::optimistic::IdeaSync;
use crate::registry::{HubConnection, HubRegistry, RegistryError};

pub struct CommentsHub {
    registry: HubRegistry,
}

impl CommentsHub {
    pub const PATH: &'static str = "hubs/comments";

    #[must_use]
    pub fn new(registry: HubRegistry) -> Self {
        Self { registry }
    }

    /// Connect (or join the existing connection) to the comments hub.
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

    /// Route comment broadcasts into the optimistic store. Safe no-op
    /// before the hub is connected.
    pub fn attach_sync(&self, sync: &IdeaSync) {
        let Some(connection) = self.registry.get(Self::PATH) else {
            debug!("comments hub not connected; sync not attached");
            return;
        };
        for target in [
            targets::ON_COMMENT_ADDED,
            targets::ON_COMMENT_UPDATED,
            targets::ON_COMMENT_DELETED,
        ] {
            let sync = sync.clone();
            connection.on(target, move |envelope| {
                match CommentsEvent::parse(&envelope.target, &envelope.data) {
                    Some(Ok(CommentsEvent::CommentAdded(comment))) => {
                        sync.apply_comment_added(&comment);
                    }
                    Some(Ok(CommentsEvent::CommentUpdated(comment))) => {
                        sync.apply_comment_updated(&comment);
                    }
                    Some(Ok(CommentsEvent::CommentDeleted { comment_id })) => {
                        sync.apply_comment_deleted(&comment_id);
                    }
                    Some(Err(e)) => warn!(error = %e, "dropping malformed comments event"),
                    None => {}
                }
            });
        }
    }

    /// Typed subscription to comment-added broadcasts. Safe no-op before
    /// connect.
    pub fn on_comment_added(&self, handler: impl Fn(Comment) + Send + Sync + 'static) {
        let Some(connection) = self.registry.get(Self::PATH) else {
            debug!("comments hub not connected; subscription dropped");
            return;
        };
        connection.on(targets::ON_COMMENT_ADDED, move |envelope| {
            match CommentsEvent::parse(&envelope.target, &envelope.data) {
                Some(Ok(CommentsEvent::CommentAdded(comment))) => handler(comment),
                Some(Err(e)) => warn!(error = %e, "dropping malformed comment-added event"),
                _ => {}
            }
        });
    }

    pub fn off_comment_added(&self) {
        if let Some(connection) = self.registry.get(Self::PATH) {
            connection.off(targets::ON_COMMENT_ADDED);
        }
    }
}
