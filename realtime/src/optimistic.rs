//! Optimistic mutation tracking over the idea store.
//!
//! DESIGN
//! ======
//! Local mutations apply immediately and are confirmed (or rolled back)
//! when the REST call resolves. While a mutation is in flight its idea is
//! marked pending, and hub broadcasts touching that idea are dropped, not
//! queued: a stale or out-of-order push must never clobber the user's own
//! unconfirmed action, and the REST resolution alone settles the value.
//! Broadcasts arriving after resolution merge normally.
//!
//! Creates are the one exception. Locally created entities carry a
//! provisional `pending-<ts>` id, and the backend's own broadcast for the
//! create can arrive before the REST response; it is matched to the
//! provisional entry heuristically (same author, same title or body) and
//! replaces it in place, so exactly one of the provisional and confirmed
//! rows ever survives. [`Resolution`] tells the caller which side won.
//!
//! The state mutex is never held across an await: each operation stages
//! under the lock, performs the REST call unlocked, then re-locks to
//! resolve.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use wire::now_ms;
use wire::types::{Comment, Idea, IdeaDraft, IdeaPatch, VoteKind, VoteState, VoteUpdate};

use crate::rest::{IdeaApi, RestError};

/// Error type for local mutations.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// Another mutation for the same entity is still in flight.
    #[error("a mutation for idea '{idea_id}' is already pending")]
    AlreadyPending { idea_id: String },
    /// The target idea is not in the local store.
    #[error("unknown idea '{idea_id}'")]
    UnknownIdea { idea_id: String },
    /// The REST call failed; the optimistic change was rolled back.
    #[error(transparent)]
    Rest(#[from] RestError),
}

/// How a confirmed creation resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution<T> {
    /// The REST response was applied.
    Confirmed(T),
    /// The server's own broadcast for this creation arrived first and
    /// already adopted the provisional row; the REST response was
    /// discarded.
    SupersededByBroadcast(T),
}

impl<T> Resolution<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Confirmed(value) | Self::SupersededByBroadcast(value) => value,
        }
    }
}

/// What the store did with an inbound broadcast.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Applied {
    /// Merged into local state.
    Merged,
    /// Dropped because a pending mutation owns the key.
    Suppressed,
    /// Irrelevant here (unknown entity, or already present).
    Ignored,
}

struct PendingVote {
    rollback_up: i64,
    rollback_down: i64,
    rollback_my: Option<VoteKind>,
}

struct PendingCreate {
    superseded: Option<Idea>,
}

struct PendingComment {
    idea_id: String,
    content: String,
    superseded: Option<Comment>,
}

struct PendingEdit {
    rollback: Idea,
}

struct PendingDelete {
    rollback: Idea,
    index: usize,
}

#[derive(Default)]
struct SyncState {
    ideas: Vec<Idea>,
    comments: HashMap<String, Vec<Comment>>,
    my_votes: HashMap<String, VoteKind>,
    pending_votes: HashMap<String, PendingVote>,
    // keyed by provisional id
    pending_creates: HashMap<String, PendingCreate>,
    pending_comments: HashMap<String, PendingComment>,
    pending_edits: HashMap<String, PendingEdit>,
    pending_deletes: HashMap<String, PendingDelete>,
}

impl SyncState {
    fn idea_mut(&mut self, idea_id: &str) -> Option<&mut Idea> {
        self.ideas.iter_mut().find(|i| i.id == idea_id)
    }

    fn idea_index(&self, idea_id: &str) -> Option<usize> {
        self.ideas.iter().position(|i| i.id == idea_id)
    }

    fn edit_locked(&self, idea_id: &str) -> bool {
        self.pending_edits.contains_key(idea_id) || self.pending_deletes.contains_key(idea_id)
    }
}

struct SyncInner {
    api: Arc<dyn IdeaApi>,
    user_id: String,
    user_name: String,
    state: Mutex<SyncState>,
    changed: Mutex<Option<Arc<dyn Fn() + Send + Sync>>>,
}

/// The synchronized idea store. Clones share state.
#[derive(Clone)]
pub struct IdeaSync {
    inner: Arc<SyncInner>,
}

impl IdeaSync {
    #[must_use]
    pub fn new(api: Arc<dyn IdeaApi>, user_id: &str, user_name: &str) -> Self {
        Self {
            inner: Arc::new(SyncInner {
                api,
                user_id: user_id.to_owned(),
                user_name: user_name.to_owned(),
                state: Mutex::new(SyncState::default()),
                changed: Mutex::new(None),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the change observer. One slot; registering again replaces.
    pub fn on_change(&self, handler: impl Fn() + Send + Sync + 'static) {
        *self.inner.changed.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    fn notify(&self) {
        let handler = self.inner.changed.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    // ---- snapshots -------------------------------------------------------

    #[must_use]
    pub fn ideas(&self) -> Vec<Idea> {
        self.lock().ideas.clone()
    }

    #[must_use]
    pub fn idea(&self, idea_id: &str) -> Option<Idea> {
        self.lock().ideas.iter().find(|i| i.id == idea_id).cloned()
    }

    #[must_use]
    pub fn comments(&self, idea_id: &str) -> Vec<Comment> {
        self.lock().comments.get(idea_id).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn my_vote(&self, idea_id: &str) -> Option<VoteKind> {
        self.lock().my_votes.get(idea_id).copied()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        let state = self.lock();
        !(state.pending_votes.is_empty()
            && state.pending_creates.is_empty()
            && state.pending_comments.is_empty()
            && state.pending_edits.is_empty()
            && state.pending_deletes.is_empty())
    }

    /// Replace the idea list with a server snapshot (initial load).
    pub fn set_ideas(&self, ideas: Vec<Idea>) {
        self.lock().ideas = ideas;
        self.notify();
    }

    /// Replace one idea's comment list with a server snapshot.
    pub fn set_comments(&self, idea_id: &str, comments: Vec<Comment>) {
        self.lock().comments.insert(idea_id.to_owned(), comments);
        self.notify();
    }

    // ---- votes -----------------------------------------------------------

    /// Cast or toggle a vote. Counts adjust immediately; the server's
    /// [`VoteState`] settles them at resolution. Vote broadcasts for the
    /// idea are dropped while the call is in flight.
    ///
    /// # Errors
    ///
    /// [`MutationError::AlreadyPending`] while a vote for this idea is in
    /// flight, [`MutationError::UnknownIdea`] for an idea not in the
    /// store, and [`MutationError::Rest`] after a rollback.
    pub async fn submit_vote(
        &self,
        idea_id: &str,
        kind: VoteKind,
    ) -> Result<VoteState, MutationError> {
        {
            let mut state = self.lock();
            if state.pending_votes.contains_key(idea_id) {
                return Err(MutationError::AlreadyPending { idea_id: idea_id.to_owned() });
            }
            let previous = state.my_votes.get(idea_id).copied();
            let Some(idea) = state.idea_mut(idea_id) else {
                return Err(MutationError::UnknownIdea { idea_id: idea_id.to_owned() });
            };

            let pending = PendingVote {
                rollback_up: idea.upvotes,
                rollback_down: idea.downvotes,
                rollback_my: previous,
            };
            match previous {
                Some(VoteKind::Up) => idea.upvotes -= 1,
                Some(VoteKind::Down) => idea.downvotes -= 1,
                None => {}
            }
            // Voting the same way again is a toggle off.
            let next = if previous == Some(kind) { None } else { Some(kind) };
            match next {
                Some(VoteKind::Up) => idea.upvotes += 1,
                Some(VoteKind::Down) => idea.downvotes += 1,
                None => {}
            }
            match next {
                Some(kind) => {
                    state.my_votes.insert(idea_id.to_owned(), kind);
                }
                None => {
                    state.my_votes.remove(idea_id);
                }
            }
            state.pending_votes.insert(idea_id.to_owned(), pending);
        }
        self.notify();

        match self.inner.api.submit_vote(idea_id, kind).await {
            Ok(submitted) => {
                // The submit response is a fallback; the refetch is the
                // authoritative snapshot the UI contract expects.
                let confirmed = match self.inner.api.vote_state(idea_id).await {
                    Ok(state) => state,
                    Err(e) => {
                        debug!(error = %e, idea_id, "vote refetch failed; using submit response");
                        submitted
                    }
                };
                {
                    let mut state = self.lock();
                    state.pending_votes.remove(idea_id);
                    if let Some(idea) = state.idea_mut(idea_id) {
                        idea.upvotes = confirmed.upvotes;
                        idea.downvotes = confirmed.downvotes;
                    }
                    match confirmed.my_vote {
                        Some(kind) => {
                            state.my_votes.insert(idea_id.to_owned(), kind);
                        }
                        None => {
                            state.my_votes.remove(idea_id);
                        }
                    }
                }
                self.notify();
                Ok(confirmed)
            }
            Err(e) => {
                {
                    let mut state = self.lock();
                    if let Some(pending) = state.pending_votes.remove(idea_id) {
                        match pending.rollback_my {
                            Some(kind) => {
                                state.my_votes.insert(idea_id.to_owned(), kind);
                            }
                            None => {
                                state.my_votes.remove(idea_id);
                            }
                        }
                        if let Some(idea) = state.idea_mut(idea_id) {
                            idea.upvotes = pending.rollback_up;
                            idea.downvotes = pending.rollback_down;
                        }
                    }
                }
                self.notify();
                Err(e.into())
            }
        }
    }

    /// Merge a vote broadcast, unless this client's own vote for the idea
    /// is still in flight.
    pub fn apply_vote_update(&self, update: &VoteUpdate) -> Applied {
        let applied = {
            let mut state = self.lock();
            if state.pending_votes.contains_key(&update.idea_id) {
                Applied::Suppressed
            } else if let Some(idea) = state.idea_mut(&update.idea_id) {
                idea.upvotes = update.upvotes;
                idea.downvotes = update.downvotes;
                Applied::Merged
            } else {
                Applied::Ignored
            }
        };
        if applied == Applied::Merged {
            self.notify();
        }
        applied
    }

    /// A vote-removed broadcast zeroes this client's recorded vote.
    pub fn apply_vote_removed(&self, idea_id: &str) -> Applied {
        let removed = {
            let mut state = self.lock();
            if state.pending_votes.contains_key(idea_id) {
                return Applied::Suppressed;
            }
            state.my_votes.remove(idea_id).is_some()
        };
        if removed {
            self.notify();
            Applied::Merged
        } else {
            Applied::Ignored
        }
    }

    // ---- idea create -----------------------------------------------------

    /// Create an idea. A provisional row appears immediately and is
    /// replaced by the confirmed row (from REST or broadcast, whichever
    /// lands first).
    ///
    /// # Errors
    ///
    /// [`MutationError::Rest`] after the provisional row was removed.
    pub async fn create_idea(&self, draft: IdeaDraft) -> Result<Resolution<Idea>, MutationError> {
        let provisional_id = format!("pending-{}", now_ms());
        {
            let mut state = self.lock();
            state.ideas.push(Idea {
                id: provisional_id.clone(),
                title: draft.title.clone(),
                description: draft.description.clone(),
                author_id: self.inner.user_id.clone(),
                author_name: self.inner.user_name.clone(),
                status: "open".to_owned(),
                upvotes: 0,
                downvotes: 0,
                comment_count: 0,
                created_at: now_ms(),
            });
            state
                .pending_creates
                .insert(provisional_id.clone(), PendingCreate { superseded: None });
        }
        self.notify();

        match self.inner.api.create_idea(&draft).await {
            Ok(confirmed) => {
                let resolution = {
                    let mut state = self.lock();
                    let parked = state
                        .pending_creates
                        .remove(&provisional_id)
                        .and_then(|pending| pending.superseded);
                    match parked {
                        Some(adopted) => {
                            // The broadcast already replaced the
                            // provisional row in place.
                            state.ideas.retain(|i| i.id != provisional_id);
                            Resolution::SupersededByBroadcast(adopted)
                        }
                        None => {
                            if let Some(index) = state.idea_index(&provisional_id) {
                                state.ideas[index] = confirmed.clone();
                            } else {
                                state.ideas.push(confirmed.clone());
                            }
                            Resolution::Confirmed(confirmed)
                        }
                    }
                };
                self.notify();
                Ok(resolution)
            }
            Err(e) => {
                {
                    let mut state = self.lock();
                    state.pending_creates.remove(&provisional_id);
                    state.ideas.retain(|i| i.id != provisional_id);
                }
                self.notify();
                Err(e.into())
            }
        }
    }

    /// Merge an idea-created broadcast. A broadcast that matches one of
    /// this client's in-flight creates adopts the provisional row instead
    /// of appending a duplicate.
    pub fn apply_idea_created(&self, idea: &Idea) -> Applied {
        let applied = {
            let mut state = self.lock();
            if state.ideas.iter().any(|i| i.id == idea.id) {
                return Applied::Ignored;
            }
            let own_match = (idea.author_id == self.inner.user_id).then(|| {
                state.pending_creates.keys().find_map(|pid| {
                    let provisional = state.ideas.iter().find(|i| i.id == *pid)?;
                    (provisional.title == idea.title).then(|| pid.clone())
                })
            });
            if let Some(Some(provisional_id)) = own_match {
                if let Some(pending) = state.pending_creates.get_mut(&provisional_id) {
                    pending.superseded = Some(idea.clone());
                }
                if let Some(index) = state.idea_index(&provisional_id) {
                    state.ideas[index] = idea.clone();
                }
                debug!(idea_id = %idea.id, "broadcast adopted a provisional idea");
            } else {
                state.ideas.push(idea.clone());
            }
            Applied::Merged
        };
        self.notify();
        applied
    }

    // ---- idea update / delete -------------------------------------------

    /// Apply a partial update. The patch lands immediately and is exactly
    /// undone if the REST call fails.
    ///
    /// # Errors
    ///
    /// [`MutationError::AlreadyPending`], [`MutationError::UnknownIdea`],
    /// or [`MutationError::Rest`] after rollback.
    pub async fn update_idea(
        &self,
        idea_id: &str,
        patch: IdeaPatch,
    ) -> Result<Idea, MutationError> {
        {
            let mut state = self.lock();
            if state.edit_locked(idea_id) {
                return Err(MutationError::AlreadyPending { idea_id: idea_id.to_owned() });
            }
            let Some(idea) = state.idea_mut(idea_id) else {
                return Err(MutationError::UnknownIdea { idea_id: idea_id.to_owned() });
            };
            let rollback = idea.clone();
            if let Some(title) = &patch.title {
                idea.title = title.clone();
            }
            if let Some(description) = &patch.description {
                idea.description = description.clone();
            }
            if let Some(status) = &patch.status {
                idea.status = status.clone();
            }
            state
                .pending_edits
                .insert(idea_id.to_owned(), PendingEdit { rollback });
        }
        self.notify();

        match self.inner.api.update_idea(idea_id, &patch).await {
            Ok(confirmed) => {
                {
                    let mut state = self.lock();
                    state.pending_edits.remove(idea_id);
                    if let Some(index) = state.idea_index(idea_id) {
                        state.ideas[index] = confirmed.clone();
                    }
                }
                self.notify();
                Ok(confirmed)
            }
            Err(e) => {
                {
                    let mut state = self.lock();
                    if let Some(pending) = state.pending_edits.remove(idea_id) {
                        if let Some(index) = state.idea_index(idea_id) {
                            state.ideas[index] = pending.rollback;
                        }
                    }
                }
                self.notify();
                Err(e.into())
            }
        }
    }

    /// Delete an idea. The row disappears immediately and is restored at
    /// its old position if the REST call fails.
    ///
    /// # Errors
    ///
    /// [`MutationError::AlreadyPending`], [`MutationError::UnknownIdea`],
    /// or [`MutationError::Rest`] after the row was restored.
    pub async fn delete_idea(&self, idea_id: &str) -> Result<(), MutationError> {
        {
            let mut state = self.lock();
            if state.edit_locked(idea_id) {
                return Err(MutationError::AlreadyPending { idea_id: idea_id.to_owned() });
            }
            let Some(index) = state.idea_index(idea_id) else {
                return Err(MutationError::UnknownIdea { idea_id: idea_id.to_owned() });
            };
            let rollback = state.ideas.remove(index);
            state
                .pending_deletes
                .insert(idea_id.to_owned(), PendingDelete { rollback, index });
        }
        self.notify();

        match self.inner.api.delete_idea(idea_id).await {
            Ok(()) => {
                {
                    let mut state = self.lock();
                    state.comments.remove(idea_id);
                    state.my_votes.remove(idea_id);
                    state.pending_deletes.remove(idea_id);
                }
                self.notify();
                Ok(())
            }
            Err(e) => {
                {
                    let mut state = self.lock();
                    if let Some(pending) = state.pending_deletes.remove(idea_id) {
                        let index = pending.index.min(state.ideas.len());
                        state.ideas.insert(index, pending.rollback);
                    }
                }
                self.notify();
                Err(e.into())
            }
        }
    }

    /// Merge an idea-updated broadcast, unless an edit or delete of the
    /// idea is in flight.
    pub fn apply_idea_updated(&self, idea: &Idea) -> Applied {
        let applied = {
            let mut state = self.lock();
            if state.edit_locked(&idea.id) {
                Applied::Suppressed
            } else if let Some(index) = state.idea_index(&idea.id) {
                state.ideas[index] = idea.clone();
                Applied::Merged
            } else {
                Applied::Ignored
            }
        };
        if applied == Applied::Merged {
            self.notify();
        }
        applied
    }

    /// Merge an idea-deleted broadcast, unless an edit or delete of the
    /// idea is in flight.
    pub fn apply_idea_deleted(&self, idea_id: &str) -> Applied {
        let applied = {
            let mut state = self.lock();
            if state.edit_locked(idea_id) {
                Applied::Suppressed
            } else if let Some(index) = state.idea_index(idea_id) {
                state.ideas.remove(index);
                state.comments.remove(idea_id);
                state.my_votes.remove(idea_id);
                Applied::Merged
            } else {
                Applied::Ignored
            }
        };
        if applied == Applied::Merged {
            self.notify();
        }
        applied
    }

    /// Merge a status-changed broadcast.
    pub fn apply_status_updated(&self, idea_id: &str, status: &str) -> Applied {
        let applied = {
            let mut state = self.lock();
            if state.edit_locked(idea_id) {
                Applied::Suppressed
            } else if let Some(idea) = state.idea_mut(idea_id) {
                idea.status = status.to_owned();
                Applied::Merged
            } else {
                Applied::Ignored
            }
        };
        if applied == Applied::Merged {
            self.notify();
        }
        applied
    }

    // ---- comments --------------------------------------------------------

    /// Add a comment. A provisional comment appears immediately and the
    /// idea's comment count bumps; both are undone on failure.
    ///
    /// # Errors
    ///
    /// [`MutationError::UnknownIdea`] or [`MutationError::Rest`] after
    /// rollback.
    pub async fn create_comment(
        &self,
        idea_id: &str,
        content: &str,
    ) -> Result<Resolution<Comment>, MutationError> {
        let provisional_id = format!("pending-{}", now_ms());
        {
            let mut state = self.lock();
            let Some(idea) = state.idea_mut(idea_id) else {
                return Err(MutationError::UnknownIdea { idea_id: idea_id.to_owned() });
            };
            idea.comment_count += 1;
            state.comments.entry(idea_id.to_owned()).or_default().push(Comment {
                id: provisional_id.clone(),
                idea_id: idea_id.to_owned(),
                author_id: self.inner.user_id.clone(),
                author_name: self.inner.user_name.clone(),
                content: content.to_owned(),
                created_at: now_ms(),
            });
            state.pending_comments.insert(
                provisional_id.clone(),
                PendingComment {
                    idea_id: idea_id.to_owned(),
                    content: content.to_owned(),
                    superseded: None,
                },
            );
        }
        self.notify();

        match self.inner.api.create_comment(idea_id, content).await {
            Ok(confirmed) => {
                let resolution = {
                    let mut state = self.lock();
                    let parked = state
                        .pending_comments
                        .remove(&provisional_id)
                        .and_then(|pending| pending.superseded);
                    match parked {
                        Some(adopted) => {
                            if let Some(list) = state.comments.get_mut(idea_id) {
                                list.retain(|c| c.id != provisional_id);
                            }
                            Resolution::SupersededByBroadcast(adopted)
                        }
                        None => {
                            if let Some(list) = state.comments.get_mut(idea_id) {
                                if let Some(slot) = list.iter_mut().find(|c| c.id == provisional_id)
                                {
                                    *slot = confirmed.clone();
                                }
                            }
                            Resolution::Confirmed(confirmed)
                        }
                    }
                };
                self.notify();
                Ok(resolution)
            }
            Err(e) => {
                {
                    let mut state = self.lock();
                    state.pending_comments.remove(&provisional_id);
                    if let Some(list) = state.comments.get_mut(idea_id) {
                        list.retain(|c| c.id != provisional_id);
                    }
                    if let Some(idea) = state.idea_mut(idea_id) {
                        idea.comment_count -= 1;
                    }
                }
                self.notify();
                Err(e.into())
            }
        }
    }

    /// Merge a comment-added broadcast. This client's own in-flight
    /// comment is matched by author and body and adopts the provisional
    /// row instead of duplicating it.
    pub fn apply_comment_added(&self, comment: &Comment) -> Applied {
        let applied = {
            let mut state = self.lock();
            let already = state
                .comments
                .get(&comment.idea_id)
                .is_some_and(|list| list.iter().any(|c| c.id == comment.id));
            if already {
                return Applied::Ignored;
            }

            let own_match = (comment.author_id == self.inner.user_id)
                .then(|| {
                    state.pending_comments.iter().find_map(|(pid, pending)| {
                        (pending.idea_id == comment.idea_id && pending.content == comment.content)
                            .then(|| pid.clone())
                    })
                })
                .flatten();
            if let Some(provisional_id) = own_match {
                if let Some(pending) = state.pending_comments.get_mut(&provisional_id) {
                    pending.superseded = Some(comment.clone());
                }
                if let Some(list) = state.comments.get_mut(&comment.idea_id) {
                    if let Some(slot) = list.iter_mut().find(|c| c.id == provisional_id) {
                        *slot = comment.clone();
                    }
                }
            } else {
                state
                    .comments
                    .entry(comment.idea_id.clone())
                    .or_default()
                    .push(comment.clone());
                if let Some(idea) = state.idea_mut(&comment.idea_id) {
                    idea.comment_count += 1;
                }
            }
            Applied::Merged
        };
        self.notify();
        applied
    }

    /// Merge an updated comment broadcast.
    pub fn apply_comment_updated(&self, comment: &Comment) -> Applied {
        let merged = {
            let mut state = self.lock();
            state
                .comments
                .get_mut(&comment.idea_id)
                .and_then(|list| list.iter_mut().find(|c| c.id == comment.id))
                .map(|slot| *slot = comment.clone())
                .is_some()
        };
        if merged {
            self.notify();
            Applied::Merged
        } else {
            Applied::Ignored
        }
    }

    /// Merge a deleted comment broadcast.
    pub fn apply_comment_deleted(&self, comment_id: &str) -> Applied {
        let merged = {
            let mut state = self.lock();
            let mut owner = None;
            for (idea_id, list) in &mut state.comments {
                let before = list.len();
                list.retain(|c| c.id != comment_id);
                if list.len() < before {
                    owner = Some(idea_id.clone());
                    break;
                }
            }
            if let Some(idea_id) = owner {
                if let Some(idea) = state.idea_mut(&idea_id) {
                    idea.comment_count = (idea.comment_count - 1).max(0);
                }
                true
            } else {
                false
            }
        };
        if merged {
            self.notify();
            Applied::Merged
        } else {
            Applied::Ignored
        }
    }

    /// Merge an authoritative comment-count broadcast, unless this
    /// client's own comment for the idea is still in flight.
    pub fn apply_comment_count(&self, idea_id: &str, count: i64) -> Applied {
        let applied = {
            let mut state = self.lock();
            let own_pending = state
                .pending_comments
                .values()
                .any(|pending| pending.idea_id == idea_id);
            if own_pending {
                Applied::Suppressed
            } else if let Some(idea) = state.idea_mut(idea_id) {
                idea.comment_count = count;
                Applied::Merged
            } else {
                Applied::Ignored
            }
        };
        if applied == Applied::Merged {
            self.notify();
        }
        applied
    }
}

#[cfg(test)]
#[path = "optimistic_test.rs"]
mod tests;
