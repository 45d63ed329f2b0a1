//! Presence and activity tracking.
//!
//! DESIGN
//! ======
//! The engine keeps three views of remote activity: who is typing on
//! which entity, which entities each user is viewing, and the server's
//! active-user roster. Viewing sets only shrink on an idle signal for
//! the user. Typing entries self-expire: each (entity, user)
//! pair carries a timer that removes the entry after
//! [`TYPING_EXPIRY`] unless renewed by a fresh typing event first.
//! Renewal replaces the timer, so a user typing steadily never flickers
//! out of the list.
//!
//! [`LocalTypingGate`] is the outbound counterpart: it throttles how
//! often this client announces its own typing, independent of the
//! remote expiry above.
//!
//! Teardown sets a shutdown flag before aborting timers, so a timer
//! that already fired cannot mutate state afterwards. Each armed timer
//! carries an epoch; a timer that raced past its sleep while a renewal
//! replaced it sees a newer epoch in the table and backs off instead of
//! removing the freshly renewed entry.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use wire::types::ChatUser;

/// How long a remote typing indicator stays alive without renewal.
pub const TYPING_EXPIRY: Duration = Duration::from_secs(5);

/// Minimum interval between this client's own typing announcements.
pub const LOCAL_TYPING_INTERVAL: Duration = Duration::from_secs(3);

type ChangeHandler = Arc<dyn Fn() + Send + Sync>;
type TimerKey = (String, String);

struct TimerSlot {
    epoch: u64,
    handle: JoinHandle<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct PresenceInner {
    typing_expiry: Duration,
    shutdown: AtomicBool,
    // entity id -> user id -> display name
    typing: Mutex<HashMap<String, HashMap<String, String>>>,
    // user id -> entity ids; a user can view several entities at once
    viewing: Mutex<HashMap<String, HashSet<String>>>,
    active: Mutex<Vec<ChatUser>>,
    timers: Mutex<HashMap<TimerKey, TimerSlot>>,
    timer_epoch: AtomicU64,
    changed: Mutex<Option<ChangeHandler>>,
}

/// Tracks remote user activity. Clones share state.
#[derive(Clone)]
pub struct PresenceEngine {
    inner: Arc<PresenceInner>,
}

impl Default for PresenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_typing_expiry(TYPING_EXPIRY)
    }

    /// Engine with a custom expiry window. Tests shorten it.
    #[must_use]
    pub fn with_typing_expiry(typing_expiry: Duration) -> Self {
        Self {
            inner: Arc::new(PresenceInner {
                typing_expiry,
                shutdown: AtomicBool::new(false),
                typing: Mutex::new(HashMap::new()),
                viewing: Mutex::new(HashMap::new()),
                active: Mutex::new(Vec::new()),
                timers: Mutex::new(HashMap::new()),
                timer_epoch: AtomicU64::new(0),
                changed: Mutex::new(None),
            }),
        }
    }

    /// Register the change observer. One slot; registering again replaces.
    pub fn on_change(&self, handler: impl Fn() + Send + Sync + 'static) {
        *lock(&self.inner.changed) = Some(Arc::new(handler));
    }

    /// Record a typing event and (re)arm its expiry timer.
    pub fn note_typing(&self, entity_id: &str, user_id: &str, user_name: &str) {
        if self.inner.shutdown.load(Ordering::SeqCst) {
            return;
        }
        lock(&self.inner.typing)
            .entry(entity_id.to_owned())
            .or_default()
            .insert(user_id.to_owned(), user_name.to_owned());
        self.arm_expiry(entity_id, user_id);
        self.notify();
    }

    /// Record an explicit stopped-typing event: the entry and its timer
    /// go away immediately.
    pub fn note_stopped_typing(&self, entity_id: &str, user_id: &str) {
        self.cancel_timer(entity_id, user_id);
        let removed = self.remove_typing(entity_id, user_id);
        if removed {
            self.notify();
        }
    }

    /// Add an entity to a user's viewing set. Viewing has no timeout and
    /// accumulates until an idle signal.
    pub fn note_viewing(&self, user_id: &str, entity_id: &str) {
        if self.inner.shutdown.load(Ordering::SeqCst) {
            return;
        }
        lock(&self.inner.viewing)
            .entry(user_id.to_owned())
            .or_default()
            .insert(entity_id.to_owned());
        self.notify();
    }

    /// An idle user is removed from every entity's viewing set.
    pub fn note_idle(&self, user_id: &str) {
        let removed = lock(&self.inner.viewing).remove(user_id).is_some();
        if removed {
            self.notify();
        }
    }

    /// Replace the active-user roster with the server's authoritative list.
    pub fn set_active_users(&self, users: Vec<ChatUser>) {
        if self.inner.shutdown.load(Ordering::SeqCst) {
            return;
        }
        *lock(&self.inner.active) = users;
        self.notify();
    }

    /// Display names currently typing on an entity.
    #[must_use]
    pub fn typing_users(&self, entity_id: &str) -> Vec<String> {
        lock(&self.inner.typing)
            .get(entity_id)
            .map(|users| {
                let mut names: Vec<_> = users.values().cloned().collect();
                names.sort();
                names
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_typing(&self, entity_id: &str, user_id: &str) -> bool {
        lock(&self.inner.typing)
            .get(entity_id)
            .is_some_and(|users| users.contains_key(user_id))
    }

    /// Entities a user is viewing, sorted.
    #[must_use]
    pub fn viewing(&self, user_id: &str) -> Vec<String> {
        let mut ids: Vec<_> = lock(&self.inner.viewing)
            .get(user_id)
            .map(|entities| entities.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// User ids viewing an entity.
    #[must_use]
    pub fn viewers(&self, entity_id: &str) -> Vec<String> {
        let mut ids: Vec<_> = lock(&self.inner.viewing)
            .iter()
            .filter(|(_, entities)| entities.contains(entity_id))
            .map(|(user, _)| user.clone())
            .collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn active_users(&self) -> Vec<ChatUser> {
        lock(&self.inner.active).clone()
    }

    /// Stop the engine: no further mutations land, and every pending
    /// expiry timer is aborted.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::SeqCst);
        for (_, timer) in lock(&self.inner.timers).drain() {
            timer.handle.abort();
        }
    }

    fn arm_expiry(&self, entity_id: &str, user_id: &str) {
        let key = (entity_id.to_owned(), user_id.to_owned());
        let engine = self.clone();
        let expiry = self.inner.typing_expiry;
        let epoch = self.inner.timer_epoch.fetch_add(1, Ordering::SeqCst);
        let handle = tokio::spawn({
            let key = key.clone();
            async move {
                tokio::time::sleep(expiry).await;
                if engine.inner.shutdown.load(Ordering::SeqCst) {
                    return;
                }
                // A renewal may have replaced this timer after the sleep
                // elapsed but before abort could land; only the timer
                // still registered for the key may expire the entry.
                {
                    let mut timers = lock(&engine.inner.timers);
                    match timers.get(&key) {
                        Some(slot) if slot.epoch == epoch => {
                            timers.remove(&key);
                        }
                        _ => return,
                    }
                }
                if engine.remove_typing(&key.0, &key.1) {
                    engine.notify();
                }
            }
        });
        if let Some(previous) = lock(&self.inner.timers).insert(key, TimerSlot { epoch, handle }) {
            previous.handle.abort();
        }
    }

    fn cancel_timer(&self, entity_id: &str, user_id: &str) {
        let key = (entity_id.to_owned(), user_id.to_owned());
        if let Some(timer) = lock(&self.inner.timers).remove(&key) {
            timer.handle.abort();
        }
    }

    fn remove_typing(&self, entity_id: &str, user_id: &str) -> bool {
        let mut typing = lock(&self.inner.typing);
        let Some(users) = typing.get_mut(entity_id) else {
            return false;
        };
        let removed = users.remove(user_id).is_some();
        if users.is_empty() {
            typing.remove(entity_id);
        }
        removed
    }

    fn notify(&self) {
        let handler = lock(&self.inner.changed).clone();
        if let Some(handler) = handler {
            handler();
        }
    }
}

/// Throttle for this client's own typing announcements.
pub struct LocalTypingGate {
    interval: Duration,
    last_sent: Mutex<Option<Instant>>,
}

impl Default for LocalTypingGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalTypingGate {
    #[must_use]
    pub fn new() -> Self {
        Self::with_interval(LOCAL_TYPING_INTERVAL)
    }

    #[must_use]
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval, last_sent: Mutex::new(None) }
    }

    /// Whether a typing announcement should go out now. Returns true at
    /// most once per interval and records the send time when it does.
    pub fn should_send(&self) -> bool {
        let mut last = lock(&self.last_sent);
        let now = Instant::now();
        match *last {
            Some(at) if now.duration_since(at) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Forget the last send, so the next keystroke announces immediately.
    /// Called after sending a message or an explicit stopped-typing.
    pub fn reset(&self) {
        *lock(&self.last_sent) = None;
    }
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
