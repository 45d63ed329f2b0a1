use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use wire::types::ChatUser;

use super::{LocalTypingGate, PresenceEngine};

const SHORT: Duration = Duration::from_millis(40);

async fn settle() {
    tokio::time::sleep(SHORT * 3).await;
}

#[tokio::test]
async fn typing_entry_expires_without_renewal() {
    let engine = PresenceEngine::with_typing_expiry(SHORT);
    engine.note_typing("idea-1", "u1", "Ada");
    assert!(engine.is_typing("idea-1", "u1"));

    settle().await;
    assert!(!engine.is_typing("idea-1", "u1"));
    assert!(engine.typing_users("idea-1").is_empty());
}

#[tokio::test]
async fn renewal_resets_the_expiry_window() {
    let engine = PresenceEngine::with_typing_expiry(Duration::from_millis(100));
    engine.note_typing("idea-1", "u1", "Ada");

    // Keep renewing past the original deadline.
    for _ in 0..4 {
        tokio::time::sleep(Duration::from_millis(60)).await;
        engine.note_typing("idea-1", "u1", "Ada");
        assert!(engine.is_typing("idea-1", "u1"));
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!engine.is_typing("idea-1", "u1"));
}

#[tokio::test]
async fn expiry_is_scoped_to_one_user_and_entity() {
    let engine = PresenceEngine::with_typing_expiry(Duration::from_millis(100));
    engine.note_typing("idea-1", "u1", "Ada");
    tokio::time::sleep(Duration::from_millis(70)).await;
    engine.note_typing("idea-1", "u2", "Grace");
    engine.note_typing("idea-2", "u1", "Ada");

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!engine.is_typing("idea-1", "u1"));
    assert!(engine.is_typing("idea-1", "u2"));
    assert!(engine.is_typing("idea-2", "u1"));
}

#[tokio::test]
async fn renewals_at_the_expiry_boundary_never_drop_the_entry() {
    let engine = PresenceEngine::with_typing_expiry(Duration::from_millis(20));
    engine.note_typing("idea-1", "u1", "Ada");

    // Renew just as the previous window runs out, repeatedly, so a
    // stale timer keeps racing its replacement.
    for _ in 0..6 {
        tokio::time::sleep(Duration::from_millis(18)).await;
        engine.note_typing("idea-1", "u1", "Ada");
        assert!(engine.is_typing("idea-1", "u1"));
    }

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!engine.is_typing("idea-1", "u1"));
}

#[tokio::test]
async fn stopped_typing_removes_immediately_and_cancels_the_timer() {
    let engine = PresenceEngine::with_typing_expiry(Duration::from_secs(30));
    engine.note_typing("idea-1", "u1", "Ada");
    engine.note_stopped_typing("idea-1", "u1");
    assert!(!engine.is_typing("idea-1", "u1"));

    // Stopping an unknown user changes nothing.
    engine.note_stopped_typing("idea-1", "u9");
}

#[tokio::test]
async fn typing_users_reports_sorted_display_names() {
    let engine = PresenceEngine::with_typing_expiry(Duration::from_secs(30));
    engine.note_typing("idea-1", "u2", "Grace");
    engine.note_typing("idea-1", "u1", "Ada");
    assert_eq!(engine.typing_users("idea-1"), vec!["Ada".to_owned(), "Grace".to_owned()]);
}

#[tokio::test]
async fn idle_clears_every_viewing_entry_for_the_user() {
    let engine = PresenceEngine::new();
    engine.note_viewing("u1", "idea-1");
    engine.note_viewing("u1", "idea-2");
    engine.note_viewing("u2", "idea-1");
    assert_eq!(engine.viewers("idea-1"), vec!["u1".to_owned(), "u2".to_owned()]);

    engine.note_idle("u1");
    assert!(engine.viewing("u1").is_empty());
    assert_eq!(engine.viewers("idea-1"), vec!["u2".to_owned()]);
    assert!(engine.viewers("idea-2").is_empty());
}

#[tokio::test]
async fn viewing_accumulates_across_entities() {
    let engine = PresenceEngine::new();
    engine.note_viewing("u1", "idea-1");
    engine.note_viewing("u1", "idea-2");
    // No implicit removal: only an idle signal shrinks the sets.
    assert_eq!(engine.viewing("u1"), vec!["idea-1".to_owned(), "idea-2".to_owned()]);
    assert_eq!(engine.viewers("idea-1"), vec!["u1".to_owned()]);
    assert_eq!(engine.viewers("idea-2"), vec!["u1".to_owned()]);
}

#[tokio::test]
async fn change_observer_fires_on_mutations() {
    let engine = PresenceEngine::with_typing_expiry(SHORT);
    let changes = Arc::new(AtomicUsize::new(0));
    {
        let changes = Arc::clone(&changes);
        engine.on_change(move || {
            changes.fetch_add(1, Ordering::SeqCst);
        });
    }

    engine.note_typing("idea-1", "u1", "Ada");
    engine.note_viewing("u1", "idea-1");
    engine.set_active_users(vec![ChatUser {
        user_id: "u1".into(),
        user_name: "Ada".into(),
    }]);
    assert_eq!(changes.load(Ordering::SeqCst), 3);

    // Expiry counts as a change too.
    settle().await;
    assert_eq!(changes.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn shutdown_freezes_state_and_aborts_timers() {
    let engine = PresenceEngine::with_typing_expiry(SHORT);
    engine.note_typing("idea-1", "u1", "Ada");
    engine.shutdown();

    engine.note_typing("idea-1", "u2", "Grace");
    engine.note_viewing("u2", "idea-1");
    assert!(!engine.is_typing("idea-1", "u2"));
    assert!(engine.viewing("u2").is_empty());

    // The pre-shutdown entry stays put: its timer was aborted.
    settle().await;
    assert!(engine.is_typing("idea-1", "u1"));
}

#[test]
fn local_gate_allows_one_send_per_interval() {
    let gate = LocalTypingGate::with_interval(Duration::from_secs(30));
    assert!(gate.should_send());
    assert!(!gate.should_send());
    assert!(!gate.should_send());
}

#[test]
fn local_gate_reset_reopens_immediately() {
    let gate = LocalTypingGate::with_interval(Duration::from_secs(30));
    assert!(gate.should_send());
    gate.reset();
    assert!(gate.should_send());
}

#[tokio::test]
async fn local_gate_reopens_after_the_interval() {
    let gate = LocalTypingGate::with_interval(Duration::from_millis(20));
    assert!(gate.should_send());
    assert!(!gate.should_send());
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(gate.should_send());
}
