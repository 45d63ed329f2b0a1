use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;

use super::{EventDispatcher, handler};

#[test]
fn handlers_fire_in_registration_order() {
    let dispatcher = EventDispatcher::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for tag in ["first", "second", "third"] {
        let order = Arc::clone(&order);
        dispatcher.on("messageReceived", &handler(move |_| {
            order.lock().unwrap().push(tag);
        }));
    }

    dispatcher.emit("messageReceived", &json!({}));
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn off_removes_only_the_matching_handle() {
    let dispatcher = EventDispatcher::new();
    let hits = Arc::new(AtomicUsize::new(0));

    let make = |hits: &Arc<AtomicUsize>| {
        let hits = Arc::clone(hits);
        handler(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    };
    let kept = make(&hits);
    let removed = make(&hits);
    dispatcher.on("voteUpdated", &kept);
    dispatcher.on("voteUpdated", &removed);

    dispatcher.off("voteUpdated", &removed);
    assert_eq!(dispatcher.handler_count("voteUpdated"), 1);

    dispatcher.emit("voteUpdated", &json!({}));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn off_for_unknown_event_is_a_no_op() {
    let dispatcher = EventDispatcher::new();
    dispatcher.off("missing", &handler(|_| {}));
    assert_eq!(dispatcher.handler_count("missing"), 0);
}

#[test]
fn panicking_handler_does_not_stop_the_rest() {
    let dispatcher = EventDispatcher::new();
    let hits = Arc::new(AtomicUsize::new(0));

    dispatcher.on("notificationReceived", &handler(|_| panic!("boom")));
    {
        let hits = Arc::clone(&hits);
        dispatcher.on("notificationReceived", &handler(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        }));
    }

    dispatcher.emit("notificationReceived", &json!({}));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn handler_may_unsubscribe_itself_during_emit() {
    let dispatcher = EventDispatcher::new();
    let hits = Arc::new(AtomicUsize::new(0));

    let slot: Arc<Mutex<Option<super::Handler>>> = Arc::new(Mutex::new(None));
    let once = {
        let dispatcher = dispatcher.clone();
        let slot = Arc::clone(&slot);
        let hits = Arc::clone(&hits);
        handler(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            if let Some(me) = slot.lock().unwrap().take() {
                dispatcher.off("userJoined", &me);
            }
        })
    };
    *slot.lock().unwrap() = Some(Arc::clone(&once));
    dispatcher.on("userJoined", &once);

    dispatcher.emit("userJoined", &json!({}));
    dispatcher.emit("userJoined", &json!({}));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn clones_share_one_handler_table() {
    let dispatcher = EventDispatcher::new();
    let twin = dispatcher.clone();
    let hits = Arc::new(AtomicUsize::new(0));

    {
        let hits = Arc::clone(&hits);
        dispatcher.on("userLeft", &handler(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        }));
    }

    twin.emit("userLeft", &json!({}));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
