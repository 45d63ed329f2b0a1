use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;

use wire::Envelope;

use super::{ChatHub, events};
use crate::dispatch::handler;
use crate::registry::{HubRegistry, RegistryError};
use crate::transport::TransportEvent;
use crate::transport::test_support::MockConnector;

fn fixture() -> (Arc<MockConnector>, ChatHub) {
    let connector = Arc::new(MockConnector::default());
    let registry = HubRegistry::new(
        "http://localhost:8080",
        Arc::clone(&connector) as Arc<dyn crate::transport::Connector>,
        Arc::new(|| None),
    );
    (connector, ChatHub::new(registry))
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn calls_before_connect_fail_synchronously() {
    let (_, hub) = fixture();
    let err = hub.send_message("general", "hi").await.unwrap_err();
    assert!(matches!(err, RegistryError::NotConnected { .. }));
}

#[tokio::test]
async fn send_message_encodes_room_and_content() {
    let (connector, hub) = fixture();
    hub.connect().await.unwrap();

    hub.join_chat("me").await.unwrap();
    hub.join_room("general").await.unwrap();
    hub.send_message("general", "hello").await.unwrap();

    let frames = connector.session(0).sent_frames();
    assert_eq!(frames.len(), 3);
    let send = wire::decode_envelope(&frames[2]).unwrap();
    assert_eq!(send.target, "SendMessage");
    assert_eq!(send.data["room"], "general");
    assert_eq!(send.data["content"], "hello");
}

#[tokio::test]
async fn inbound_messages_fan_out_under_local_names() {
    let (connector, hub) = fixture();
    hub.connect().await.unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    let on_message = {
        let hits = Arc::clone(&hits);
        handler(move |data| {
            assert_eq!(data["content"], "hi all");
            hits.fetch_add(1, Ordering::SeqCst);
        })
    };
    // Two independent consumers on the same event.
    hub.dispatcher().on(events::MESSAGE_RECEIVED, &on_message);
    let counter = {
        let hits = Arc::clone(&hits);
        handler(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    };
    hub.dispatcher().on(events::MESSAGE_RECEIVED, &counter);

    let envelope = Envelope::event(
        "ReceiveMessage",
        json!({
            "id": "m-1",
            "room": "general",
            "userId": "u1",
            "userName": "Ada",
            "content": "hi all",
            "ts": 1000,
        }),
    );
    connector.session(0).push_text(&wire::encode_envelope(&envelope));

    {
        let hits = Arc::clone(&hits);
        wait_until(move || hits.load(Ordering::SeqCst) == 2).await;
    }

    // Detaching one consumer leaves the other.
    hub.dispatcher().off(events::MESSAGE_RECEIVED, &counter);
    assert_eq!(hub.dispatcher().handler_count(events::MESSAGE_RECEIVED), 1);
}

#[tokio::test]
async fn is_connected_is_false_while_reconnecting() {
    let (connector, hub) = fixture();
    assert!(!hub.is_connected());
    hub.connect().await.unwrap();
    assert!(hub.is_connected());

    let session = connector.session(0);
    let _ = session.events.send(TransportEvent::Reconnecting);
    wait_until(|| !hub.is_connected()).await;

    let _ = session.events.send(TransportEvent::Reconnected);
    wait_until(|| hub.is_connected()).await;
}

#[tokio::test]
async fn lifecycle_maps_to_dispatcher_events() {
    let (connector, hub) = fixture();
    hub.connect().await.unwrap();

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    for event in [events::CONNECTING, events::RECONNECTED, events::DISCONNECTED] {
        let seen = Arc::clone(&seen);
        hub.dispatcher().on(event, &handler(move |_| {
            seen.lock().unwrap().push(event);
        }));
    }

    let session = connector.session(0);
    let _ = session.events.send(TransportEvent::Reconnecting);
    let _ = session.events.send(TransportEvent::Reconnected);
    let _ = session.events.send(TransportEvent::Closed);

    {
        let seen = Arc::clone(&seen);
        wait_until(move || seen.lock().unwrap().len() == 3).await;
    }
    assert_eq!(
        *seen.lock().unwrap(),
        vec![events::CONNECTING, events::RECONNECTED, events::DISCONNECTED]
    );
    assert!(!hub.is_connected());
}
