use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use wire::Envelope;

use super::VotesHub;
use crate::registry::HubRegistry;
use crate::transport::test_support::MockConnector;

fn fixture() -> (Arc<MockConnector>, VotesHub) {
    let connector = Arc::new(MockConnector::default());
    let registry = HubRegistry::new(
        "http://localhost:8080",
        Arc::clone(&connector) as Arc<dyn crate::transport::Connector>,
        Arc::new(|| None),
    );
    (connector, VotesHub::new(registry))
}

#[tokio::test]
async fn typed_subscription_delivers_vote_updates() {
    let (connector, hub) = fixture();
    hub.connect().await.unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    hub.on_vote_updated(move |update| {
        let _ = tx.send(update);
    });

    let session = connector.session(0);
    // A malformed payload first; it is dropped.
    session.push_text(&wire::encode_envelope(&Envelope::event(
        "OnVoteUpdated",
        json!({ "bogus": true }),
    )));
    session.push_text(&wire::encode_envelope(&Envelope::event(
        "OnVoteUpdated",
        json!({ "ideaId": "i-1", "upvotes": 5, "downvotes": 2 }),
    )));

    let (update, rx) =
        tokio::task::spawn_blocking(move || (rx.recv_timeout(Duration::from_secs(1)), rx))
            .await
            .unwrap();
    let update = update.unwrap();
    assert_eq!(update.idea_id, "i-1");
    assert_eq!((update.upvotes, update.downvotes), (5, 2));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn off_detaches_the_subscription() {
    let (connector, hub) = fixture();
    hub.connect().await.unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    hub.on_vote_updated(move |update| {
        let _ = tx.send(update);
    });
    hub.off_vote_updated();

    connector.session(0).push_text(&wire::encode_envelope(&Envelope::event(
        "OnVoteUpdated",
        json!({ "ideaId": "i-1", "upvotes": 5, "downvotes": 2 }),
    )));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}
