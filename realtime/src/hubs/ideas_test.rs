use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use wire::Envelope;
use wire::types::Idea;

use super::IdeasHub;
use crate::optimistic::IdeaSync;
use crate::registry::HubRegistry;
use crate::rest::{IdeaApi, RestError};
use crate::transport::test_support::MockConnector;

struct NoopApi;

#[async_trait::async_trait]
impl IdeaApi for NoopApi {
    async fn list_ideas(&self) -> Result<Vec<Idea>, RestError> {
        Ok(Vec::new())
    }
    async fn create_idea(&self, _: &wire::types::IdeaDraft) -> Result<Idea, RestError> {
        Err(RestError::NoSession)
    }
    async fn update_idea(&self, _: &str, _: &wire::types::IdeaPatch) -> Result<Idea, RestError> {
        Err(RestError::NoSession)
    }
    async fn delete_idea(&self, _: &str) -> Result<(), RestError> {
        Err(RestError::NoSession)
    }
    async fn list_comments(&self, _: &str) -> Result<Vec<wire::types::Comment>, RestError> {
        Ok(Vec::new())
    }
    async fn create_comment(&self, _: &str, _: &str) -> Result<wire::types::Comment, RestError> {
        Err(RestError::NoSession)
    }
    async fn submit_vote(
        &self,
        _: &str,
        _: wire::types::VoteKind,
    ) -> Result<wire::types::VoteState, RestError> {
        Err(RestError::NoSession)
    }
    async fn vote_state(&self, _: &str) -> Result<wire::types::VoteState, RestError> {
        Err(RestError::NoSession)
    }
}

fn fixture() -> (Arc<MockConnector>, IdeasHub, IdeaSync) {
    let connector = Arc::new(MockConnector::default());
    let registry = HubRegistry::new(
        "http://localhost:8080",
        Arc::clone(&connector) as Arc<dyn crate::transport::Connector>,
        Arc::new(|| None),
    );
    let sync = IdeaSync::new(Arc::new(NoopApi), "me", "Me");
    (connector, IdeasHub::new(registry), sync)
}

fn idea_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": "T",
        "description": "",
        "authorId": "other",
        "authorName": "Them",
        "status": "open",
        "upvotes": 3,
        "downvotes": 1,
        "commentCount": 0,
        "createdAt": 1000,
    })
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
async fn attached_sync_tracks_idea_broadcasts() {
    let (connector, hub, sync) = fixture();
    hub.connect().await.unwrap();
    hub.attach_sync(&sync);

    let session = connector.session(0);
    session.push_text(&wire::encode_envelope(&Envelope::event("OnIdeaCreated", idea_json("i-1"))));
    {
        let sync = sync.clone();
        wait_until(move || sync.idea("i-1").is_some()).await;
    }

    let vote = Envelope::event(
        "OnVoteUpdated",
        json!({ "ideaId": "i-1", "upvotes": 9, "downvotes": 2 }),
    );
    session.push_text(&wire::encode_envelope(&vote));
    {
        let sync = sync.clone();
        wait_until(move || sync.idea("i-1").is_some_and(|i| i.upvotes == 9)).await;
    }

    let status = Envelope::event(
        "OnIdeaStatusUpdated",
        json!({ "ideaId": "i-1", "status": "planned" }),
    );
    session.push_text(&wire::encode_envelope(&status));
    {
        let sync = sync.clone();
        wait_until(move || sync.idea("i-1").is_some_and(|i| i.status == "planned")).await;
    }

    session.push_text(&wire::encode_envelope(&Envelope::event(
        "OnIdeaDeleted",
        json!({ "ideaId": "i-1" }),
    )));
    {
        let sync = sync.clone();
        wait_until(move || sync.idea("i-1").is_none()).await;
    }
}

#[tokio::test]
async fn malformed_broadcasts_are_dropped_not_fatal() {
    let (connector, hub, sync) = fixture();
    hub.connect().await.unwrap();
    hub.attach_sync(&sync);

    let session = connector.session(0);
    // Bad payload for a known target, then a good one.
    session.push_text(&wire::encode_envelope(&Envelope::event(
        "OnIdeaCreated",
        json!({ "nope": true }),
    )));
    session.push_text(&wire::encode_envelope(&Envelope::event("OnIdeaCreated", idea_json("i-2"))));

    {
        let sync = sync.clone();
        wait_until(move || sync.idea("i-2").is_some()).await;
    }
    assert_eq!(sync.ideas().len(), 1);
}

#[tokio::test]
async fn attach_before_connect_is_a_no_op() {
    let (connector, hub, sync) = fixture();
    hub.attach_sync(&sync);
    assert_eq!(connector.connect_count(), 0);
    assert!(!hub.is_connected());
}

#[tokio::test]
async fn typed_subscription_delivers_parsed_ideas() {
    let (connector, hub, _sync) = fixture();
    hub.connect().await.unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    hub.on_idea_created(move |idea| {
        let _ = tx.send(idea);
    });

    connector
        .session(0)
        .push_text(&wire::encode_envelope(&Envelope::event("OnIdeaCreated", idea_json("i-3"))));

    let idea = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(1)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(idea.id, "i-3");
    assert_eq!(idea.upvotes, 3);
}
