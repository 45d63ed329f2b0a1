//! REST companion to the realtime layer.
//!
//! The backend's mutation and query endpoints are plain HTTP; realtime
//! hubs only carry broadcasts. [`IdeaApi`] is the trait seam the
//! optimistic tracker talks to, so tests substitute an in-memory fake
//! while production uses [`RestClient`] over reqwest.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use wire::types::{Comment, Idea, IdeaDraft, IdeaPatch, VoteKind, VoteState};

use crate::transport::TokenProvider;

/// Error type for REST operations.
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// Transport-level or deserialization failure from reqwest.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The caller has not logged in yet.
    #[error("no session token; login first")]
    NoSession,
}

/// Authenticated session returned by login.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
}

/// Backend mutation and query surface used by the sync layer.
#[async_trait]
pub trait IdeaApi: Send + Sync {
    async fn list_ideas(&self) -> Result<Vec<Idea>, RestError>;
    async fn create_idea(&self, draft: &IdeaDraft) -> Result<Idea, RestError>;
    async fn update_idea(&self, idea_id: &str, patch: &IdeaPatch) -> Result<Idea, RestError>;
    async fn delete_idea(&self, idea_id: &str) -> Result<(), RestError>;
    async fn list_comments(&self, idea_id: &str) -> Result<Vec<Comment>, RestError>;
    async fn create_comment(&self, idea_id: &str, content: &str) -> Result<Comment, RestError>;
    async fn submit_vote(&self, idea_id: &str, kind: VoteKind) -> Result<VoteState, RestError>;
    async fn vote_state(&self, idea_id: &str) -> Result<VoteState, RestError>;
}

/// reqwest-backed [`IdeaApi`] implementation.
pub struct RestClient {
    base_url: String,
    http: reqwest::Client,
    token: Arc<Mutex<Option<String>>>,
}

impl RestClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http: reqwest::Client::new(),
            token: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Snapshot of the current session token, shared with the websocket
    /// layer so reconnect handshakes pick up a refreshed token.
    #[must_use]
    pub fn token_provider(&self) -> TokenProvider {
        let token = Arc::clone(&self.token);
        Arc::new(move || token.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    /// Authenticate and store the session token for later calls.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Http`] when the request fails or the backend
    /// rejects the credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, RestError> {
        let session: Session = self
            .http
            .post(self.url("auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.token.clone());
        Ok(session)
    }

    /// Adopt an existing token without a login round trip.
    pub fn set_token(&self, token: &str) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
    }

    fn bearer(&self) -> Result<String, RestError> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(RestError::NoSession)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, RestError> {
        Ok(self
            .http
            .get(self.url(path))
            .bearer_auth(self.bearer()?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, RestError> {
        Ok(self
            .http
            .post(self.url(path))
            .bearer_auth(self.bearer()?)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

#[async_trait]
impl IdeaApi for RestClient {
    async fn list_ideas(&self) -> Result<Vec<Idea>, RestError> {
        self.get_json("ideas").await
    }

    async fn create_idea(&self, draft: &IdeaDraft) -> Result<Idea, RestError> {
        self.post_json("ideas", &serde_json::to_value(draft).unwrap_or_default()).await
    }

    async fn update_idea(&self, idea_id: &str, patch: &IdeaPatch) -> Result<Idea, RestError> {
        Ok(self
            .http
            .put(self.url(&format!("ideas/{idea_id}")))
            .bearer_auth(self.bearer()?)
            .json(patch)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn delete_idea(&self, idea_id: &str) -> Result<(), RestError> {
        self.http
            .delete(self.url(&format!("ideas/{idea_id}")))
            .bearer_auth(self.bearer()?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn list_comments(&self, idea_id: &str) -> Result<Vec<Comment>, RestError> {
        self.get_json(&format!("ideas/{idea_id}/comments")).await
    }

    async fn create_comment(&self, idea_id: &str, content: &str) -> Result<Comment, RestError> {
        self.post_json(
            &format!("ideas/{idea_id}/comments"),
            &json!({ "content": content }),
        )
        .await
    }

    async fn submit_vote(&self, idea_id: &str, kind: VoteKind) -> Result<VoteState, RestError> {
        self.post_json("votes", &json!({ "ideaId": idea_id, "kind": kind })).await
    }

    async fn vote_state(&self, idea_id: &str) -> Result<VoteState, RestError> {
        self.get_json(&format!("votes/{idea_id}")).await
    }
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
