//! Shared wire model for the realtime hub protocol.
//!
//! This crate owns the message representation used on every hub channel:
//! the [`Envelope`] type, its JSON codec, the domain payload DTOs, and the
//! typed per-hub event enums that hub clients dispatch on. Payloads stay
//! flexible (`serde_json::Value`) on the envelope itself; typed decoding
//! happens at the hub-client boundary via [`events`].

pub mod events;
pub mod types;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned by [`decode_envelope`] and typed event parsing.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw text could not be decoded as an [`Envelope`].
    #[error("failed to decode envelope: {0}")]
    Decode(#[from] serde_json::Error),
    /// The envelope decoded, but its payload does not match the typed
    /// event payload for `target`.
    #[error("malformed payload for event `{target}`")]
    Payload {
        /// Wire name of the event whose payload failed to parse.
        target: String,
    },
}

/// Role of an envelope on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Client-to-server method call (e.g. `SendMessage`).
    Invocation,
    /// Server-to-client broadcast (e.g. `OnVoteUpdated`).
    Event,
    /// Server-reported failure for a prior invocation.
    Error,
}

/// A single message on a hub channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique identifier for this envelope (UUID string).
    pub id: String,
    /// Milliseconds since the Unix epoch when the envelope was created.
    pub ts: i64,
    /// Hub this envelope belongs to, if stamped by the sender.
    #[serde(default)]
    pub hub: Option<String>,
    /// Method or event name, e.g. `"SendTypingActivity"` or `"OnUserTyping"`.
    pub target: String,
    /// Role of this envelope.
    pub kind: Kind,
    /// Arbitrary JSON payload.
    pub data: Value,
}

impl Envelope {
    /// Build a client-to-server invocation with a fresh id.
    #[must_use]
    pub fn invocation(target: &str, data: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ts: now_ms(),
            hub: None,
            target: target.to_owned(),
            kind: Kind::Invocation,
            data,
        }
    }

    /// Build a server-to-client event with a fresh id.
    #[must_use]
    pub fn event(target: &str, data: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ts: now_ms(),
            hub: None,
            target: target.to_owned(),
            kind: Kind::Event,
            data,
        }
    }

    /// Stamp the hub name onto this envelope.
    #[must_use]
    pub fn with_hub(mut self, hub: &str) -> Self {
        self.hub = Some(hub.to_owned());
        self
    }
}

/// Encode an envelope as JSON text.
#[must_use]
pub fn encode_envelope(envelope: &Envelope) -> String {
    // Serializing Envelope cannot fail: all fields are plain JSON-friendly
    // types and `Value` keys are strings.
    serde_json::to_string(envelope).unwrap_or_default()
}

/// Decode JSON text into an envelope.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed or mis-shaped JSON.
pub fn decode_envelope(text: &str) -> Result<Envelope, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
