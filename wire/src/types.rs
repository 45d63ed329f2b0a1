//! Domain payload DTOs for the hub and REST boundaries.
//!
//! DESIGN
//! ======
//! These types intentionally mirror backend payloads so serde round-trips
//! stay lossless and dispatch code can remain schema-driven. Wire JSON uses
//! camelCase keys; counters may arrive as floats from loosely typed
//! backends, so they go through lenient numeric deserializers.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// An idea as represented on the wire and in local visible state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    /// Unique idea identifier. Locally synthesized creates carry a
    /// provisional `pending-<ts>` id until the backend confirms.
    pub id: String,
    /// Short title shown in idea lists.
    pub title: String,
    /// Full description body.
    #[serde(default)]
    pub description: String,
    /// Author user identifier.
    pub author_id: String,
    /// Author display name.
    #[serde(default)]
    pub author_name: String,
    /// Workflow status label (e.g. `"open"`, `"planned"`, `"done"`).
    #[serde(default)]
    pub status: String,
    /// Authoritative upvote display count.
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub upvotes: i64,
    /// Authoritative downvote display count.
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub downvotes: i64,
    /// Authoritative comment count.
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub comment_count: i64,
    /// Creation timestamp in milliseconds since the Unix epoch.
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub created_at: i64,
}

impl Idea {
    /// Whether this entity is a locally synthesized provisional create.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.id.starts_with("pending-")
    }
}

/// Fields the caller supplies when creating an idea.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Partial update for an existing idea. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A comment on an idea.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique comment identifier (provisional `pending-<ts>` until confirmed).
    pub id: String,
    /// Idea this comment belongs to.
    pub idea_id: String,
    /// Author user identifier.
    pub author_id: String,
    /// Author display name.
    #[serde(default)]
    pub author_name: String,
    /// Comment body.
    pub content: String,
    /// Creation timestamp in milliseconds since the Unix epoch.
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub created_at: i64,
}

/// Direction of a user's vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Up,
    Down,
}

/// Authoritative display counts broadcast after any vote change.
///
/// Counts are absolute values, not deltas: a later update always replaces
/// an earlier one regardless of arrival order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteUpdate {
    pub idea_id: String,
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub upvotes: i64,
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub downvotes: i64,
}

/// Confirmed vote state for one idea from the caller's perspective.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteState {
    pub idea_id: String,
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub upvotes: i64,
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub downvotes: i64,
    /// The requesting user's own recorded vote, if any.
    #[serde(default)]
    pub my_vote: Option<VoteKind>,
}

/// A chat message in a room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub room: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    pub content: String,
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub ts: i64,
}

/// A chat participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
}

/// A user-facing notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    /// Machine-readable notification kind (e.g. `"idea_voted"`).
    pub kind: String,
    /// Idea this notification refers to, if any.
    #[serde(default)]
    pub idea_id: Option<String>,
    /// Human-readable message body.
    pub message: String,
    /// Whether the user has marked this notification as read.
    #[serde(default)]
    pub read: bool,
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub ts: i64,
}

/// Ephemeral activity kind for presence snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Typing,
    Viewing,
    Idle,
}

/// One user's current activity, as carried by bulk presence snapshots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    /// Entity the activity refers to; `None` for entity-less states (idle).
    #[serde(default)]
    pub entity_id: Option<String>,
    pub kind: ActivityKind,
}

/// Deserialize an `i64` that may arrive as a float on the wire.
#[allow(clippy::cast_possible_truncation)]
fn deserialize_i64_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .ok_or_else(|| D::Error::custom("number out of i64 range")),
        other => Err(D::Error::custom(format!("expected number, got {other}"))),
    }
}
