//! Typed per-hub event enums.
//!
//! DESIGN
//! ======
//! Each hub has a discriminated union of its server-to-client events with a
//! `parse(target, data)` constructor. `parse` returns `None` for a target
//! the hub does not know (callers ignore foreign events) and
//! `Some(Err(CodecError::Payload))` for a known target whose payload does
//! not match, so bad payloads are distinguishable from unknown events.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use serde_json::Value;

use crate::CodecError;
use crate::types::{ChatMessage, ChatUser, Comment, Idea, Notification, UserActivity, VoteUpdate};

/// Server event names as they appear on the wire, grouped by hub.
pub mod targets {
    // activity
    pub const ON_USER_TYPING: &str = "OnUserTyping";
    pub const ON_USER_STOPPED_TYPING: &str = "OnUserStoppedTyping";
    pub const ON_USER_VIEWING: &str = "OnUserViewing";
    pub const ON_USER_IDLE: &str = "OnUserIdle";
    pub const ON_ACTIVE_USERS_UPDATED: &str = "OnActiveUsersUpdated";
    // chat
    pub const RECEIVE_MESSAGE: &str = "ReceiveMessage";
    pub const USER_JOINED: &str = "UserJoined";
    pub const USER_LEFT: &str = "UserLeft";
    pub const USER_TYPING: &str = "UserTyping";
    // comments
    pub const ON_COMMENT_ADDED: &str = "OnCommentAdded";
    pub const ON_COMMENT_UPDATED: &str = "OnCommentUpdated";
    pub const ON_COMMENT_DELETED: &str = "OnCommentDeleted";
    // ideas
    pub const ON_IDEA_CREATED: &str = "OnIdeaCreated";
    pub const ON_IDEA_UPDATED: &str = "OnIdeaUpdated";
    pub const ON_IDEA_DELETED: &str = "OnIdeaDeleted";
    pub const ON_VOTE_UPDATED: &str = "OnVoteUpdated";
    pub const ON_COMMENT_COUNT_UPDATED: &str = "OnCommentCountUpdated";
    pub const ON_IDEA_STATUS_UPDATED: &str = "OnIdeaStatusUpdated";
    // notifications
    pub const RECEIVE_NOTIFICATION: &str = "ReceiveNotification";
    pub const ON_IDEA_VOTED: &str = "OnIdeaVoted";
    pub const ON_IDEA_COMMENTED: &str = "OnIdeaCommented";
    // votes
    pub const ON_VOTE_REMOVED: &str = "OnVoteRemoved";
}

/// Events broadcast on the activity hub.
#[derive(Clone, Debug, PartialEq)]
pub enum ActivityEvent {
    UserTyping {
        user_id: String,
        user_name: String,
        entity_id: String,
    },
    UserStoppedTyping {
        user_id: String,
        entity_id: String,
    },
    UserViewing {
        user_id: String,
        user_name: String,
        entity_id: String,
    },
    UserIdle {
        user_id: String,
    },
    ActiveUsersUpdated(Vec<UserActivity>),
}

impl ActivityEvent {
    /// Parse an activity-hub event from its wire target and payload.
    #[must_use]
    pub fn parse(target: &str, data: &Value) -> Option<Result<Self, CodecError>> {
        let parsed = match target {
            targets::ON_USER_TYPING => {
                require(target, || {
                    Some(Self::UserTyping {
                        user_id: pick_str(data, "userId")?,
                        user_name: pick_str(data, "userName")?,
                        entity_id: pick_str(data, "entityId")?,
                    })
                })
            }
            targets::ON_USER_STOPPED_TYPING => {
                require(target, || {
                    Some(Self::UserStoppedTyping {
                        user_id: pick_str(data, "userId")?,
                        entity_id: pick_str(data, "entityId")?,
                    })
                })
            }
            targets::ON_USER_VIEWING => {
                require(target, || {
                    Some(Self::UserViewing {
                        user_id: pick_str(data, "userId")?,
                        user_name: pick_str(data, "userName")?,
                        entity_id: pick_str(data, "entityId")?,
                    })
                })
            }
            targets::ON_USER_IDLE => {
                require(target, || {
                    Some(Self::UserIdle { user_id: pick_str(data, "userId")? })
                })
            }
            targets::ON_ACTIVE_USERS_UPDATED => {
                from_value::<Vec<UserActivity>>(target, data).map(Self::ActiveUsersUpdated)
            }
            _ => return None,
        };
        Some(parsed)
    }
}

/// Events broadcast on the chat hub.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatEvent {
    MessageReceived(ChatMessage),
    UserJoined(ChatUser),
    UserLeft { user_id: String },
    UserTyping { user_id: String, user_name: String },
}

impl ChatEvent {
    /// Parse a chat-hub event from its wire target and payload.
    #[must_use]
    pub fn parse(target: &str, data: &Value) -> Option<Result<Self, CodecError>> {
        let parsed = match target {
            targets::RECEIVE_MESSAGE => from_value::<ChatMessage>(target, data).map(Self::MessageReceived),
            targets::USER_JOINED => from_value::<ChatUser>(target, data).map(Self::UserJoined),
            targets::USER_LEFT => {
                require(target, || Some(Self::UserLeft { user_id: pick_str(data, "userId")? }))
            }
            targets::USER_TYPING => {
                require(target, || {
                    Some(Self::UserTyping {
                        user_id: pick_str(data, "userId")?,
                        user_name: pick_str(data, "userName")?,
                    })
                })
            }
            _ => return None,
        };
        Some(parsed)
    }
}

/// Events broadcast on the comments hub.
#[derive(Clone, Debug, PartialEq)]
pub enum CommentsEvent {
    CommentAdded(Comment),
    CommentUpdated(Comment),
    CommentDeleted { comment_id: String },
}

impl CommentsEvent {
    /// Parse a comments-hub event from its wire target and payload.
    #[must_use]
    pub fn parse(target: &str, data: &Value) -> Option<Result<Self, CodecError>> {
        let parsed = match target {
            targets::ON_COMMENT_ADDED => from_value::<Comment>(target, data).map(Self::CommentAdded),
            targets::ON_COMMENT_UPDATED => from_value::<Comment>(target, data).map(Self::CommentUpdated),
            targets::ON_COMMENT_DELETED => {
                require(target, || {
                    Some(Self::CommentDeleted { comment_id: pick_str(data, "commentId")? })
                })
            }
            _ => return None,
        };
        Some(parsed)
    }
}

/// Events broadcast on the ideas hub.
#[derive(Clone, Debug, PartialEq)]
pub enum IdeasEvent {
    IdeaCreated(Idea),
    IdeaUpdated(Idea),
    IdeaDeleted { idea_id: String },
    VoteUpdated(VoteUpdate),
    CommentCountUpdated { idea_id: String, count: i64 },
    IdeaStatusUpdated { idea_id: String, status: String },
}

impl IdeasEvent {
    /// Parse an ideas-hub event from its wire target and payload.
    #[must_use]
    pub fn parse(target: &str, data: &Value) -> Option<Result<Self, CodecError>> {
        let parsed = match target {
            targets::ON_IDEA_CREATED => from_value::<Idea>(target, data).map(Self::IdeaCreated),
            targets::ON_IDEA_UPDATED => from_value::<Idea>(target, data).map(Self::IdeaUpdated),
            targets::ON_IDEA_DELETED => {
                require(target, || Some(Self::IdeaDeleted { idea_id: pick_str(data, "ideaId")? }))
            }
            targets::ON_VOTE_UPDATED => from_value::<VoteUpdate>(target, data).map(Self::VoteUpdated),
            targets::ON_COMMENT_COUNT_UPDATED => {
                require(target, || {
                    Some(Self::CommentCountUpdated {
                        idea_id: pick_str(data, "ideaId")?,
                        count: pick_i64(data, "count")?,
                    })
                })
            }
            targets::ON_IDEA_STATUS_UPDATED => {
                require(target, || {
                    Some(Self::IdeaStatusUpdated {
                        idea_id: pick_str(data, "ideaId")?,
                        status: pick_str(data, "status")?,
                    })
                })
            }
            _ => return None,
        };
        Some(parsed)
    }
}

/// Events broadcast on the notifications hub.
#[derive(Clone, Debug, PartialEq)]
pub enum NotificationsEvent {
    NotificationReceived(Notification),
    IdeaVoted(VoteUpdate),
    IdeaCommented(Comment),
    IdeaUpdated(Idea),
}

impl NotificationsEvent {
    /// Parse a notifications-hub event from its wire target and payload.
    #[must_use]
    pub fn parse(target: &str, data: &Value) -> Option<Result<Self, CodecError>> {
        let parsed = match target {
            targets::RECEIVE_NOTIFICATION => {
                from_value::<Notification>(target, data).map(Self::NotificationReceived)
            }
            targets::ON_IDEA_VOTED => from_value::<VoteUpdate>(target, data).map(Self::IdeaVoted),
            targets::ON_IDEA_COMMENTED => from_value::<Comment>(target, data).map(Self::IdeaCommented),
            targets::ON_IDEA_UPDATED => from_value::<Idea>(target, data).map(Self::IdeaUpdated),
            _ => return None,
        };
        Some(parsed)
    }
}

/// Events broadcast on the votes hub.
#[derive(Clone, Debug, PartialEq)]
pub enum VotesEvent {
    VoteUpdated(VoteUpdate),
    VoteRemoved { idea_id: String },
}

impl VotesEvent {
    /// Parse a votes-hub event from its wire target and payload.
    #[must_use]
    pub fn parse(target: &str, data: &Value) -> Option<Result<Self, CodecError>> {
        let parsed = match target {
            targets::ON_VOTE_UPDATED => from_value::<VoteUpdate>(target, data).map(Self::VoteUpdated),
            targets::ON_VOTE_REMOVED => {
                require(target, || Some(Self::VoteRemoved { idea_id: pick_str(data, "ideaId")? }))
            }
            _ => return None,
        };
        Some(parsed)
    }
}

fn from_value<T: serde::de::DeserializeOwned>(target: &str, data: &Value) -> Result<T, CodecError> {
    serde_json::from_value(data.clone()).map_err(|_| CodecError::Payload { target: target.to_owned() })
}

fn require<T>(target: &str, build: impl FnOnce() -> Option<T>) -> Result<T, CodecError> {
    build().ok_or_else(|| CodecError::Payload { target: target.to_owned() })
}

fn pick_str(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(ToOwned::to_owned)
}

#[allow(clippy::cast_possible_truncation)]
fn pick_i64(payload: &Value, key: &str) -> Option<i64> {
    let n = payload.get(key)?;
    n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))
}
