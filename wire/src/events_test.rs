use super::*;

#[test]
fn activity_parse_returns_none_for_foreign_target() {
    assert!(ActivityEvent::parse("ReceiveMessage", &serde_json::json!({})).is_none());
}

#[test]
fn activity_user_typing_parses_fields() {
    let data = serde_json::json!({"userId": "u1", "userName": "Ada", "entityId": "idea-1"});
    let event = ActivityEvent::parse(targets::ON_USER_TYPING, &data)
        .expect("known target")
        .expect("payload should parse");
    assert_eq!(
        event,
        ActivityEvent::UserTyping {
            user_id: "u1".to_owned(),
            user_name: "Ada".to_owned(),
            entity_id: "idea-1".to_owned(),
        }
    );
}

#[test]
fn activity_known_target_with_bad_payload_is_a_payload_error() {
    let err = ActivityEvent::parse(targets::ON_USER_TYPING, &serde_json::json!({"userId": 7}))
        .expect("known target")
        .expect_err("payload should fail");
    assert!(matches!(err, CodecError::Payload { target } if target == targets::ON_USER_TYPING));
}

#[test]
fn active_users_snapshot_parses_as_list() {
    let data = serde_json::json!([
        {"userId": "u1", "userName": "Ada", "entityId": "idea-1", "kind": "viewing"},
        {"userId": "u2", "userName": "Brie", "kind": "idle"},
    ]);
    let event = ActivityEvent::parse(targets::ON_ACTIVE_USERS_UPDATED, &data)
        .expect("known target")
        .expect("payload should parse");
    let ActivityEvent::ActiveUsersUpdated(users) = event else {
        panic!("expected snapshot variant");
    };
    assert_eq!(users.len(), 2);
}

#[test]
fn ideas_vote_updated_parses_typed_payload() {
    let data = serde_json::json!({"ideaId": "idea-1", "upvotes": 12, "downvotes": 3});
    let event = IdeasEvent::parse(targets::ON_VOTE_UPDATED, &data)
        .expect("known target")
        .expect("payload should parse");
    let IdeasEvent::VoteUpdated(update) = event else {
        panic!("expected vote variant");
    };
    assert_eq!(update.idea_id, "idea-1");
    assert_eq!(update.upvotes, 12);
}

#[test]
fn ideas_comment_count_accepts_float_count() {
    let data = serde_json::json!({"ideaId": "idea-1", "count": 4.0});
    let event = IdeasEvent::parse(targets::ON_COMMENT_COUNT_UPDATED, &data)
        .expect("known target")
        .expect("payload should parse");
    assert_eq!(event, IdeasEvent::CommentCountUpdated { idea_id: "idea-1".to_owned(), count: 4 });
}

#[test]
fn chat_user_left_requires_user_id() {
    let err = ChatEvent::parse(targets::USER_LEFT, &serde_json::json!({}))
        .expect("known target")
        .expect_err("missing userId should fail");
    assert!(matches!(err, CodecError::Payload { .. }));
}

#[test]
fn votes_vote_removed_parses_idea_id() {
    let event = VotesEvent::parse(targets::ON_VOTE_REMOVED, &serde_json::json!({"ideaId": "idea-9"}))
        .expect("known target")
        .expect("payload should parse");
    assert_eq!(event, VotesEvent::VoteRemoved { idea_id: "idea-9".to_owned() });
}

#[test]
fn notifications_receive_notification_parses_dto() {
    let data = serde_json::json!({
        "id": "n1",
        "kind": "idea_voted",
        "ideaId": "idea-1",
        "message": "Ada upvoted your idea",
        "read": false,
        "ts": 1_725_000_000_000_i64,
    });
    let event = NotificationsEvent::parse(targets::RECEIVE_NOTIFICATION, &data)
        .expect("known target")
        .expect("payload should parse");
    let NotificationsEvent::NotificationReceived(n) = event else {
        panic!("expected notification variant");
    };
    assert_eq!(n.kind, "idea_voted");
    assert!(!n.read);
}

#[test]
fn comments_comment_deleted_parses_comment_id() {
    let event = CommentsEvent::parse(targets::ON_COMMENT_DELETED, &serde_json::json!({"commentId": "c3"}))
        .expect("known target")
        .expect("payload should parse");
    assert_eq!(event, CommentsEvent::CommentDeleted { comment_id: "c3".to_owned() });
}
