use super::*;

fn sample_envelope() -> Envelope {
    Envelope {
        id: "id-1".to_owned(),
        ts: 42,
        hub: Some("votes".to_owned()),
        target: "OnVoteUpdated".to_owned(),
        kind: Kind::Event,
        data: serde_json::json!({
            "ideaId": "idea-1",
            "upvotes": 11,
            "downvotes": 2,
            "tags": ["a", "b"],
            "nested": {"k": "v"},
            "nil": null
        }),
    }
}

#[test]
fn encode_decode_round_trip_preserves_envelope() {
    let envelope = sample_envelope();
    let text = encode_envelope(&envelope);
    let decoded = decode_envelope(&text).expect("decode should succeed");
    assert_eq!(decoded, envelope);
}

#[test]
fn encode_envelope_outputs_non_empty_text() {
    let text = encode_envelope(&sample_envelope());
    assert!(!text.is_empty());
}

#[test]
fn decode_envelope_rejects_malformed_text() {
    let err = decode_envelope("{not json").expect_err("text should fail");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn decode_envelope_rejects_unknown_kind() {
    let text = r#"{"id":"x","ts":1,"hub":null,"target":"Ping","kind":"bogus","data":{}}"#;
    let err = decode_envelope(text).expect_err("kind should be invalid");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn kind_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Kind::Invocation).expect("serialize"), "\"invocation\"");
    assert_eq!(serde_json::to_string(&Kind::Event).expect("serialize"), "\"event\"");
    assert_eq!(serde_json::to_string(&Kind::Error).expect("serialize"), "\"error\"");
}

#[test]
fn invocation_constructor_stamps_fresh_id_and_kind() {
    let a = Envelope::invocation("SendMessage", serde_json::json!({"room": "general"}));
    let b = Envelope::invocation("SendMessage", serde_json::json!({"room": "general"}));
    assert_eq!(a.kind, Kind::Invocation);
    assert_ne!(a.id, b.id);
    assert!(a.ts > 0);
}

#[test]
fn with_hub_stamps_hub_name() {
    let envelope = Envelope::event("OnUserIdle", serde_json::json!({})).with_hub("activity");
    assert_eq!(envelope.hub.as_deref(), Some("activity"));
}
