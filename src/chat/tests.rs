use super::*;
use serde_json::json;

#[test]
fn role_serializes_lowercase() {
    let message = Message::assistant("Hello");
    let value = serde_json::to_value(&message).expect("message should serialize");
    assert_eq!(value, json!({"role": "assistant", "content": "Hello"}));
}

#[test]
fn unknown_role_is_rejected() {
    let result: Result<Message, _> =
        serde_json::from_value(json!({"role": "tool", "content": "x"}));
    assert!(result.is_err());
}

#[test]
fn history_from_wire_format() {
    let messages: Vec<Message> = serde_json::from_value(json!([
        {"role": "assistant", "content": "Hello, how can I help?"},
        {"role": "user", "content": "Who teaches algorithms well?"}
    ]))
    .expect("messages should parse");

    let history = ChatHistory::new(messages).expect("history should validate");
    let (prior, latest) = history.split_latest();

    assert_eq!(history.turn_count(), 2);
    assert_eq!(prior.len(), 1);
    assert_eq!(prior[0].role, Role::Assistant);
    assert_eq!(latest.content, "Who teaches algorithms well?");
    assert_eq!(history.latest(), latest);
    assert_eq!(history.prior(), prior);
}

#[test]
fn empty_history_is_rejected() {
    assert_eq!(ChatHistory::new(Vec::new()), Err(HistoryError::Empty));
}

#[test]
fn history_must_end_with_user() {
    let result = ChatHistory::new(vec![
        Message::user("Hi"),
        Message::assistant("Hello"),
    ]);
    assert_eq!(result, Err(HistoryError::LastNotUser(Role::Assistant)));
}

#[test]
fn blank_latest_message_is_rejected() {
    let result = ChatHistory::try_from(vec![Message::user("  \n")]);
    assert_eq!(result, Err(HistoryError::BlankLatest));
}

#[test]
fn error_messages_name_the_role() {
    let error = HistoryError::LastNotUser(Role::System);
    assert_eq!(error.to_string(), "last message must come from the user, found system");
}
