//! Tests for core types.

use pretty_assertions::assert_eq;
use serde_json::json;
use tinsel::types::*;

#[test]
fn model_message_roles() {
    let msg = ModelMessage::system("You are festive.");
    assert_eq!(msg.role, Role::System);
    assert_eq!(msg.text(), "You are festive.");

    let msg = ModelMessage::user("Make the lights blue");
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.text(), "Make the lights blue");

    let msg = ModelMessage::assistant("Done!");
    assert_eq!(msg.role, Role::Assistant);
}

#[test]
fn model_message_tool_result() {
    let msg = ModelMessage::tool_result(AgentToolResult {
        tool_call_id: "call_1".into(),
        tool_name: "get_tree_state".into(),
        result: json!({"theme": "emerald_gold"}),
        is_error: false,
    });
    assert_eq!(msg.role, Role::Tool);
    assert_eq!(msg.text(), "");
    match &msg.content[0] {
        ContentPart::ToolResult(result) => {
            assert_eq!(result.tool_name, "get_tree_state");
            assert!(!result.is_error);
        }
        other => panic!("unexpected part: {other:?}"),
    }
}

#[test]
fn assistant_tool_calls_omits_empty_text() {
    let call = AgentToolCall {
        id: "call_1".into(),
        name: "update_tree_config".into(),
        arguments: json!({"config_key": "lights_color", "value": "blue"}),
        thought_signature: None,
    };
    let msg = ModelMessage::assistant_tool_calls("", vec![call.clone()]);
    assert_eq!(msg.content.len(), 1);
    assert_eq!(msg.tool_calls(), vec![&call]);
}

#[test]
fn message_serializes_with_tagged_parts() {
    let msg = ModelMessage::user_with_image(
        "what is this?",
        ImageContent::from_bytes(b"png", "image/png"),
    );
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["role"], "user");
    assert_eq!(value["content"][0]["type"], "text");
    assert_eq!(value["content"][1]["type"], "image");
    assert_eq!(value["content"][1]["mime_type"], "image/png");

    let back: ModelMessage = serde_json::from_value(value).unwrap();
    assert_eq!(back, msg);
}
