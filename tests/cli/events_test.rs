//! Tests for decoding nested content events.

use claude_stream::cli::{BlockDelta, BlockStart, BlockType, ContentEvent, DeltaFragment};
use serde_json::json;

#[test]
fn decode_tool_use_start() {
    let event = json!({
        "type": "content_block_start",
        "index": 1,
        "content_block": {"type": "tool_use", "name": "search", "id": "toolu_01", "input": {}}
    });

    assert_eq!(
        ContentEvent::decode(&event).unwrap(),
        ContentEvent::BlockStart(BlockStart {
            block_type: BlockType::ToolUse,
            tool_name: "search".to_string(),
            tool_id: "toolu_01".to_string(),
        })
    );
}

#[test]
fn decode_text_start_defaults_tool_fields() {
    let event = json!({
        "type": "content_block_start",
        "content_block": {"type": "text", "text": ""}
    });

    match ContentEvent::decode(&event).unwrap() {
        ContentEvent::BlockStart(start) => {
            assert_eq!(start.block_type, BlockType::Text);
            assert_eq!(start.tool_name, "");
            assert_eq!(start.tool_id, "");
        }
        other => panic!("Expected BlockStart, got {other:?}"),
    }
}

#[test]
fn decode_start_without_block_type_is_unknown() {
    let event = json!({"type": "content_block_start", "content_block": {"name": "x"}});
    match ContentEvent::decode(&event).unwrap() {
        ContentEvent::BlockStart(start) => assert_eq!(start.block_type, BlockType::Unknown),
        other => panic!("Expected BlockStart, got {other:?}"),
    }
}

#[test]
fn decode_text_delta() {
    let event = json!({
        "type": "content_block_delta",
        "delta": {"type": "text_delta", "text": "Hello"}
    });
    assert_eq!(
        ContentEvent::decode(&event).unwrap(),
        ContentEvent::BlockDelta(BlockDelta {
            fragment: Some(DeltaFragment::Text("Hello".to_string()))
        })
    );
}

#[test]
fn decode_partial_json_delta() {
    let event = json!({
        "type": "content_block_delta",
        "delta": {"type": "input_json_delta", "partial_json": "{\"path\": \"/tm"}
    });
    assert_eq!(
        ContentEvent::decode(&event).unwrap(),
        ContentEvent::BlockDelta(BlockDelta {
            fragment: Some(DeltaFragment::PartialJson("{\"path\": \"/tm".to_string()))
        })
    );
}

#[test]
fn decode_text_takes_precedence_over_partial_json() {
    let event = json!({
        "type": "content_block_delta",
        "delta": {"text": "text wins", "partial_json": "{}"}
    });
    assert_eq!(
        ContentEvent::decode(&event).unwrap(),
        ContentEvent::BlockDelta(BlockDelta {
            fragment: Some(DeltaFragment::Text("text wins".to_string()))
        })
    );
}

#[test]
fn decode_delta_without_payload() {
    for event in [
        json!({"type": "content_block_delta"}),
        json!({"type": "content_block_delta", "delta": {"type": "signature_delta", "signature": "abc"}}),
    ] {
        assert_eq!(
            ContentEvent::decode(&event).unwrap(),
            ContentEvent::BlockDelta(BlockDelta { fragment: None })
        );
    }
}

#[test]
fn decode_other_events_are_unrecognized() {
    for event in [
        json!({"type": "message_start", "message": {}}),
        json!({"type": "content_block_stop", "index": 0}),
        json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}}),
        json!({"type": "message_stop"}),
    ] {
        assert_eq!(ContentEvent::decode(&event).unwrap(), ContentEvent::Unrecognized);
    }
}
