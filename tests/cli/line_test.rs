//! Tests for classifying raw CLI output lines.

use claude_stream::cli::{CliLine, LineError, UNKNOWN_CLI_ERROR};

#[test]
fn classify_whitespace_only_is_blank() {
    for line in ["", " ", "   \t  ", "\r"] {
        assert_eq!(CliLine::classify(line), Ok(CliLine::Blank), "line {line:?}");
    }
}

#[test]
fn classify_stream_event_keeps_nested_event() {
    let line = r#"{"type":"stream_event","event":{"type":"message_stop"},"session_id":"s"}"#;
    match CliLine::classify(line).unwrap() {
        CliLine::StreamEvent { event: Some(event) } => {
            assert_eq!(event["type"], "message_stop");
        }
        other => panic!("Expected StreamEvent, got {other:?}"),
    }
}

#[test]
fn classify_stream_event_without_event() {
    let line = r#"{"type":"stream_event"}"#;
    assert_eq!(
        CliLine::classify(line),
        Ok(CliLine::StreamEvent { event: None })
    );
}

#[test]
fn classify_error_with_message() {
    let line = r#"{"type":"error","error":"rate limited"}"#;
    assert_eq!(
        CliLine::classify(line),
        Ok(CliLine::Error {
            message: "rate limited".to_string()
        })
    );
}

#[test]
fn classify_error_without_message_uses_default() {
    let line = r#"{"type":"error"}"#;
    assert_eq!(
        CliLine::classify(line),
        Ok(CliLine::Error {
            message: UNKNOWN_CLI_ERROR.to_string()
        })
    );
    assert_eq!(UNKNOWN_CLI_ERROR, "Unknown CLI error");
}

#[test]
fn classify_other_types_are_unrecognized() {
    for line in [
        r#"{"type":"system","subtype":"init"}"#,
        r#"{"type":"result","result":"ok"}"#,
        r#"{"type":"assistant","message":{}}"#,
        r#"{"no_type":true}"#,
    ] {
        assert_eq!(CliLine::classify(line), Ok(CliLine::Unrecognized), "line {line}");
    }
}

#[test]
fn classify_invalid_json_is_malformed() {
    let err = CliLine::classify("not valid json at all").unwrap_err();
    match err {
        LineError::Malformed { input, reason } => {
            assert_eq!(input, "not valid json at all");
            assert!(!reason.is_empty());
        }
    }
}

#[test]
fn classify_truncated_json_is_malformed() {
    let line = r#"{"type":"stream_event","event":{"type":"content_bl"#;
    assert!(matches!(
        CliLine::classify(line),
        Err(LineError::Malformed { .. })
    ));
}
