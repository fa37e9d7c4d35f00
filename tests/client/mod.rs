//! Conversation client tests.


use claude_stream::client::{decode_line, ConversationClient, LineAction, RunState};
use claude_stream::config::ClientConfig;
use claude_stream::stream::BlockTracker;

#[test]
fn test_new_client_is_idle() {
    let client = ConversationClient::new(ClientConfig::default());
    assert_eq!(client.state(), RunState::Idle);
    assert_eq!(client.stats().lines, 0);
    assert!(!client.is_cancelled());
}

#[test]
fn test_decode_line_is_public() {
    let mut tracker = BlockTracker::new();
    let action = tokio_test::assert_ok!(decode_line(&mut tracker, ""));
    assert_eq!(action, LineAction::Ignore);
}

#[test]
fn test_run_outcome_from_sync_context() {
    use claude_stream::prompt::Conversation;
    use claude_stream::stream::RunOutcome;

    let mut client = ConversationClient::new(ClientConfig {
        binary: "/nonexistent/claude-stream-test".to_string(),
        ..Default::default()
    });
    let outcome = tokio_test::block_on(client.run(&Conversation::from_prompt("hi")));

    assert!(matches!(outcome, RunOutcome::Failed { .. }));
    assert_eq!(client.state(), RunState::Failed);
}
