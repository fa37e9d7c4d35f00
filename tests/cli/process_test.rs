//! Tests for Claude process spawning and control.

use std::time::Duration;

use claude_stream::cli::{exit_code, ClaudeProcess, ClaudeProcessBuilder, SpawnError};

use crate::support::{binary_string, fake_claude, fake_claude_lines};

#[test]
fn builder_args_in_fixed_order() {
    let builder = ClaudeProcessBuilder::new("Fix the bug", "claude-opus-4-1");
    assert_eq!(
        builder.build_args(),
        vec![
            "-p",
            "--output-format",
            "stream-json",
            "--verbose",
            "--include-partial-messages",
            "--model",
            "claude-opus-4-1",
            "Fix the bug",
        ]
    );
}

#[test]
fn builder_defaults_and_accessors() {
    let builder = ClaudeProcessBuilder::new("task", "model").working_dir("/tmp/project");
    assert_eq!(builder.get_binary(), "claude");
    assert_eq!(builder.prompt(), "task");
    assert_eq!(builder.model(), "model");
    assert_eq!(
        builder.get_working_dir().map(|p| p.to_str().unwrap()),
        Some("/tmp/project")
    );
}

#[tokio::test]
async fn spawn_missing_binary_is_not_found() {
    let builder = ClaudeProcessBuilder::new("task", "model").binary("/nonexistent/claude-binary");
    let err = ClaudeProcess::spawn(&builder).unwrap_err();
    assert!(matches!(err, SpawnError::NotFound));
}

#[tokio::test]
async fn output_merges_stdout_and_stderr() {
    let (_dir, path) = fake_claude("echo out\necho err >&2");
    let builder = ClaudeProcessBuilder::new("task", "model").binary(binary_string(&path));
    let mut process = ClaudeProcess::spawn(&builder).unwrap();

    let mut lines = process.take_output().unwrap();
    assert!(process.take_output().is_none());

    let mut seen = Vec::new();
    while let Some(line) = lines.next_line().await {
        seen.push(line.unwrap());
    }
    seen.sort();
    assert_eq!(seen, vec!["err", "out"]);

    let status = process.wait().await.unwrap();
    assert_eq!(exit_code(status), 0);
}

#[tokio::test]
async fn stdin_is_closed() {
    // `cat` would block forever if stdin stayed open.
    let (_dir, path) = fake_claude("cat\necho finished");
    let builder = ClaudeProcessBuilder::new("task", "model").binary(binary_string(&path));
    let mut process = ClaudeProcess::spawn(&builder).unwrap();
    let mut lines = process.take_output().unwrap();

    let line = tokio::time::timeout(Duration::from_secs(10), lines.next_line())
        .await
        .expect("process should not wait for input");
    assert_eq!(line.unwrap().unwrap(), "finished");
}

#[tokio::test]
async fn terminate_kills_exactly_once() {
    let (_dir, path) = fake_claude("exec sleep 30");
    let builder = ClaudeProcessBuilder::new("task", "model").binary(binary_string(&path));
    let mut process = ClaudeProcess::spawn(&builder).unwrap();

    assert!(process.is_alive().unwrap());
    assert!(process.terminate().await.unwrap());
    assert!(!process.terminate().await.unwrap());
    assert!(process.was_terminated());
    assert!(!process.is_alive().unwrap());
}

#[tokio::test]
async fn terminate_after_exit_is_noop() {
    let (_dir, path) = fake_claude_lines(&[], 4);
    let builder = ClaudeProcessBuilder::new("task", "model").binary(binary_string(&path));
    let mut process = ClaudeProcess::spawn(&builder).unwrap();

    let status = process.wait().await.unwrap();
    assert_eq!(exit_code(status), 4);
    assert!(!process.terminate().await.unwrap());
    assert!(!process.was_terminated());
}
