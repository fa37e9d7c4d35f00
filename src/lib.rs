//! Claude Stream - streaming decoder and dispatcher for Claude CLI output.
//!
//! Launches `claude -p --output-format stream-json`, decodes its output line
//! by line into content and function-call messages, and publishes them to
//! subscribers while the process is still running.

pub mod cli;
pub mod client;
pub mod config;
pub mod display;
pub mod prompt;
pub mod stream;
