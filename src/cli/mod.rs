//! CLI module for Claude Code process spawning and stream-json decoding.

mod events;
mod line;
mod output;
mod process;

pub use events::*;
pub use line::*;
pub use output::*;
pub use process::*;
