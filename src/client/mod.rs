//! Conversation client: run orchestration, state and errors.

mod error;
mod runner;
mod state;

pub use error::*;
pub use runner::*;
pub use state::*;
