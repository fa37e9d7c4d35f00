//! Prompt rendering from conversation history.

mod conversation;
mod renderer;
mod resources;

pub use conversation::*;
pub use renderer::*;
pub use resources::*;
