//! Stream reassembly and publication.

mod publisher;
mod tracker;

pub use publisher::*;
pub use tracker::*;
