//! In-memory index and its durable line log.

mod index;
mod persistence;

pub use index::*;
pub use persistence::*;
