//! Update documents and the engine that applies them.
//!
//! An update is either a replacement document (plain keys) or a modifier
//! document (`$inc`, `$push`, `$set`, `$unset`). Mixing both kinds of keys in
//! one update is rejected.

mod modifier_engine;

pub use modifier_engine::*;
