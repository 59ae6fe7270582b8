//! Documents, identifiers and field paths.
//!
//! A [Document] is an insertion-ordered mapping from field name to
//! [Value](crate::common::Value). Documents are stored in a
//! [Datastore](crate::Datastore) under their `_id` ([DocumentId]); an `_id` is
//! generated by the configured [IdGenerator] when a document is inserted
//! without one.
//!
//! ```rust,ignore
//! use quilldb::doc;
//!
//! let doc = doc! { name: "Alice", address: { city: "New York" }, tags: ["a", "b"] };
//! assert_eq!(doc.resolve("address.city")?, &Value::from("New York"));
//! assert_eq!(doc.resolve("tags[1]")?, &Value::from("b"));
//! ```

mod document;
mod document_id;
mod field_path;
mod id_generator;

pub use document::*;
pub use document_id::DocumentId;
pub use field_path::FieldPath;
pub use id_generator::*;
