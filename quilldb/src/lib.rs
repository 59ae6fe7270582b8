//! # quilldb
//!
//! An embeddable document store. Documents are schemaless, insertion
//! ordered maps identified by an `_id` field. They are selected with query
//! documents, changed with update documents and can be mirrored to a line
//! log holding one JSON document per line.
//!
//! ```rust,ignore
//! use quilldb::{doc, Datastore};
//!
//! let mut store = Datastore::builder()
//!     .root("/var/lib/app")
//!     .name("relations")
//!     .open()?;
//!
//! store.insert(doc! { "_id": 1, kind: "normal", tags: ["weak"] })?;
//! let weak = store.find(&doc! { "$contains": { tags: "weak" } }, None)?;
//! store.update(&doc! { "_id": 1 }, &doc! { "$inc": { visits: 1 } }, None)?;
//! store.persist()?;
//! ```
//!
//! Modules:
//! - [collection]: [Document](collection::Document), identifiers, paths
//! - [filter]: query compilation and matching
//! - [update]: the modifier engine
//! - [store]: the in-memory index and the persistence log

pub mod collection;
pub mod common;
pub mod errors;
pub mod filter;
pub mod store;
pub mod update;

mod datastore;
mod datastore_builder;
mod datastore_config;

pub use datastore::Datastore;
pub use datastore_builder::DatastoreBuilder;
pub use datastore_config::DatastoreConfig;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datastore_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Datastore>();
    }

    #[test]
    fn test_doc_macro_is_exported() {
        let doc = doc! { a: 1 };
        assert_eq!(doc.size(), 1);
    }
}
