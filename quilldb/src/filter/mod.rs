//! Query filters for selecting documents from a datastore.
//!
//! A query is itself a [Document](crate::collection::Document). It is
//! compiled into a tree of [Filter] values, each wrapping a
//! [FilterProvider] that decides whether a document matches.
//!
//! # Creating Filters
//!
//! From a query document:
//! - `compile(&doc!{ kind: "normal" })` - field equality
//! - `compile(&doc!{ "$gt": { age: 30 } })` - operators
//! - `compile(&doc!{ "$or": [{ a: 1 }, { b: 2 }] })` - alternatives
//!
//! With the fluent API:
//! - `field("age").gt(30)` - comparison operators
//! - `field("name").eq("Alice")` - equality checks
//! - `all()` - match all documents
//! - `field("a").eq(1).and(field("b").lt(2))` - logical AND
//!
//! # Examples
//!
//! ```rust,ignore
//! use quilldb::doc;
//! use quilldb::filter::{compile, field};
//!
//! let by_query = compile(&doc!{ "$ilike": { name: "smith" } })?;
//! let by_builder = field("name").ilike("smith");
//! ```
mod array_filters;
mod basic_filters;
mod filter;
mod fluent;
mod logical_filters;
mod pattern_filters;
mod query;
mod range_filters;

pub(crate) use array_filters::*;
pub(crate) use basic_filters::*;
pub use filter::*;
pub use fluent::*;
pub(crate) use logical_filters::*;
pub(crate) use pattern_filters::*;
pub use query::*;
pub(crate) use range_filters::*;
