use std::fmt::Display;
use std::sync::Arc;

use crate::collection::{Document, FieldPath};
use crate::common::Value;
use crate::errors::QuillResult;

use super::{AllFilter, AndFilter, NotFilter, OrFilter};

/// Trait for implementing filters.
///
/// A `FilterProvider` decides whether a document satisfies a condition.
/// `apply` must be pure: it never mutates the document and returns the same
/// answer for the same input.
///
/// `Ok(false)` means "does not match", including when the addressed field is
/// absent. `Err` is reserved for contract violations that must reach the
/// caller, such as an array operator applied to a field holding a scalar.
pub trait FilterProvider: Send + Sync + Display {
    /// Applies the filter to a document and returns whether it matches.
    fn apply(&self, entry: &Document) -> QuillResult<bool>;
}

/// A query filter for selecting documents from a datastore.
///
/// Filters are produced by compiling a query document with
/// [compile](super::compile) or built directly with the fluent API
/// ([field](super::field), [all](super::all), [has](super::has)).
///
/// # Filter Composition
///
/// - `and(other)` - logical AND
/// - `or(other)` - logical OR
/// - `not()` - logical NOT
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    /// Creates a new filter from a filter provider implementation.
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter {
            inner: Arc::new(inner),
        }
    }

    /// Combines this filter with another using logical AND.
    pub fn and(&self, filter: Filter) -> Self {
        Filter::new(AndFilter::new(vec![self.clone(), filter]))
    }

    /// Combines this filter with another using logical OR.
    pub fn or(&self, filter: Filter) -> Self {
        Filter::new(OrFilter::new(vec![self.clone(), filter]))
    }

    /// Negates this filter using logical NOT.
    pub fn not(&self) -> Self {
        Filter::new(NotFilter::new(self.clone()))
    }

    #[inline]
    pub fn apply(&self, entry: &Document) -> QuillResult<bool> {
        self.inner.apply(entry)
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Creates a filter that matches every document.
pub fn all() -> Filter {
    Filter::new(AllFilter)
}

/// Combines filters with logical AND, collapsing the trivial cases.
pub(crate) fn and_all(mut filters: Vec<Filter>) -> Filter {
    match filters.len() {
        0 => all(),
        1 => filters.remove(0),
        _ => Filter::new(AndFilter::new(filters)),
    }
}

/// Resolves a field for matching; resolution failures read as "absent".
#[inline]
pub(crate) fn resolve_field<'a>(path: &FieldPath, entry: &'a Document) -> Option<&'a Value> {
    path.lookup(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::field;

    #[test]
    fn test_all_matches_everything() {
        assert!(all().apply(&Document::new()).unwrap());
        assert!(all().apply(&doc! { a: 1 }).unwrap());
    }

    #[test]
    fn test_and_all_collapses() {
        assert_eq!(and_all(vec![]).to_string(), "AllFilter");
        let single = and_all(vec![field("a").eq(1)]);
        assert_eq!(single.to_string(), "(a == 1)");
        let both = and_all(vec![field("a").eq(1), field("b").eq(2)]);
        assert_eq!(both.to_string(), "((a == 1) && (b == 2))");
    }

    #[test]
    fn test_composition() {
        let doc = doc! { a: 1, b: 2 };
        assert!(field("a").eq(1).and(field("b").eq(2)).apply(&doc).unwrap());
        assert!(!field("a").eq(1).and(field("b").eq(3)).apply(&doc).unwrap());
        assert!(field("a").eq(5).or(field("b").eq(2)).apply(&doc).unwrap());
        assert!(field("a").eq(5).not().apply(&doc).unwrap());
    }

    #[test]
    fn test_resolve_field_treats_failures_as_absent() {
        let doc = doc! { a: "text" };
        let path = FieldPath::parse("a.b").unwrap();
        assert!(resolve_field(&path, &doc).is_none());
    }
}
