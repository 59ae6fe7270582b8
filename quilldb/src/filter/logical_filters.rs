use itertools::Itertools;
use std::fmt::Display;

use crate::{collection::Document, errors::QuillResult};

use super::{Filter, FilterProvider};

/// A filter that matches documents satisfying every one of its filters.
///
/// Evaluation stops at the first filter that does not match, so an error
/// raised by a later filter is only seen when every earlier filter matched.
pub(crate) struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        AndFilter { filters }
    }
}

impl Display for AndFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.filters.iter().join(" && "))
    }
}

impl FilterProvider for AndFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        for filter in &self.filters {
            if !filter.apply(entry)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// A filter that matches documents satisfying at least one of its filters.
///
/// An empty `OrFilter` matches nothing.
pub(crate) struct OrFilter {
    filters: Vec<Filter>,
}

impl OrFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        OrFilter { filters }
    }
}

impl Display for OrFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.filters.iter().join(" || "))
    }
}

impl FilterProvider for OrFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        for filter in &self.filters {
            if filter.apply(entry)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

pub(crate) struct NotFilter {
    filter: Filter,
}

impl NotFilter {
    pub(crate) fn new(filter: Filter) -> Self {
        NotFilter { filter }
    }
}

impl Display for NotFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "!({})", self.filter)
    }
}

impl FilterProvider for NotFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        Ok(!self.filter.apply(entry)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::errors::ErrorKind;
    use crate::filter::field;

    #[test]
    fn test_and_short_circuits() {
        let doc = doc! { tags: "scalar", n: 1 };
        // the second filter would fail with TypeMismatch
        let filter = AndFilter::new(vec![field("n").eq(2), field("tags").contains("x")]);
        assert!(!filter.apply(&doc).unwrap());

        let filter = AndFilter::new(vec![field("n").eq(1), field("tags").contains("x")]);
        assert_eq!(filter.apply(&doc).unwrap_err().kind(), &ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_or() {
        let doc = doc! { kind: "weak" };
        let filter = OrFilter::new(vec![field("kind").eq("normal"), field("kind").eq("weak")]);
        assert!(filter.apply(&doc).unwrap());
        assert!(!OrFilter::new(vec![]).apply(&doc).unwrap());
    }

    #[test]
    fn test_not() {
        let doc = doc! { kind: "weak" };
        assert!(!NotFilter::new(field("kind").eq("weak")).apply(&doc).unwrap());
        assert!(NotFilter::new(field("missing").eq(1)).apply(&doc).unwrap());
    }

    #[test]
    fn test_display() {
        let filter = OrFilter::new(vec![field("a").eq(1), field("b").gt(2)]);
        assert_eq!(filter.to_string(), "((a == 1) || (b > 2))");
        assert_eq!(NotFilter::new(field("a").eq(1)).to_string(), "!((a == 1))");
    }
}
