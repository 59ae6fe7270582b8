use std::fmt::Display;

use crate::{
    collection::{Document, FieldPath},
    common::Value,
    errors::{QuillError, QuillResult},
};

use super::{resolve_field, Filter, FilterProvider};

/// A filter that matches all documents.
pub(crate) struct AllFilter;

impl FilterProvider for AllFilter {
    fn apply(&self, _entry: &Document) -> QuillResult<bool> {
        Ok(true)
    }
}

impl Display for AllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AllFilter")
    }
}

/// A filter that matches documents where a field equals a specific value.
///
/// Scalars compare by type and value, arrays compare element by element in
/// order, documents compare by full equality. An absent field never matches.
pub(crate) struct EqualsFilter {
    field_path: FieldPath,
    field_value: Value,
}

impl EqualsFilter {
    #[inline]
    pub(crate) fn new(field_path: FieldPath, field_value: Value) -> Self {
        EqualsFilter {
            field_path,
            field_value,
        }
    }
}

impl Display for EqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field_path, self.field_value)
    }
}

impl FilterProvider for EqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        Ok(resolve_field(&self.field_path, entry).is_some_and(|value| value == &self.field_value))
    }
}

/// A filter that matches documents where a field does not equal a specific
/// value. An absent field counts as "not equal".
pub(crate) struct NotEqualsFilter {
    field_path: FieldPath,
    field_value: Value,
}

impl NotEqualsFilter {
    #[inline]
    pub(crate) fn new(field_path: FieldPath, field_value: Value) -> Self {
        NotEqualsFilter {
            field_path,
            field_value,
        }
    }
}

impl Display for NotEqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} != {})", self.field_path, self.field_value)
    }
}

impl FilterProvider for NotEqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        Ok(resolve_field(&self.field_path, entry).map_or(true, |value| value != &self.field_value))
    }
}

/// A filter that matches when a field holds a sub-document satisfying a
/// nested filter.
///
/// The nested filter only looks at keys it names, so the sub-document may
/// carry extra keys: `{parent: 3}` matches `{parent: 3, kind: "weak"}`.
pub(crate) struct ObjectMatchFilter {
    field_path: FieldPath,
    filter: Filter,
}

impl ObjectMatchFilter {
    pub(crate) fn new(field_path: FieldPath, filter: Filter) -> Self {
        ObjectMatchFilter { field_path, filter }
    }
}

impl Display for ObjectMatchFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} matches {})", self.field_path, self.filter)
    }
}

impl FilterProvider for ObjectMatchFilter {
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        match resolve_field(&self.field_path, entry) {
            Some(Value::Document(sub_document)) => self.filter.apply(sub_document),
            _ => Ok(false),
        }
    }
}

/// A filter that matches documents holding every listed top level key.
///
/// The check is shallow: names are not resolved as paths.
pub(crate) struct HasFieldsFilter {
    fields: Vec<String>,
}

impl HasFieldsFilter {
    pub(crate) fn new(fields: Vec<String>) -> Self {
        HasFieldsFilter { fields }
    }
}

impl Display for HasFieldsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(has {})", self.fields.join(", "))
    }
}

impl FilterProvider for HasFieldsFilter {
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        Ok(self.fields.iter().all(|field| entry.contains_key(field)))
    }
}

/// Carries a construction error of the fluent API to the point where the
/// filter is applied.
pub(crate) struct InvalidFilter {
    error: QuillError,
}

impl InvalidFilter {
    pub(crate) fn new(error: QuillError) -> Self {
        InvalidFilter { error }
    }
}

impl Display for InvalidFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(invalid: {})", self.error)
    }
}

impl FilterProvider for InvalidFilter {
    fn apply(&self, _entry: &Document) -> QuillResult<bool> {
        Err(self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::errors::ErrorKind;

    fn path(p: &str) -> FieldPath {
        FieldPath::parse(p).unwrap()
    }

    #[test]
    fn test_equals_filter() {
        let doc = doc! { kind: "normal", tags: ["weak", "strong"], n: 2 };
        assert!(EqualsFilter::new(path("kind"), Value::from("normal")).apply(&doc).unwrap());
        assert!(EqualsFilter::new(path("n"), Value::F64(2.0)).apply(&doc).unwrap());
        assert!(!EqualsFilter::new(path("missing"), Value::Null).apply(&doc).unwrap());
    }

    #[test]
    fn test_equals_filter_arrays_are_order_sensitive() {
        let doc = doc! { tags: ["weak", "strong"] };
        let exact = EqualsFilter::new(path("tags"), Value::from(vec!["weak", "strong"]));
        let prefix = EqualsFilter::new(path("tags"), Value::from(vec!["weak"]));
        let reversed = EqualsFilter::new(path("tags"), Value::from(vec!["strong", "weak"]));
        assert!(exact.apply(&doc).unwrap());
        assert!(!prefix.apply(&doc).unwrap());
        assert!(!reversed.apply(&doc).unwrap());
    }

    #[test]
    fn test_not_equals_filter() {
        let doc = doc! { kind: "normal" };
        assert!(!NotEqualsFilter::new(path("kind"), Value::from("normal")).apply(&doc).unwrap());
        assert!(NotEqualsFilter::new(path("kind"), Value::from("strong")).apply(&doc).unwrap());
        assert!(NotEqualsFilter::new(path("missing"), Value::from(1)).apply(&doc).unwrap());
    }

    #[test]
    fn test_object_match_filter_is_superset_tolerant() {
        let doc = doc! { rel: { parent: 3, kind: "weak" } };
        let subset = ObjectMatchFilter::new(
            path("rel"),
            Filter::new(EqualsFilter::new(path("parent"), Value::from(3))),
        );
        assert!(subset.apply(&doc).unwrap());

        let not_document = doc! { rel: 3 };
        assert!(!subset.apply(&not_document).unwrap());
    }

    #[test]
    fn test_has_fields_filter_is_shallow() {
        let doc = doc! { a: 1, b: { c: 2 } };
        assert!(HasFieldsFilter::new(vec!["a".into(), "b".into()]).apply(&doc).unwrap());
        assert!(!HasFieldsFilter::new(vec!["a".into(), "c".into()]).apply(&doc).unwrap());
        assert!(!HasFieldsFilter::new(vec!["b.c".into()]).apply(&doc).unwrap());
    }

    #[test]
    fn test_invalid_filter_surfaces_error() {
        let filter = InvalidFilter::new(QuillError::new("bad", ErrorKind::InvalidQuery));
        assert_eq!(filter.apply(&Document::new()).unwrap_err().kind(), &ErrorKind::InvalidQuery);
    }
}
