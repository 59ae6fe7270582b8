use crate::{
    collection::FieldPath,
    common::Value,
    errors::QuillResult,
};

use super::{
    ComparisonFilter, ComparisonMode, ContainsFilter, EqualsFilter, Filter, HasFieldsFilter,
    InFilter, InvalidFilter, NotEqualsFilter, NotInFilter, ObjectMatchFilter, RegexFilter,
    SubstringFilter,
};

/// Starts a fluent filter on a field path.
///
/// The path uses dot/bracket notation (`location.city`, `items[0].name`).
/// A malformed path, or an invalid regex pattern, does not panic: the
/// resulting filter fails with `InvalidQuery` when applied.
///
/// # Examples
///
/// ```rust,ignore
/// use quilldb::filter::field;
///
/// let filter = field("age").gt(30).and(field("status").eq("active"));
/// ```
pub fn field(path: &str) -> FluentFilter {
    FluentFilter {
        field_path: FieldPath::parse(path),
    }
}

/// Creates a filter matching documents that hold every listed top level key.
pub fn has<S: AsRef<str>>(fields: &[S]) -> Filter {
    Filter::new(HasFieldsFilter::new(
        fields.iter().map(|f| f.as_ref().to_string()).collect(),
    ))
}

/// A fluent builder for constructing filters on a specific field.
pub struct FluentFilter {
    field_path: QuillResult<FieldPath>,
}

impl FluentFilter {
    fn build<F>(self, make: F) -> Filter
    where
        F: FnOnce(FieldPath) -> QuillResult<Filter>,
    {
        match self.field_path.and_then(make) {
            Ok(filter) => filter,
            Err(error) => Filter::new(InvalidFilter::new(error)),
        }
    }

    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        let value = value.into();
        self.build(|path| Ok(Filter::new(EqualsFilter::new(path, value))))
    }

    /// Matches when the field differs from `value` or is absent.
    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        let value = value.into();
        self.build(|path| Ok(Filter::new(NotEqualsFilter::new(path, value))))
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Greater)
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::GreaterEqual)
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Lesser)
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::LesserEqual)
    }

    /// Case-sensitive substring match on a string field.
    pub fn like(self, needle: &str) -> Filter {
        let needle = needle.to_string();
        self.build(|path| Ok(Filter::new(SubstringFilter::new(path, needle, false))))
    }

    /// Case-insensitive substring match on a string field.
    pub fn ilike(self, needle: &str) -> Filter {
        let needle = needle.to_string();
        self.build(|path| Ok(Filter::new(SubstringFilter::new(path, needle, true))))
    }

    pub fn regex(self, pattern: &str) -> Filter {
        self.build(|path| Ok(Filter::new(RegexFilter::new(path, pattern)?)))
    }

    /// Matches array fields holding an element equal to `value`.
    ///
    /// Applying the filter to a document whose field is present but not an
    /// array fails with `TypeMismatch`.
    pub fn contains<T: Into<Value>>(self, value: T) -> Filter {
        let value = value.into();
        self.build(|path| Ok(Filter::new(ContainsFilter::new(path, value))))
    }

    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let values = values.into_iter().map(Into::into).collect();
        self.build(|path| Ok(Filter::new(InFilter::new(path, values))))
    }

    pub fn not_in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let values = values.into_iter().map(Into::into).collect();
        self.build(|path| Ok(Filter::new(NotInFilter::new(path, values))))
    }

    /// Matches when the field holds a sub-document satisfying `filter`.
    pub fn matches(self, filter: Filter) -> Filter {
        self.build(|path| Ok(Filter::new(ObjectMatchFilter::new(path, filter))))
    }

    fn compare(self, value: Value, mode: ComparisonMode) -> Filter {
        self.build(|path| Ok(Filter::new(ComparisonFilter::new(path, value, mode))))
    }
}
