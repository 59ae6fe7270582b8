use std::cmp::Ordering;
use std::fmt::Display;

use crate::{
    collection::{Document, FieldPath},
    common::Value,
    errors::QuillResult,
};

use super::{resolve_field, FilterProvider};

/// Comparison operation performed by a [ComparisonFilter].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComparisonMode {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

impl ComparisonMode {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonMode::Greater => ordering == Ordering::Greater,
            ComparisonMode::GreaterEqual => ordering != Ordering::Less,
            ComparisonMode::Lesser => ordering == Ordering::Less,
            ComparisonMode::LesserEqual => ordering != Ordering::Greater,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            ComparisonMode::Greater => ">",
            ComparisonMode::GreaterEqual => ">=",
            ComparisonMode::Lesser => "<",
            ComparisonMode::LesserEqual => "<=",
        }
    }
}

/// Orders a field against a literal.
///
/// Only number/number and string/string pairs are ordered. Any other
/// combination, and an absent field, is a non-match rather than an error.
pub(crate) struct ComparisonFilter {
    field_path: FieldPath,
    field_value: Value,
    mode: ComparisonMode,
}

impl ComparisonFilter {
    pub(crate) fn new(field_path: FieldPath, field_value: Value, mode: ComparisonMode) -> Self {
        ComparisonFilter {
            field_path,
            field_value,
            mode,
        }
    }
}

impl Display for ComparisonFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({} {} {})",
            self.field_path,
            self.mode.symbol(),
            self.field_value
        )
    }
}

impl FilterProvider for ComparisonFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        let ordering = resolve_field(&self.field_path, entry)
            .and_then(|value| value.compare(&self.field_value));
        Ok(ordering.is_some_and(|ordering| self.mode.accepts(ordering)))
    }
}
