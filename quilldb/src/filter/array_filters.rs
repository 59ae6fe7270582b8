use itertools::Itertools;
use std::fmt::Display;

use crate::{
    collection::{Document, FieldPath},
    common::Value,
    errors::{ErrorKind, QuillError, QuillResult},
};

use super::{resolve_field, FilterProvider};

/// Matches array fields holding an element equal to a literal.
///
/// An absent field does not match. A field holding anything other than an
/// array is a `TypeMismatch` error: the query asked an array question of a
/// non-array value.
pub(crate) struct ContainsFilter {
    field_path: FieldPath,
    element: Value,
}

impl ContainsFilter {
    pub(crate) fn new(field_path: FieldPath, element: Value) -> Self {
        ContainsFilter {
            field_path,
            element,
        }
    }
}

impl Display for ContainsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} contains {})", self.field_path, self.element)
    }
}

impl FilterProvider for ContainsFilter {
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        match resolve_field(&self.field_path, entry) {
            None => Ok(false),
            Some(Value::Array(values)) => Ok(values.contains(&self.element)),
            Some(other) => {
                log::error!(
                    "$contains on field '{}' requires an array, found {}",
                    self.field_path,
                    other.type_name()
                );
                Err(QuillError::new(
                    &format!(
                        "$contains on field '{}' requires an array, found {}",
                        self.field_path,
                        other.type_name()
                    ),
                    ErrorKind::TypeMismatch,
                ))
            }
        }
    }
}

/// Matches documents where a field equals one of the given values.
pub(crate) struct InFilter {
    field_path: FieldPath,
    values: Vec<Value>,
}

impl InFilter {
    pub(crate) fn new(field_path: FieldPath, values: Vec<Value>) -> Self {
        InFilter { field_path, values }
    }
}

impl Display for InFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} in [{}])", self.field_path, self.values.iter().join(", "))
    }
}

impl FilterProvider for InFilter {
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        Ok(resolve_field(&self.field_path, entry)
            .is_some_and(|value| self.values.contains(value)))
    }
}

/// Matches documents where a field is absent or equals none of the given
/// values.
pub(crate) struct NotInFilter {
    field_path: FieldPath,
    values: Vec<Value>,
}

impl NotInFilter {
    pub(crate) fn new(field_path: FieldPath, values: Vec<Value>) -> Self {
        NotInFilter { field_path, values }
    }
}

impl Display for NotInFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} not in [{}])", self.field_path, self.values.iter().join(", "))
    }
}

impl FilterProvider for NotInFilter {
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        Ok(resolve_field(&self.field_path, entry)
            .map_or(true, |value| !self.values.contains(value)))
    }
}
