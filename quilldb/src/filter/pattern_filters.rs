use regex::Regex;
use std::fmt::Display;

use crate::{
    collection::{Document, FieldPath},
    common::Value,
    errors::{ErrorKind, QuillError, QuillResult},
};

use super::{resolve_field, FilterProvider};

/// Matches string fields containing a literal substring.
///
/// With `ignore_case` both sides are lowercased before the search. A field
/// that is absent or not a string does not match.
pub(crate) struct SubstringFilter {
    field_path: FieldPath,
    needle: String,
    ignore_case: bool,
}

impl SubstringFilter {
    pub(crate) fn new(field_path: FieldPath, needle: String, ignore_case: bool) -> Self {
        let needle = if ignore_case {
            needle.to_lowercase()
        } else {
            needle
        };
        SubstringFilter {
            field_path,
            needle,
            ignore_case,
        }
    }
}

impl Display for SubstringFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = if self.ignore_case { "ilike" } else { "like" };
        write!(f, "({} {} {:?})", self.field_path, op, self.needle)
    }
}

impl FilterProvider for SubstringFilter {
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        match resolve_field(&self.field_path, entry) {
            Some(Value::String(s)) if self.ignore_case => {
                Ok(s.to_lowercase().contains(&self.needle))
            }
            Some(Value::String(s)) => Ok(s.contains(&self.needle)),
            _ => Ok(false),
        }
    }
}

/// Matches string fields against a regular expression.
pub(crate) struct RegexFilter {
    field_path: FieldPath,
    pattern: Regex,
}

impl RegexFilter {
    /// Compiles the pattern up front.
    ///
    /// # Errors
    ///
    /// `InvalidQuery` if the pattern does not compile.
    pub(crate) fn new(field_path: FieldPath, pattern: &str) -> QuillResult<Self> {
        match Regex::new(pattern) {
            Ok(pattern) => Ok(RegexFilter {
                field_path,
                pattern,
            }),
            Err(e) => {
                log::error!("Invalid regex pattern '{}': {}", pattern, e);
                Err(QuillError::new(
                    &format!("Invalid regex pattern '{}': {}", pattern, e),
                    ErrorKind::InvalidQuery,
                ))
            }
        }
    }
}

impl Display for RegexFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} regex {})", self.field_path, self.pattern.as_str())
    }
}

impl FilterProvider for RegexFilter {
    fn apply(&self, entry: &Document) -> QuillResult<bool> {
        match resolve_field(&self.field_path, entry) {
            Some(Value::String(s)) => Ok(self.pattern.is_match(s)),
            _ => Ok(false),
        }
    }
}
