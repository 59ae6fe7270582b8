use std::fmt::{Display, Formatter};

use crate::common::Value;
use crate::errors::{ErrorKind, QuillError, QuillResult};

/// The identifier of a stored document, kept in its `_id` field.
///
/// An identifier is either a non-empty string or an integer. Generated
/// identifiers are always [DocumentId::Text]. `Text("1")` and `Number(1)`
/// are different identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentId {
    Text(String),
    Number(i64),
}

impl DocumentId {
    /// Converts the identifier back into the value stored under `_id`.
    pub fn to_value(&self) -> Value {
        match self {
            DocumentId::Text(text) => Value::String(text.clone()),
            DocumentId::Number(number) => Value::I64(*number),
        }
    }
}

impl TryFrom<&Value> for DocumentId {
    type Error = QuillError;

    fn try_from(value: &Value) -> QuillResult<Self> {
        match value {
            Value::String(text) if !text.is_empty() => Ok(DocumentId::Text(text.clone())),
            Value::I64(number) => Ok(DocumentId::Number(*number)),
            // integral floats show up when a number was written as `1.0`
            Value::F64(number)
                if number.fract() == 0.0
                    && *number >= i64::MIN as f64
                    && *number <= i64::MAX as f64 =>
            {
                Ok(DocumentId::Number(*number as i64))
            }
            other => Err(QuillError::new(
                &format!(
                    "Invalid _id {}: expected a non-empty string or an integer",
                    other
                ),
                ErrorKind::InvalidDocumentShape,
            )),
        }
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentId::Text(text) => write!(f, "{}", text),
            DocumentId::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        DocumentId::Text(value.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        DocumentId::Text(value)
    }
}

impl From<i64> for DocumentId {
    fn from(value: i64) -> Self {
        DocumentId::Number(value)
    }
}

impl From<i32> for DocumentId {
    fn from(value: i32) -> Self {
        DocumentId::Number(i64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_valid_values() {
        assert_eq!(
            DocumentId::try_from(&Value::from("abc")).unwrap(),
            DocumentId::Text("abc".to_string())
        );
        assert_eq!(DocumentId::try_from(&Value::from(3)).unwrap(), DocumentId::Number(3));
        assert_eq!(DocumentId::try_from(&Value::F64(4.0)).unwrap(), DocumentId::Number(4));
    }

    #[test]
    fn test_try_from_invalid_values() {
        for value in [
            Value::from(""),
            Value::F64(1.5),
            Value::Null,
            Value::Bool(true),
            Value::from(vec![1]),
            Value::Unknown,
        ] {
            let err = DocumentId::try_from(&value).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidDocumentShape);
        }
    }

    #[test]
    fn test_text_and_number_are_distinct() {
        assert_ne!(DocumentId::from("1"), DocumentId::from(1));
    }

    #[test]
    fn test_to_value_round_trip() {
        let id = DocumentId::from(12);
        assert_eq!(DocumentId::try_from(&id.to_value()).unwrap(), id);
        let id = DocumentId::from("xyz");
        assert_eq!(DocumentId::try_from(&id.to_value()).unwrap(), id);
    }

    #[test]
    fn test_display() {
        assert_eq!(DocumentId::from("a1").to_string(), "a1");
        assert_eq!(DocumentId::from(-5).to_string(), "-5");
    }
}
