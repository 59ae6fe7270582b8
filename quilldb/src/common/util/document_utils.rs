use crate::collection::{Document, DocumentId};
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR, OPERATOR_PREFIX};
use crate::errors::{ErrorKind, QuillError, QuillResult};

/// Checks whether a name may be used as a field of a stored document.
///
/// Names must be non-empty, must not start with `$` (reserved for
/// operators and modifiers) and must not contain `.` (the path separator).
#[inline]
pub fn is_legal_field_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with(OPERATOR_PREFIX) && !name.contains(FIELD_SEPARATOR)
}

pub fn validate_field_name(name: &str) -> QuillResult<()> {
    if is_legal_field_name(name) {
        Ok(())
    } else {
        log::error!("Illegal field name '{}'", name);
        Err(QuillError::new(
            &format!(
                "Illegal field name '{}': names must be non-empty, must not start with '$' and must not contain '.'",
                name
            ),
            ErrorKind::InvalidDocumentShape,
        ))
    }
}

/// Validates a value that is about to be stored, descending into nested
/// documents and arrays.
pub fn validate_value(value: &Value) -> QuillResult<()> {
    match value {
        Value::Unknown => {
            log::error!("Undefined values cannot be stored");
            Err(QuillError::new(
                "Undefined values cannot be stored",
                ErrorKind::InvalidDocumentShape,
            ))
        }
        Value::Document(doc) => validate_fields(doc),
        Value::Array(values) => values.iter().try_for_each(validate_value),
        _ => Ok(()),
    }
}

/// Validates every field name and value of a document at every nesting level.
pub fn validate_fields(document: &Document) -> QuillResult<()> {
    for (key, value) in document.iter() {
        validate_field_name(key)?;
        validate_value(value)?;
    }
    Ok(())
}

/// Validates a document that is about to enter the store and returns its
/// identifier.
pub fn validate_document(document: &Document) -> QuillResult<DocumentId> {
    validate_fields(document)?;
    match document.get(DOC_ID) {
        Some(value) => DocumentId::try_from(value),
        None => {
            log::error!("Document {} has no _id", document);
            Err(QuillError::new(
                "Document has no _id",
                ErrorKind::InvalidDocumentShape,
            ))
        }
    }
}

/// Applies a projection: `None` keeps the whole document, `Some(fields)`
/// keeps only the listed top level fields.
pub fn project(document: &Document, projection: Option<&[&str]>) -> Document {
    match projection {
        Some(fields) => document.project(fields),
        None => document.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_is_legal_field_name() {
        assert!(is_legal_field_name("name"));
        assert!(is_legal_field_name("_id"));
        assert!(is_legal_field_name("a$b"));
        assert!(!is_legal_field_name(""));
        assert!(!is_legal_field_name("$set"));
        assert!(!is_legal_field_name("a.b"));
    }

    #[test]
    fn test_validate_fields_descends_into_nested_values() {
        assert!(validate_fields(&doc! { a: { b: [{ c: 1 }] } }).is_ok());

        let nested = doc! { a: { "$bad": 1 } };
        assert_eq!(
            validate_fields(&nested).unwrap_err().kind(),
            &ErrorKind::InvalidDocumentShape
        );

        let in_array = doc! { a: [1, { "x.y": 2 }] };
        assert_eq!(
            validate_fields(&in_array).unwrap_err().kind(),
            &ErrorKind::InvalidDocumentShape
        );
    }

    #[test]
    fn test_validate_value_rejects_unknown_but_accepts_null() {
        assert!(validate_value(&Value::Null).is_ok());
        assert!(validate_value(&Value::Unknown).is_err());
        assert!(validate_value(&Value::Array(vec![Value::Unknown])).is_err());
        let mut doc = Document::new();
        doc.put("missing", Value::Unknown);
        assert!(validate_fields(&doc).is_err());
    }

    #[test]
    fn test_validate_document_requires_valid_id() {
        assert_eq!(
            validate_document(&doc! { "_id": "a", n: 1 }).unwrap(),
            DocumentId::from("a")
        );
        assert_eq!(
            validate_document(&doc! { n: 1 }).unwrap_err().kind(),
            &ErrorKind::InvalidDocumentShape
        );
        assert_eq!(
            validate_document(&doc! { "_id": (Value::Null) }).unwrap_err().kind(),
            &ErrorKind::InvalidDocumentShape
        );
    }

    #[test]
    fn test_project() {
        let doc = doc! { "_id": 1, a: 1, b: 2 };
        assert_eq!(project(&doc, None), doc);
        assert_eq!(project(&doc, Some(&["b"])), doc! { b: 2 });
        assert_eq!(project(&doc, Some(&[])), Document::new());
    }
}
