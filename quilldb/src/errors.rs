use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for quilldb operations.
///
/// Each kind describes one category of failure so callers can branch on
/// [QuillError::kind] instead of parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use quilldb::errors::{QuillError, ErrorKind, QuillResult};
///
/// fn example() -> QuillResult<()> {
///     Err(QuillError::new("Duplicate _id 42", ErrorKind::DuplicateIdentifier))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Document shape errors
    /// Illegal field name, absent-sentinel value or malformed identifier
    InvalidDocumentShape,
    /// A document with the same identifier is already stored
    DuplicateIdentifier,

    // Query and update errors
    /// The query document or one of its operator payloads is malformed
    InvalidQuery,
    /// The update is malformed or cannot be applied to the target document
    InvalidUpdate,
    /// An array operator was applied to a field that is not an array
    TypeMismatch,

    // Path resolution errors, normally converted into non-matches
    /// A path segment does not exist in the target value
    PathNotFound,
    /// A path segment addresses into a value that cannot be indexed by it
    NotIndexable,

    // Persistence errors
    /// A persisted line could not be parsed or validated, or a record could not be serialized
    CorruptRecord,
    /// The operation requires configuration the datastore does not have
    ConfigurationError,
    /// Generic IO error
    IOError,
    /// Error encoding or decoding data
    EncodingError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidDocumentShape => write!(f, "Invalid document shape"),
            ErrorKind::DuplicateIdentifier => write!(f, "Duplicate identifier"),
            ErrorKind::InvalidQuery => write!(f, "Invalid query"),
            ErrorKind::InvalidUpdate => write!(f, "Invalid update"),
            ErrorKind::TypeMismatch => write!(f, "Type mismatch"),
            ErrorKind::PathNotFound => write!(f, "Path not found"),
            ErrorKind::NotIndexable => write!(f, "Not indexable"),
            ErrorKind::CorruptRecord => write!(f, "Corrupt record"),
            ErrorKind::ConfigurationError => write!(f, "Configuration error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom quilldb error type.
///
/// `QuillError` carries a message, an [ErrorKind], an optional cause and the
/// backtrace captured where it was created.
///
/// # Examples
///
/// ```rust,ignore
/// use quilldb::errors::{QuillError, ErrorKind};
///
/// let cause = QuillError::new("expected value at line 1", ErrorKind::EncodingError);
/// let err = QuillError::new_with_cause("Corrupt line", ErrorKind::CorruptRecord, cause);
/// ```
#[derive(Clone)]
pub struct QuillError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<QuillError>>,
    backtrace: Atomic<Backtrace>,
}

impl QuillError {
    /// Creates a new `QuillError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        QuillError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `QuillError` chained to the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: QuillError) -> Self {
        QuillError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&QuillError> {
        self.cause.as_deref()
    }
}

impl Display for QuillError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for QuillError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for QuillError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for quilldb operations.
pub type QuillResult<T> = Result<T, QuillError>;

impl de::Error for QuillError {
    fn custom<T: Display>(msg: T) -> Self {
        QuillError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl ser::Error for QuillError {
    fn custom<T: Display>(msg: T) -> Self {
        QuillError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl From<std::io::Error> for QuillError {
    fn from(err: std::io::Error) -> Self {
        QuillError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<serde_json::Error> for QuillError {
    fn from(err: serde_json::Error) -> Self {
        QuillError::new(&format!("JSON error: {}", err), ErrorKind::EncodingError)
    }
}

impl From<std::string::FromUtf8Error> for QuillError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        QuillError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<regex::Error> for QuillError {
    fn from(err: regex::Error) -> Self {
        QuillError::new(
            &format!("Invalid regex pattern: {}", err),
            ErrorKind::InvalidQuery,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quill_error_new_creates_error() {
        let error = QuillError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::IOError);
        assert!(error.cause().is_none());
    }

    #[test]
    fn quill_error_new_with_cause_creates_error() {
        let cause = QuillError::new("unexpected end of input", ErrorKind::EncodingError);
        let error = QuillError::new_with_cause("Corrupt line", ErrorKind::CorruptRecord, cause);
        assert_eq!(error.kind(), &ErrorKind::CorruptRecord);
        assert_eq!(error.cause().map(|c| c.kind().clone()), Some(ErrorKind::EncodingError));
        assert!(error.source().is_some());
    }

    #[test]
    fn quill_error_display_formats_message_only() {
        let error = QuillError::new("Duplicate _id 1", ErrorKind::DuplicateIdentifier);
        assert_eq!(format!("{}", error), "Duplicate _id 1");
    }

    #[test]
    fn quill_error_debug_formats_with_cause() {
        let cause = QuillError::new("root", ErrorKind::IOError);
        let error = QuillError::new_with_cause("top", ErrorKind::ConfigurationError, cause);
        let formatted = format!("{:?}", error);
        assert!(formatted.contains("top"));
        assert!(formatted.contains("Caused by:"));
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::TypeMismatch.to_string(), "Type mismatch");
        assert_eq!(ErrorKind::CorruptRecord.to_string(), "Corrupt record");
        assert_eq!(ErrorKind::ConfigurationError.to_string(), "Configuration error");
    }

    #[test]
    fn from_io_error_maps_to_io_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: QuillError = io.into();
        assert_eq!(error.kind(), &ErrorKind::IOError);
        assert!(error.message().contains("missing"));
    }

    #[test]
    fn from_json_error_maps_to_encoding_kind() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: QuillError = json_err.into();
        assert_eq!(error.kind(), &ErrorKind::EncodingError);
    }

    #[test]
    fn from_regex_error_maps_to_invalid_query() {
        let regex_err = regex::Regex::new("(unclosed").unwrap_err();
        let error: QuillError = regex_err.into();
        assert_eq!(error.kind(), &ErrorKind::InvalidQuery);
    }
}
