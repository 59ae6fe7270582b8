use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

use crate::collection::Document;
use crate::common::{Value, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, QuillError, QuillResult};

type SegmentVec = SmallVec<[String; 8]>;

/// A parsed dot/bracket field path such as `location.address.zip` or
/// `items[0].name`.
///
/// `foo.0.bar` and `foo[0].bar` parse to the same segments. Numeric segments
/// index into arrays, other segments look up document keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath {
    path: String,
    segments: SegmentVec,
}

impl FieldPath {
    /// Parses a path string.
    ///
    /// # Errors
    ///
    /// `InvalidQuery` for an empty path, an empty segment (`a..b`), or a
    /// bracket that is unbalanced or does not hold an array index.
    pub fn parse(path: &str) -> QuillResult<FieldPath> {
        if path.is_empty() {
            log::error!("Field path cannot be empty");
            return Err(QuillError::new(
                "Field path cannot be empty",
                ErrorKind::InvalidQuery,
            ));
        }

        let mut segments = SegmentVec::new();
        for part in path.split(FIELD_SEPARATOR) {
            let (name, mut rest) = match part.find('[') {
                Some(i) => (&part[..i], &part[i..]),
                None => (part, ""),
            };

            if name.is_empty() && rest.is_empty() {
                return Err(invalid_path(path, "empty segment"));
            }
            if name.contains(']') {
                return Err(invalid_path(path, "unbalanced bracket"));
            }
            if !name.is_empty() {
                segments.push(name.to_string());
            }

            // bracket groups, e.g. `[0][1]`
            while !rest.is_empty() {
                if !rest.starts_with('[') {
                    return Err(invalid_path(path, "unexpected text after bracket"));
                }
                let close = rest
                    .find(']')
                    .ok_or_else(|| invalid_path(path, "unbalanced bracket"))?;
                let index = &rest[1..close];
                if parse_index(index).is_none() {
                    return Err(invalid_path(path, "bracket must contain an array index"));
                }
                segments.push(index.to_string());
                rest = &rest[close + 1..];
            }
        }

        Ok(FieldPath {
            path: path.to_string(),
            segments,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Walks the path from the root document and returns the value it
    /// addresses. Never mutates the document.
    pub fn resolve<'a>(&self, document: &'a Document) -> QuillResult<&'a Value> {
        self.walk(document).map_err(|miss| match miss {
            Miss::NotFound(segment) => self.not_found(segment),
            Miss::NotIndexable(segment, value) => self.not_indexable(segment, value),
        })
    }

    /// Same walk as [FieldPath::resolve], but a path that does not lead to a
    /// value yields `None` and no error is built.
    pub fn lookup<'a>(&self, document: &'a Document) -> Option<&'a Value> {
        self.walk(document).ok()
    }

    fn walk<'a, 's>(&'s self, document: &'a Document) -> Result<&'a Value, Miss<'a, 's>> {
        let mut segments = self.segments.iter();
        let first = match segments.next() {
            Some(first) => first,
            None => return Err(Miss::NotFound("")),
        };

        let mut current = document.get(first).ok_or(Miss::NotFound(first.as_str()))?;
        for segment in segments {
            current = match current {
                Value::Document(doc) => doc.get(segment).ok_or(Miss::NotFound(segment.as_str()))?,
                Value::Array(values) => match parse_index(segment) {
                    Some(index) => values.get(index).ok_or(Miss::NotFound(segment.as_str()))?,
                    None => return Err(Miss::NotIndexable(segment.as_str(), current)),
                },
                other => return Err(Miss::NotIndexable(segment.as_str(), other)),
            };
        }
        Ok(current)
    }

    fn not_found(&self, segment: &str) -> QuillError {
        QuillError::new(
            &format!("Segment '{}' of path '{}' does not exist", segment, self.path),
            ErrorKind::PathNotFound,
        )
    }

    fn not_indexable(&self, segment: &str, value: &Value) -> QuillError {
        QuillError::new(
            &format!(
                "Segment '{}' of path '{}' cannot index into a {}",
                segment,
                self.path,
                value.type_name()
            ),
            ErrorKind::NotIndexable,
        )
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

enum Miss<'a, 's> {
    NotFound(&'s str),
    NotIndexable(&'s str, &'a Value),
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse::<usize>().ok()
}

fn invalid_path(path: &str, reason: &str) -> QuillError {
    log::error!("Invalid field path '{}': {}", path, reason);
    QuillError::new(
        &format!("Invalid field path '{}': {}", path, reason),
        ErrorKind::InvalidQuery,
    )
}
