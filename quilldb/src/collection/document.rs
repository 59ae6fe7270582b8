use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::{Debug, Display, Formatter};

use crate::collection::{DocumentId, FieldPath};
use crate::common::{Value, DOC_ID};
use crate::errors::QuillResult;

/// Represents a schemaless document.
///
/// A document is an insertion-ordered mapping from field name to [Value].
/// Two documents are equal when they hold the same keys with equal values,
/// regardless of key order.
///
/// The `_id` field holds the document identifier (see [DocumentId]). Field
/// names used in stored documents must not start with `$` nor contain `.`;
/// those rules are checked when a document enters the store, not on every
/// [Document::put], because queries and updates are documents too and rely on
/// `$` operators and dotted paths.
///
/// Nested fields are read through [Document::resolve] using dot or bracket
/// paths such as `"location.address.zip"` or `"items[0].name"`.
#[derive(Clone, Default, PartialEq)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    /// Checks if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Associates the value with the top level key.
    ///
    /// An existing key keeps its position and gets the new value; a new key
    /// is appended at the end.
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("name", "Alice");
    /// doc.put("age", 30);
    /// assert_eq!(doc.size(), 2);
    /// ```
    pub fn put<K: Into<String>, T: Into<Value>>(&mut self, key: K, value: T) {
        self.data.insert(key.into(), value.into());
    }

    /// Returns the value of a top level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Resolves a dot/bracket path against this document.
    ///
    /// ```ignore
    /// let doc = doc!{ location: { city: "New York" }, items: [{ name: "a" }] };
    /// assert_eq!(doc.resolve("location.city")?, &Value::from("New York"));
    /// assert_eq!(doc.resolve("items[0].name")?, &Value::from("a"));
    /// ```
    ///
    /// # Errors
    ///
    /// `PathNotFound` when a segment is missing, `NotIndexable` when a segment
    /// addresses into a scalar or uses a non-numeric segment on an array, and
    /// `InvalidQuery` when the path itself is malformed.
    pub fn resolve(&self, path: &str) -> QuillResult<&Value> {
        FieldPath::parse(path)?.resolve(self)
    }

    /// Returns the value of a top level key, inserting the value produced by
    /// `default` first if the key is absent.
    pub fn entry<F: FnOnce() -> Value>(&mut self, key: &str, default: F) -> &mut Value {
        self.data.entry(key.to_string()).or_insert_with(default)
    }

    /// Removes a top level key, keeping the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    /// Checks if a top level key exists in the document.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the number of top level entries.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Top level keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.data.iter()
    }

    /// Checks if this document has an `_id` field.
    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Returns the identifier of this document, if it holds a valid one.
    pub fn id(&self) -> Option<DocumentId> {
        self.data
            .get(DOC_ID)
            .and_then(|value| DocumentId::try_from(value).ok())
    }

    /// Builds a document containing only the listed top level fields.
    ///
    /// Fields missing from this document are skipped; an empty list yields
    /// an empty document. `_id` is kept only when listed.
    pub fn project(&self, fields: &[&str]) -> Document {
        let mut projected = Document::new();
        for field in fields {
            if let Some(value) = self.data.get(*field) {
                projected.put(*field, value.clone());
            }
        }
        projected
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (key, value) in &self.data {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
        let mut doc = Document::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            doc.put(key, value);
        }
        Ok(doc)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Document, D::Error> {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// Keys may be identifiers or string literals (needed for `$` operators and
/// dotted paths). Values are literals, nested `{ ... }` documents, `[ ... ]`
/// arrays, or parenthesised expressions.
///
/// # Examples
///
/// ```rust
/// use quilldb::doc;
///
/// let empty = doc!{};
///
/// let simple = doc!{
///     name: "Alice",
///     age: 30
/// };
///
/// let base = 100;
/// let with_expr = doc!{
///     score: (base * 2),
///     negative: (-1)
/// };
///
/// let query = doc!{
///     "$or": [{ kind: "normal" }, { "parent.id": 3 }]
/// };
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            let mut doc = $crate::collection::Document::new();
            $(
                doc.put($crate::collection::normalize(stringify!($key)), $crate::doc_value!($value));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn set_up() -> Document {
        doc! {
            score: 1034,
            location: {
                state: "NY",
                address: {
                    line1: "40",
                    house: ["1", "2", "3"],
                    zip: 10001,
                },
            },
            category: ["food", "produce", "grocery"],
            obj_array: [
                { value: 1 },
                { value: 2 },
            ]
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("\"$set\""), "$set");
        assert_eq!(normalize("name"), "name");
    }

    #[test]
    fn test_empty_document() {
        let doc = doc! {};
        assert!(doc.is_empty());
        assert_eq!(doc.size(), 0);
    }

    #[test]
    fn test_put_keeps_position_of_existing_key() {
        let mut doc = doc! { a: 1, b: 2, c: 3 };
        doc.put("b", 20);
        let keys: Vec<&str> = doc.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(doc.get("b"), Some(&Value::from(20)));
    }

    #[test]
    fn test_put_accepts_operator_and_path_keys() {
        let doc = doc! { "$gt": { "a.b": 1 } };
        assert!(doc.contains_key("$gt"));
        let inner = doc.get("$gt").and_then(|v| v.as_document()).unwrap();
        assert!(inner.contains_key("a.b"));
    }

    #[test]
    fn test_resolve_nested() {
        let doc = set_up();
        assert_eq!(doc.resolve("score").unwrap(), &Value::from(1034));
        assert_eq!(doc.resolve("location.state").unwrap(), &Value::from("NY"));
        assert_eq!(doc.resolve("location.address.zip").unwrap(), &Value::from(10001));
        assert_eq!(doc.resolve("location.address.house.1").unwrap(), &Value::from("2"));
        assert_eq!(doc.resolve("location.address.house[2]").unwrap(), &Value::from("3"));
        assert_eq!(doc.resolve("obj_array[1].value").unwrap(), &Value::from(2));
        assert_eq!(doc.resolve("obj_array.0.value").unwrap(), &Value::from(1));
    }

    #[test]
    fn test_resolve_failures() {
        let doc = set_up();
        let err = doc.resolve("location.country").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::PathNotFound);

        let err = doc.resolve("category.5").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::PathNotFound);

        let err = doc.resolve("score.value").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::NotIndexable);

        let err = doc.resolve("category.first").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::NotIndexable);

        let err = doc.resolve("location..state").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
    }

    #[test]
    fn test_entry_creates_only_when_absent() {
        let mut doc = doc! { count: 5 };
        *doc.entry("count", || Value::from(0)) = Value::from(6);
        doc.entry("fresh", || Value::Array(vec![]));
        assert_eq!(doc.get("count"), Some(&Value::from(6)));
        assert_eq!(doc.get("fresh"), Some(&Value::Array(vec![])));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut doc = doc! { a: 1, b: 2, c: 3 };
        assert_eq!(doc.remove("b"), Some(Value::from(2)));
        assert_eq!(doc.remove("missing"), None);
        let keys: Vec<&str> = doc.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_id() {
        assert_eq!(doc! { "_id": "abc" }.id(), Some(DocumentId::from("abc")));
        assert_eq!(doc! { "_id": 7 }.id(), Some(DocumentId::from(7)));
        assert_eq!(doc! { "_id": "" }.id(), None);
        assert!(doc! { "_id": true }.has_id());
        assert!(!doc! { name: "x" }.has_id());
    }

    #[test]
    fn test_project() {
        let doc = doc! { "_id": 1, name: "a", age: 3 };
        assert_eq!(doc.project(&["name", "missing"]), doc! { name: "a" });
        assert_eq!(doc.project(&[]), Document::new());
        assert_eq!(doc.project(&["_id", "age"]), doc! { "_id": 1, age: 3 });
    }

    #[test]
    fn test_serde_round_trip_keeps_order() {
        let doc = doc! { z: 1, a: { y: [1, 2] }, m: (Value::Null) };
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, r#"{"z":1,"a":{"y":[1,2]},"m":null}"#);
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_deserialize_rejects_non_object() {
        assert!(serde_json::from_str::<Document>("[1,2]").is_err());
        assert!(serde_json::from_str::<Document>("42").is_err());
    }

    #[test]
    fn test_display() {
        let doc = doc! { name: "a", tags: ["x"] };
        assert_eq!(doc.to_string(), r#"{"name": "a", "tags": ["x"]}"#);
    }

    #[test]
    fn test_doc_macro_expressions() {
        let base = 10;
        let doc = doc! { score: (base * 2), negative: (-1), nested: { list: [] } };
        assert_eq!(doc.get("score"), Some(&Value::from(20)));
        assert_eq!(doc.get("negative"), Some(&Value::from(-1)));
        assert_eq!(doc.resolve("nested.list").unwrap(), &Value::Array(vec![]));
    }
}
