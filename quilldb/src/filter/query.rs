use crate::{
    collection::{Document, FieldPath},
    common::*,
    errors::{ErrorKind, QuillError, QuillResult},
};

use super::{
    and_all, AndFilter, ComparisonFilter, ComparisonMode, ContainsFilter, EqualsFilter, Filter,
    HasFieldsFilter, InFilter, NotEqualsFilter, NotFilter, NotInFilter, ObjectMatchFilter,
    OrFilter, RegexFilter, SubstringFilter,
};

/// Compiles a query document into a [Filter].
///
/// Every top level key must hold, so the clauses are AND-ed. A key starting
/// with `$` is an operator; any other key is a field path compared against
/// its payload:
///
/// - a scalar payload must equal the resolved value,
/// - an array payload must equal the resolved array element by element,
/// - a document payload is compiled as a sub-query and applied to the
///   resolved sub-document, so extra keys in the stored value are ignored.
///
/// The empty query matches every document.
///
/// # Errors
///
/// `InvalidQuery` for an unknown operator, a malformed operator payload, a
/// malformed field path or an invalid regex pattern.
pub fn compile(query: &Document) -> QuillResult<Filter> {
    let mut filters = Vec::with_capacity(query.size());
    for (key, payload) in query.iter() {
        if key.starts_with(OPERATOR_PREFIX) {
            filters.push(compile_operator(key, payload)?);
        } else {
            filters.push(compile_field(key, payload)?);
        }
    }
    Ok(and_all(filters))
}

/// Compiles `query` and applies it to `document` in one call.
pub fn matches(document: &Document, query: &Document) -> QuillResult<bool> {
    compile(query)?.apply(document)
}

fn compile_field(path: &str, payload: &Value) -> QuillResult<Filter> {
    let field_path = FieldPath::parse(path)?;
    match payload {
        Value::Document(sub_query) => Ok(Filter::new(ObjectMatchFilter::new(
            field_path,
            compile(sub_query)?,
        ))),
        Value::Unknown => Err(invalid_query(&format!(
            "Field '{}' is compared against an undefined value",
            path
        ))),
        literal => Ok(Filter::new(EqualsFilter::new(field_path, literal.clone()))),
    }
}

fn compile_operator(operator: &str, payload: &Value) -> QuillResult<Filter> {
    match operator {
        OP_GT => compile_comparison(operator, payload, ComparisonMode::Greater),
        OP_GTE => compile_comparison(operator, payload, ComparisonMode::GreaterEqual),
        OP_LT => compile_comparison(operator, payload, ComparisonMode::Lesser),
        OP_LTE => compile_comparison(operator, payload, ComparisonMode::LesserEqual),
        OP_NE => compile_pairs(operator, payload, |path, value| {
            Ok(Filter::new(NotEqualsFilter::new(path, value.clone())))
        }),
        OP_LIKE | OP_ILIKE => {
            let ignore_case = operator == OP_ILIKE;
            compile_pairs(operator, payload, |path, value| match value {
                Value::String(needle) => Ok(Filter::new(SubstringFilter::new(
                    path,
                    needle.clone(),
                    ignore_case,
                ))),
                other => Err(invalid_payload(operator, "a string", other)),
            })
        }
        OP_REGEX => compile_pairs(operator, payload, |path, value| match value {
            Value::String(pattern) => Ok(Filter::new(RegexFilter::new(path, pattern)?)),
            other => Err(invalid_payload(operator, "a string pattern", other)),
        }),
        OP_CONTAINS => compile_pairs(operator, payload, |path, value| {
            Ok(Filter::new(ContainsFilter::new(path, value.clone())))
        }),
        OP_IN | OP_NIN => {
            let negate = operator == OP_NIN;
            compile_pairs(operator, payload, |path, value| match value {
                Value::Array(values) if negate => {
                    Ok(Filter::new(NotInFilter::new(path, values.clone())))
                }
                Value::Array(values) => Ok(Filter::new(InFilter::new(path, values.clone()))),
                other => Err(invalid_payload(operator, "an array", other)),
            })
        }
        OP_HAS => compile_has(payload),
        OP_OR => Ok(Filter::new(OrFilter::new(compile_sub_queries(
            operator, payload,
        )?))),
        OP_AND => Ok(Filter::new(AndFilter::new(compile_sub_queries(
            operator, payload,
        )?))),
        OP_NOT => match payload {
            Value::Document(sub_query) => Ok(Filter::new(NotFilter::new(compile(sub_query)?))),
            other => Err(invalid_payload(operator, "a query document", other)),
        },
        unknown => Err(invalid_query(&format!("Unknown query operator '{}'", unknown))),
    }
}

fn compile_comparison(operator: &str, payload: &Value, mode: ComparisonMode) -> QuillResult<Filter> {
    compile_pairs(operator, payload, |path, value| {
        Ok(Filter::new(ComparisonFilter::new(path, value.clone(), mode)))
    })
}

/// Compiles an operator whose payload maps field paths to operands. All
/// pairs must hold.
fn compile_pairs<F>(operator: &str, payload: &Value, mut make: F) -> QuillResult<Filter>
where
    F: FnMut(FieldPath, &Value) -> QuillResult<Filter>,
{
    let pairs = match payload {
        Value::Document(pairs) => pairs,
        other => return Err(invalid_payload(operator, "a {path: value} document", other)),
    };

    let mut filters = Vec::with_capacity(pairs.size());
    for (path, value) in pairs.iter() {
        if value.is_unknown() {
            return Err(invalid_payload(operator, "a defined operand", value));
        }
        filters.push(make(FieldPath::parse(path)?, value)?);
    }
    Ok(and_all(filters))
}

fn compile_has(payload: &Value) -> QuillResult<Filter> {
    let fields = match payload {
        Value::String(name) => vec![name.clone()],
        Value::Array(names) => names
            .iter()
            .map(|name| match name {
                Value::String(name) => Ok(name.clone()),
                other => Err(invalid_payload(OP_HAS, "field names", other)),
            })
            .collect::<QuillResult<Vec<_>>>()?,
        other => return Err(invalid_payload(OP_HAS, "a field name or a list of names", other)),
    };
    Ok(Filter::new(HasFieldsFilter::new(fields)))
}

fn compile_sub_queries(operator: &str, payload: &Value) -> QuillResult<Vec<Filter>> {
    match payload {
        Value::Array(queries) => queries
            .iter()
            .map(|query| match query {
                Value::Document(query) => compile(query),
                other => Err(invalid_payload(operator, "query documents", other)),
            })
            .collect(),
        other => Err(invalid_payload(operator, "a list of queries", other)),
    }
}

fn invalid_payload(operator: &str, expected: &str, found: &Value) -> QuillError {
    invalid_query(&format!(
        "Operator '{}' expects {}, found {}",
        operator,
        expected,
        found.type_name()
    ))
}

fn invalid_query(message: &str) -> QuillError {
    log::error!("{}", message);
    QuillError::new(message, ErrorKind::InvalidQuery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn relation() -> Document {
        doc! {
            "_id": 1,
            kind: "normal",
            tags: ["weak", "strong"],
            rel: { parent: 3, kind: "weak" },
            score: 12
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(matches(&relation(), &Document::new()).unwrap());
        assert!(matches(&Document::new(), &Document::new()).unwrap());
    }

    #[test]
    fn test_top_level_keys_are_anded() {
        assert!(matches(&relation(), &doc! { kind: "normal", score: 12 }).unwrap());
        assert!(!matches(&relation(), &doc! { kind: "normal", score: 13 }).unwrap());
    }

    #[test]
    fn test_array_payload_is_exact_and_ordered() {
        let doc = relation();
        assert!(matches(&doc, &doc! { tags: ["weak", "strong"] }).unwrap());
        assert!(!matches(&doc, &doc! { tags: ["weak"] }).unwrap());
        assert!(!matches(&doc, &doc! { tags: ["strong", "weak"] }).unwrap());
    }

    #[test]
    fn test_object_payload_is_superset_tolerant() {
        let doc = relation();
        assert!(matches(&doc, &doc! { rel: { parent: 3 } }).unwrap());
        assert!(matches(&doc, &doc! { rel: { parent: 3, kind: "weak" } }).unwrap());
        assert!(!matches(&doc, &doc! { rel: { parent: 3, kind: "weak", extra: 1 } }).unwrap());
        assert!(!matches(&doc, &doc! { kind: { parent: 3 } }).unwrap());
    }

    #[test]
    fn test_operators_inside_object_payload() {
        let doc = relation();
        assert!(matches(&doc, &doc! { rel: { "$gt": { parent: 2 } } }).unwrap());
        assert!(!matches(&doc, &doc! { rel: { "$gt": { parent: 3 } } }).unwrap());
    }

    #[test]
    fn test_dot_paths() {
        let doc = relation();
        assert!(matches(&doc, &doc! { "rel.parent": 3 }).unwrap());
        assert!(matches(&doc, &doc! { "tags[1]": "strong" }).unwrap());
        assert!(matches(&doc, &doc! { "tags.0": "weak" }).unwrap());
        assert!(!matches(&doc, &doc! { "kind.sub": "x" }).unwrap());
    }

    #[test]
    fn test_comparison_operators() {
        let doc = relation();
        assert!(matches(&doc, &doc! { "$gt": { score: 10 } }).unwrap());
        assert!(matches(&doc, &doc! { "$gte": { score: 12, "rel.parent": 3 } }).unwrap());
        assert!(!matches(&doc, &doc! { "$gte": { score: 12, "rel.parent": 4 } }).unwrap());
        assert!(matches(&doc, &doc! { "$lt": { kind: "zebra" } }).unwrap());
        assert!(!matches(&doc, &doc! { "$lte": { kind: 5 } }).unwrap());
    }

    #[test]
    fn test_ne_counts_absent_as_not_equal() {
        let doc = relation();
        assert!(matches(&doc, &doc! { "$ne": { kind: "strong" } }).unwrap());
        assert!(!matches(&doc, &doc! { "$ne": { kind: "normal" } }).unwrap());
        assert!(matches(&doc, &doc! { "$ne": { missing: 1 } }).unwrap());
    }

    #[test]
    fn test_like_and_ilike() {
        let doc = relation();
        assert!(matches(&doc, &doc! { "$like": { kind: "orm" } }).unwrap());
        assert!(!matches(&doc, &doc! { "$like": { kind: "ORM" } }).unwrap());
        assert!(matches(&doc, &doc! { "$ilike": { kind: "ORM" } }).unwrap());
    }

    #[test]
    fn test_has_is_shallow() {
        let doc = relation();
        assert!(matches(&doc, &doc! { "$has": "rel" }).unwrap());
        assert!(matches(&doc, &doc! { "$has": ["rel", "tags"] }).unwrap());
        assert!(!matches(&doc, &doc! { "$has": ["rel", "nope"] }).unwrap());
        assert!(!matches(&doc, &doc! { "$has": "rel.parent" }).unwrap());
    }

    #[test]
    fn test_contains() {
        let doc = relation();
        assert!(matches(&doc, &doc! { "$contains": { tags: "weak" } }).unwrap());
        assert!(!matches(&doc, &doc! { "$contains": { tags: "none" } }).unwrap());
        assert!(!matches(&doc, &doc! { "$contains": { missing: "weak" } }).unwrap());
    }

    #[test]
    fn test_contains_on_non_array_is_error() {
        let err = matches(&relation(), &doc! { "$contains": { kind: "n" } }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_or_with_nesting() {
        let doc = relation();
        let query = doc! {
            "$or": [
                { kind: "strong" },
                { "$or": [{ score: 1 }, { "rel.parent": 3 }] }
            ]
        };
        assert!(matches(&doc, &query).unwrap());
        assert!(!matches(&doc, &doc! { "$or": [{ kind: "strong" }, { score: 1 }] }).unwrap());
    }

    #[test]
    fn test_and_not_in_nin_regex() {
        let doc = relation();
        assert!(matches(&doc, &doc! { "$and": [{ kind: "normal" }, { score: 12 }] }).unwrap());
        assert!(matches(&doc, &doc! { "$not": { kind: "strong" } }).unwrap());
        assert!(matches(&doc, &doc! { "$in": { score: [1, 12] } }).unwrap());
        assert!(matches(&doc, &doc! { "$nin": { score: [1, 2] } }).unwrap());
        assert!(matches(&doc, &doc! { "$regex": { kind: "^no.*l$" } }).unwrap());
    }

    #[test]
    fn test_malformed_queries() {
        let bad_queries = vec![
            doc! { "$unknown": { a: 1 } },
            doc! { "$gt": 5 },
            doc! { "$or": { kind: "normal" } },
            doc! { "$or": [1, 2] },
            doc! { "$like": { kind: 5 } },
            doc! { "$has": 5 },
            doc! { "$in": { score: 12 } },
            doc! { "$regex": { kind: "(" } },
            doc! { "a..b": 1 },
        ];
        for query in bad_queries {
            let err = compile(&query).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidQuery, "query {}", query);
        }
    }

    #[test]
    fn test_matching_is_deterministic_and_pure() {
        let doc = relation();
        let snapshot = doc.clone();
        let query = doc! { "$or": [{ kind: "weak" }, { "$contains": { tags: "strong" } }] };
        let first = matches(&doc, &query).unwrap();
        let second = matches(&doc, &query).unwrap();
        assert_eq!(first, second);
        assert_eq!(doc, snapshot);
    }
}
