use crate::{
    collection::Document,
    common::*,
    errors::{ErrorKind, QuillError, QuillResult},
};

/// A single modifier of an update document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Inc,
    Push,
    Set,
    Unset,
}

impl Modifier {
    fn parse(name: &str) -> QuillResult<Modifier> {
        match name {
            MOD_INC => Ok(Modifier::Inc),
            MOD_PUSH => Ok(Modifier::Push),
            MOD_SET => Ok(Modifier::Set),
            MOD_UNSET => Ok(Modifier::Unset),
            unknown => Err(invalid_update(&format!("Unknown update modifier '{}'", unknown))),
        }
    }
}

/// How an update document changes a target document.
///
/// Built by [UpdatePlan::parse], which checks the whole update up front so
/// that applying a plan can only fail because of the target's current
/// values.
#[derive(Debug, Clone)]
pub enum UpdatePlan {
    /// The update becomes the new field set; the target keeps its `_id`.
    Replace(Document),
    /// Modifiers applied in the order they appear in the update.
    Modify(Vec<(Modifier, Document)>),
}

impl UpdatePlan {
    /// Detects the mode of `update` and validates it.
    ///
    /// An update is in modifier mode when any top level key starts with `$`.
    ///
    /// # Errors
    ///
    /// `InvalidUpdate` when modifier keys and plain keys are mixed, for an
    /// unknown modifier, a modifier payload that is not a document, a field
    /// name that is not a legal top level name, an attempt to touch `_id`
    /// through a modifier, an `Unknown` value, or a non-numeric `$inc` delta.
    pub fn parse(update: &Document) -> QuillResult<UpdatePlan> {
        let modifier_keys = update
            .keys()
            .filter(|key| key.starts_with(OPERATOR_PREFIX))
            .count();

        if modifier_keys == 0 {
            if let Err(e) = validate_fields(update) {
                return Err(QuillError::new_with_cause(
                    "Replacement document is not a valid document",
                    ErrorKind::InvalidUpdate,
                    e,
                ));
            }
            return Ok(UpdatePlan::Replace(update.clone()));
        }

        if modifier_keys != update.size() {
            return Err(invalid_update(
                "Update mixes modifiers with plain fields",
            ));
        }

        let mut modifiers = Vec::with_capacity(update.size());
        for (name, payload) in update.iter() {
            let modifier = Modifier::parse(name)?;
            let fields = match payload {
                Value::Document(fields) => fields,
                other => {
                    return Err(invalid_update(&format!(
                        "Modifier '{}' expects a {{field: value}} document, found {}",
                        name,
                        other.type_name()
                    )))
                }
            };

            for (field, value) in fields.iter() {
                validate_modifier_field(name, field)?;
                if modifier == Modifier::Unset {
                    continue;
                }
                if let Err(e) = validate_value(value) {
                    return Err(QuillError::new_with_cause(
                        &format!("Modifier '{}' has an invalid value for '{}'", name, field),
                        ErrorKind::InvalidUpdate,
                        e,
                    ));
                }
                if modifier == Modifier::Inc && !value.is_number() {
                    return Err(invalid_update(&format!(
                        "Modifier '{}' needs a numeric delta for '{}', found {}",
                        name,
                        field,
                        value.type_name()
                    )));
                }
            }
            modifiers.push((modifier, fields.clone()));
        }
        Ok(UpdatePlan::Modify(modifiers))
    }

    /// Applies the plan to `target` and returns the new document.
    ///
    /// `target` is never mutated.
    pub fn apply(&self, target: &Document) -> QuillResult<Document> {
        match self {
            UpdatePlan::Replace(replacement) => replace(target, replacement),
            UpdatePlan::Modify(modifiers) => {
                let mut result = target.clone();
                for (modifier, fields) in modifiers {
                    for (field, value) in fields.iter() {
                        apply_modifier(&mut result, *modifier, field, value)?;
                    }
                }
                Ok(result)
            }
        }
    }
}

/// Produces new documents from update documents.
///
/// Updates are either replacement documents or modifier documents using
/// `$inc`, `$push`, `$set` and `$unset`. The engine never mutates its input;
/// every call returns a fresh document.
///
/// # Examples
///
/// ```rust,ignore
/// use quilldb::doc;
/// use quilldb::update::ModifierEngine;
///
/// let target = doc! { "_id": "a", n: 1 };
/// let updated = ModifierEngine::apply(&target, &doc! { "$inc": { n: 2 } })?;
/// assert_eq!(updated, doc! { "_id": "a", n: 3 });
/// ```
pub struct ModifierEngine;

impl ModifierEngine {
    pub fn apply(target: &Document, update: &Document) -> QuillResult<Document> {
        UpdatePlan::parse(update)?.apply(target)
    }
}

fn replace(target: &Document, replacement: &Document) -> QuillResult<Document> {
    let target_id = target.get(DOC_ID);
    if let Some(id) = replacement.get(DOC_ID) {
        if target_id != Some(id) {
            return Err(invalid_update(&format!(
                "Replacement cannot change _id from {} to {}",
                target_id.unwrap_or(&Value::Unknown),
                id
            )));
        }
    }

    let mut result = Document::new();
    if let Some(id) = target_id {
        result.put(DOC_ID, id.clone());
    }
    for (field, value) in replacement.iter() {
        if field != DOC_ID {
            result.put(field.as_str(), value.clone());
        }
    }
    Ok(result)
}

fn apply_modifier(
    document: &mut Document,
    modifier: Modifier,
    field: &str,
    value: &Value,
) -> QuillResult<()> {
    match modifier {
        Modifier::Set => {
            document.put(field, value.clone());
        }
        Modifier::Unset => {
            document.remove(field);
        }
        Modifier::Inc => {
            let current = document.entry(field, || Value::I64(0));
            let sum = add(current, value).ok_or_else(|| {
                invalid_update(&format!(
                    "Cannot apply {} to field '{}' holding {}",
                    MOD_INC,
                    field,
                    current.type_name()
                ))
            })?;
            *current = sum;
        }
        Modifier::Push => {
            let current = document.entry(field, || Value::Array(Vec::new()));
            match current {
                Value::Array(values) => values.push(value.clone()),
                other => {
                    return Err(invalid_update(&format!(
                        "Cannot apply {} to field '{}' holding {}",
                        MOD_PUSH,
                        field,
                        other.type_name()
                    )))
                }
            }
        }
    }
    Ok(())
}

/// Numeric addition; integer overflow falls back to floating point.
fn add(current: &Value, delta: &Value) -> Option<Value> {
    match (current, delta) {
        (Value::I64(a), Value::I64(b)) => Some(
            a.checked_add(*b)
                .map(Value::I64)
                .unwrap_or_else(|| Value::F64(*a as f64 + *b as f64)),
        ),
        (a, b) if a.is_number() && b.is_number() => {
            Some(Value::F64(a.as_f64()? + b.as_f64()?))
        }
        _ => None,
    }
}

fn validate_modifier_field(modifier: &str, field: &str) -> QuillResult<()> {
    if field == DOC_ID {
        return Err(invalid_update(&format!(
            "Modifier '{}' cannot change _id",
            modifier
        )));
    }
    if !is_legal_field_name(field) {
        return Err(invalid_update(&format!(
            "Modifier '{}' targets illegal field name '{}'",
            modifier, field
        )));
    }
    Ok(())
}

fn invalid_update(message: &str) -> QuillError {
    log::error!("{}", message);
    QuillError::new(message, ErrorKind::InvalidUpdate)
}
