//! RFC 6902 patch application.
//!
//! Operations run in order against a private copy of the source document. The
//! first failure aborts the whole patch and reports the operation index; the
//! caller's document is never touched.

use serde_json::Value;
use tracing::{debug, trace};

use crate::pointer::{self, APPEND_TOKEN};
use crate::{values_equal, ApplyError, DecodeError, ErrorKind, OpKind, Operation, PatchDocument, Pointer};

/// Applies `patch` to `source`, returning the patched document.
///
/// ```
/// use jpatch_core::{apply, diff};
/// use serde_json::json;
/// let source = json!({"a": [1, 2, 3]});
/// let target = json!({"a": [3, 1], "b": true});
/// let patched = apply(&diff(&source, &target), &source)?;
/// assert_eq!(patched, target);
/// # Ok::<(), jpatch_core::ApplyError>(())
/// ```
pub fn apply(patch: &PatchDocument, source: &Value) -> Result<Value, ApplyError> {
    let mut document = source.clone();
    for (index, operation) in patch.iter().enumerate() {
        trace!(index, op = %operation.op, path = %operation.path, "applying operation");
        apply_operation(&mut document, operation).map_err(|kind| {
            debug!(index, error = %kind, "patch application failed");
            ApplyError::new(index, kind)
        })?;
    }
    Ok(document)
}

/// Decodes `patch` from its JSON form and applies it to `source`.
///
/// Decoding problems are reported like application failures: a malformed
/// operation carries its own index, a malformed document index 0.
///
/// ```
/// use jpatch_core::{apply_json, ErrorKind};
/// use serde_json::json;
/// let patch = json!([{"op": "add", "path": "/b", "value": 2}, {"op": "nope", "path": "/b"}]);
/// let err = apply_json(&patch, &json!({})).unwrap_err();
/// assert_eq!(err.index(), 1);
/// assert!(matches!(err.kind(), ErrorKind::UnsupportedOperation { .. }));
/// ```
pub fn apply_json(patch: &Value, source: &Value) -> Result<Value, ApplyError> {
    let patch = PatchDocument::from_json_value(patch).map_err(|err| match err {
        DecodeError::Operation { index, kind } => ApplyError::new(index, kind),
        other => ApplyError::new(0, ErrorKind::InvalidOperation { reason: other.to_string() }),
    })?;
    apply(&patch, source)
}

fn apply_operation(document: &mut Value, operation: &Operation) -> Result<(), ErrorKind> {
    let path = &operation.path;
    match operation.op {
        OpKind::Add => add(document, path, required_value(operation)?.clone()),
        OpKind::Remove => remove(document, path).map(drop),
        OpKind::Replace => replace(document, path, required_value(operation)?.clone()),
        OpKind::Move => move_value(document, required_from(operation)?, path),
        OpKind::Copy => {
            let value = get(document, required_from(operation)?)?.clone();
            add(document, path, value)
        }
        OpKind::Test => test(document, path, required_value(operation)?),
    }
}

fn required_value(operation: &Operation) -> Result<&Value, ErrorKind> {
    operation.value.as_ref().ok_or_else(|| ErrorKind::InvalidOperation {
        reason: format!("{} operation requires \"value\"", operation.op),
    })
}

fn required_from(operation: &Operation) -> Result<&Pointer, ErrorKind> {
    operation.from.as_ref().ok_or_else(|| ErrorKind::InvalidOperation {
        reason: format!("{} operation requires \"from\"", operation.op),
    })
}

fn add(document: &mut Value, path: &Pointer, value: Value) -> Result<(), ErrorKind> {
    let Some((last, parent)) = path.tokens().split_last() else {
        *document = value;
        return Ok(());
    };
    match resolve_mut(document, parent)? {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = if last == APPEND_TOKEN {
                items.len()
            } else {
                pointer::parse_index(last).ok_or_else(|| mismatch(path.tokens(), "array index"))?
            };
            if index > items.len() {
                return Err(ErrorKind::InvalidPath {
                    path: path.to_string(),
                    reason: "array index out of bounds",
                });
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(mismatch(path.tokens(), "object or array")),
    }
}

fn remove(document: &mut Value, path: &Pointer) -> Result<Value, ErrorKind> {
    let Some((last, parent)) = path.tokens().split_last() else {
        return Err(ErrorKind::InvalidPath {
            path: String::new(),
            reason: "the document root cannot be removed",
        });
    };
    match resolve_mut(document, parent)? {
        Value::Object(map) => map.shift_remove(last).ok_or_else(|| not_found(path.tokens())),
        Value::Array(items) => {
            let index = array_index(last, path.tokens())?;
            if index < items.len() {
                Ok(items.remove(index))
            } else {
                Err(not_found(path.tokens()))
            }
        }
        _ => Err(mismatch(path.tokens(), "object or array")),
    }
}

fn replace(document: &mut Value, path: &Pointer, value: Value) -> Result<(), ErrorKind> {
    *resolve_mut(document, path.tokens())? = value;
    Ok(())
}

fn move_value(document: &mut Value, from: &Pointer, path: &Pointer) -> Result<(), ErrorKind> {
    get(document, from)?;
    if from == path {
        return Ok(());
    }
    if from.is_ancestor_of(path) {
        return Err(ErrorKind::InvalidPath {
            path: path.to_string(),
            reason: "a value cannot be moved into one of its children",
        });
    }
    let value = remove(document, from)?;
    add(document, path, value)
}

fn test(document: &Value, path: &Pointer, expected: &Value) -> Result<(), ErrorKind> {
    let found = get(document, path)?;
    if values_equal(found, expected) {
        Ok(())
    } else {
        Err(ErrorKind::TestFailed {
            path: path.to_string(),
            expected: expected.clone(),
            found: found.clone(),
        })
    }
}

fn get<'v>(document: &'v Value, path: &Pointer) -> Result<&'v Value, ErrorKind> {
    let tokens = path.tokens();
    let mut current = document;
    for depth in 0..tokens.len() {
        let walked = &tokens[..=depth];
        current = match current {
            Value::Object(map) => map.get(&tokens[depth]).ok_or_else(|| not_found(walked))?,
            Value::Array(items) => {
                let index = array_index(&tokens[depth], walked)?;
                items.get(index).ok_or_else(|| not_found(walked))?
            }
            _ => return Err(mismatch(walked, "object or array")),
        };
    }
    Ok(current)
}

fn resolve_mut<'v>(document: &'v mut Value, tokens: &[String]) -> Result<&'v mut Value, ErrorKind> {
    let mut current = document;
    for depth in 0..tokens.len() {
        let walked = &tokens[..=depth];
        current = match current {
            Value::Object(map) => map.get_mut(&tokens[depth]).ok_or_else(|| not_found(walked))?,
            Value::Array(items) => {
                let index = array_index(&tokens[depth], walked)?;
                items.get_mut(index).ok_or_else(|| not_found(walked))?
            }
            _ => return Err(mismatch(walked, "object or array")),
        };
    }
    Ok(current)
}

/// Index of an existing element; `-` never names one.
fn array_index(token: &str, walked: &[String]) -> Result<usize, ErrorKind> {
    if token == APPEND_TOKEN {
        return Err(not_found(walked));
    }
    pointer::parse_index(token).ok_or_else(|| mismatch(walked, "array index"))
}

fn not_found(walked: &[String]) -> ErrorKind {
    ErrorKind::PathNotFound { path: pointer::encode(walked) }
}

fn mismatch(walked: &[String], expected: &'static str) -> ErrorKind {
    ErrorKind::TypeMismatch { path: pointer::encode(walked), expected }
}
