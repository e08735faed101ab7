//! RFC 6902 operations and patch documents.
//!
//! Operations serialize with members in the order `op`, `from`, `fromValue`,
//! `path`, `value`, which matches what other JSON Patch producers emit.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{DecodeError, ErrorKind, Pointer};

/// The six RFC 6902 operation kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Insert a value.
    Add,
    /// Delete a value.
    Remove,
    /// Overwrite an existing value.
    Replace,
    /// Relocate a value.
    Move,
    /// Duplicate a value.
    Copy,
    /// Assert a value.
    Test,
}

impl OpKind {
    /// The wire name of the operation.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
            Self::Move => "move",
            Self::Copy => "copy",
            Self::Test => "test",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "add" => Self::Add,
            "remove" => Self::Remove,
            "replace" => Self::Replace,
            "move" => Self::Move,
            "copy" => Self::Copy,
            "test" => Self::Test,
            _ => return None,
        })
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single patch operation.
///
/// ```
/// # use jpatch_core::{Operation, Pointer};
/// use serde_json::json;
/// let op = Operation::add("/authorities/2".parse::<Pointer>()?, json!("AUTHOR"));
/// assert_eq!(
///     serde_json::to_string(&op).unwrap(),
///     r#"{"op":"add","path":"/authorities/2","value":"AUTHOR"}"#
/// );
/// # Ok::<(), jpatch_core::ErrorKind>(())
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Operation {
    /// Operation kind.
    pub op: OpKind,
    /// Source location for `move` and `copy`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Pointer>,
    /// Previous value of a `replace`, when requested.
    #[serde(rename = "fromValue", skip_serializing_if = "Option::is_none")]
    pub from_value: Option<Value>,
    /// Target location.
    pub path: Pointer,
    /// Operand for `add`, `replace`, and `test`; optionally the removed value
    /// for `remove`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Operation {
    fn new(op: OpKind, path: Pointer) -> Self {
        Self { op, from: None, from_value: None, path, value: None }
    }

    /// Builds an `add` operation.
    #[must_use]
    pub fn add(path: Pointer, value: Value) -> Self {
        Self::new(OpKind::Add, path).with_value(value)
    }

    /// Builds a `remove` operation without a value.
    #[must_use]
    pub fn remove(path: Pointer) -> Self {
        Self::new(OpKind::Remove, path)
    }

    /// Builds a `replace` operation.
    #[must_use]
    pub fn replace(path: Pointer, value: Value) -> Self {
        Self::new(OpKind::Replace, path).with_value(value)
    }

    /// Builds a `move` operation.
    #[must_use]
    pub fn move_from(from: Pointer, path: Pointer) -> Self {
        Self { from: Some(from), ..Self::new(OpKind::Move, path) }
    }

    /// Builds a `copy` operation.
    #[must_use]
    pub fn copy_from(from: Pointer, path: Pointer) -> Self {
        Self { from: Some(from), ..Self::new(OpKind::Copy, path) }
    }

    /// Builds a `test` operation.
    #[must_use]
    pub fn test(path: Pointer, value: Value) -> Self {
        Self::new(OpKind::Test, path).with_value(value)
    }

    /// Sets the `value` member.
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets the `fromValue` extension member.
    #[must_use]
    pub fn with_from_value(mut self, value: Value) -> Self {
        self.from_value = Some(value);
        self
    }

    /// Decodes one operation object, enforcing the per-kind member rules.
    ///
    /// ```
    /// # use jpatch_core::{ErrorKind, Operation};
    /// use serde_json::json;
    /// let err = Operation::from_json_value(&json!({"op": "frobnicate", "path": "/a"})).unwrap_err();
    /// assert!(matches!(err, ErrorKind::UnsupportedOperation { .. }));
    /// ```
    pub fn from_json_value(value: &Value) -> Result<Self, ErrorKind> {
        let Value::Object(map) = value else {
            return Err(invalid("operation must be a JSON object"));
        };
        let op = match map.get("op") {
            Some(Value::String(name)) => OpKind::from_name(name)
                .ok_or_else(|| ErrorKind::UnsupportedOperation { op: name.clone() })?,
            Some(other) => return Err(ErrorKind::UnsupportedOperation { op: other.to_string() }),
            None => return Err(invalid("missing member \"op\"")),
        };
        let path = pointer_member(map, "path")?
            .ok_or_else(|| invalid(format!("{op} operation requires \"path\"")))?;
        let mut operation = Self::new(op, path);
        match op {
            OpKind::Add | OpKind::Replace | OpKind::Test => {
                let value = map
                    .get("value")
                    .ok_or_else(|| invalid(format!("{op} operation requires \"value\"")))?;
                operation.value = Some(value.clone());
                if op == OpKind::Replace {
                    operation.from_value = map.get("fromValue").cloned();
                }
            }
            OpKind::Remove => {
                operation.value = map.get("value").cloned();
            }
            OpKind::Move | OpKind::Copy => {
                let from = pointer_member(map, "from")?
                    .ok_or_else(|| invalid(format!("{op} operation requires \"from\"")))?;
                operation.from = Some(from);
            }
        }
        Ok(operation)
    }
}

impl TryFrom<Value> for Operation {
    type Error = ErrorKind;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json_value(&value)
    }
}

fn pointer_member(map: &Map<String, Value>, name: &str) -> Result<Option<Pointer>, ErrorKind> {
    match map.get(name) {
        None => Ok(None),
        Some(Value::String(text)) => Pointer::parse(text).map(Some),
        Some(_) => Err(invalid(format!("member {name:?} must be a pointer string"))),
    }
}

fn invalid(reason: impl Into<String>) -> ErrorKind {
    ErrorKind::InvalidOperation { reason: reason.into() }
}

/// An ordered sequence of operations, serialized as a JSON array.
///
/// ```
/// # use jpatch_core::PatchDocument;
/// use serde_json::json;
/// let patch = PatchDocument::from_json_str(r#"[{"op":"replace","path":"/a","value":2}]"#)?;
/// assert_eq!(patch.len(), 1);
/// assert_eq!(patch.apply(&json!({"a": 1})).unwrap(), json!({"a": 2}));
/// # Ok::<(), jpatch_core::DecodeError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchDocument {
    operations: Vec<Operation>,
}

impl PatchDocument {
    /// An empty patch.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Indicates whether the patch has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Iterates the operations in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Returns the operations as a slice.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Decodes a patch from JSON text.
    pub fn from_json_str(input: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json_value(&value)
    }

    /// Decodes a patch from an already parsed JSON value.
    pub fn from_json_value(value: &Value) -> Result<Self, DecodeError> {
        let Value::Array(items) = value else {
            return Err(DecodeError::NotAnArray);
        };
        let mut operations = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let operation = Operation::from_json_value(item)
                .map_err(|kind| DecodeError::Operation { index, kind })?;
            operations.push(operation);
        }
        Ok(Self { operations })
    }

    /// Converts the patch into its JSON array form.
    pub fn to_json_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Serializes the patch as compact JSON text.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Applies the patch to `source`; see [`apply`](crate::apply).
    pub fn apply(&self, source: &Value) -> Result<Value, crate::ApplyError> {
        crate::apply(self, source)
    }
}

impl From<Vec<Operation>> for PatchDocument {
    fn from(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

impl IntoIterator for PatchDocument {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl<'a> IntoIterator for &'a PatchDocument {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
