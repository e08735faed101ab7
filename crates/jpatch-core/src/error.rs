use serde_json::Value;
use thiserror::Error;

/// Reasons a pointer, an operation, or a whole patch can be rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// The pointer string is not a valid RFC 6901 pointer.
    #[error("malformed pointer {pointer:?}: {reason}")]
    MalformedPointer {
        /// The offending pointer text.
        pointer: String,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// A location that must exist does not.
    #[error("path not found: {path:?}")]
    PathNotFound {
        /// Encoded pointer of the missing location.
        path: String,
    },
    /// The target location cannot be written, e.g. an out of bounds insertion.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// Encoded pointer of the rejected location.
        path: String,
        /// Why the location was rejected.
        reason: &'static str,
    },
    /// A pointer token does not fit the container it is applied to.
    #[error("type mismatch at {path:?}: expected {expected}")]
    TypeMismatch {
        /// Encoded pointer up to and including the offending token.
        path: String,
        /// The kind of container or token that was expected.
        expected: &'static str,
    },
    /// A `test` operation found a different value.
    #[error("test failed at {path:?}: expected {expected}, found {found}")]
    TestFailed {
        /// Encoded pointer of the tested location.
        path: String,
        /// The value carried by the `test` operation.
        expected: Value,
        /// The value present in the document.
        found: Value,
    },
    /// The `op` member names an operation outside RFC 6902.
    #[error("unsupported operation {op:?}")]
    UnsupportedOperation {
        /// The `op` value as found in the document.
        op: String,
    },
    /// An operation object is missing a required member or has the wrong shape.
    #[error("invalid operation: {reason}")]
    InvalidOperation {
        /// Description of the structural problem.
        reason: String,
    },
}

/// A failed patch application: the error and the index of the operation that
/// raised it.
///
/// ```
/// # use jpatch_core::{apply, ErrorKind, Operation, PatchDocument, Pointer};
/// use serde_json::json;
/// let patch = PatchDocument::from(vec![
///     Operation::add("/a".parse::<Pointer>()?, json!(1)),
///     Operation::remove("/missing".parse::<Pointer>()?),
/// ]);
/// let err = apply(&patch, &json!({})).unwrap_err();
/// assert_eq!(err.index(), 1);
/// assert!(matches!(err.kind(), ErrorKind::PathNotFound { .. }));
/// # Ok::<(), jpatch_core::ErrorKind>(())
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("operation {index} failed: {kind}")]
pub struct ApplyError {
    index: usize,
    kind: ErrorKind,
}

impl ApplyError {
    pub(crate) fn new(index: usize, kind: ErrorKind) -> Self {
        Self { index, kind }
    }

    /// Position of the failing operation within the patch document.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The reason the operation failed.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Consumes the error, returning the reason.
    #[must_use]
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }
}

/// Errors raised while decoding an externally supplied patch document.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The top-level value was not an array of operations.
    #[error("patch document must be a JSON array")]
    NotAnArray,
    /// One operation in the array could not be decoded.
    #[error("operation {index}: {kind}")]
    Operation {
        /// Position of the operation within the array.
        index: usize,
        /// Why it was rejected.
        kind: ErrorKind,
    },
}

/// Raised when parsing a [`DiffFlag`](crate::DiffFlag) from its name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// The name does not correspond to any flag.
    #[error("unknown diff flag: {0}")]
    UnknownFlag(String),
}
