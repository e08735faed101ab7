//! JSON diff and JSON Patch (RFC 6902) engine.
//!
//! [`diff`] computes a [`PatchDocument`] that turns one JSON document into
//! another, and [`apply`] replays such a patch. Arrays are diffed around their
//! longest common subsequence, remove/add pairs of the same value are folded
//! into `move`, and additions of values already present become `copy`.
//! [`DiffFlags`] control which of those rewrites happen and which optional
//! members the operations carry.
//!
//! ```
//! use jpatch_core::{apply, diff_with_flags, values_equal, DiffFlag, DiffFlags};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = json!({"name": "jpatch", "tags": ["a", "b"], "version": 1});
//!     let target = json!({"name": "jpatch", "tags": ["b", "a"], "release": 1});
//!
//!     let flags = DiffFlags::defaults().with(DiffFlag::EmitTestOperations);
//!     let patch = diff_with_flags(&source, &target, &flags);
//!     assert!(!patch.is_empty());
//!
//!     let patched = apply(&patch, &source)?;
//!     assert!(values_equal(&patched, &target));
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod apply;
mod diff;
mod equal;
mod error;
mod flags;
mod operation;
pub mod pointer;

pub use apply::{apply, apply_json};
pub use diff::{diff, diff_with_flags};
pub use equal::{numbers_equal, value_hash, values_equal, HashCode};
pub use error::{ApplyError, DecodeError, ErrorKind, FlagError};
pub use flags::{DiffFlag, DiffFlags};
pub use operation::{OpKind, Operation, PatchDocument};
pub use pointer::Pointer;

/// Returns the semantic version of the `jpatch-core` crate.
///
/// ```
/// assert!(!jpatch_core::version().is_empty());
/// ```
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
