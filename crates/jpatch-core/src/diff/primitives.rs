use serde_json::Value;

use super::{DiffEntry, Location};

/// Produces a replacement for values that cannot be diffed structurally:
/// differing scalars, or a container facing a value of another kind.
pub(super) fn diff_primitives<'a>(
    source: &'a Value,
    target: &'a Value,
    at: &Location,
) -> Vec<DiffEntry<'a>> {
    vec![DiffEntry::Replace { path: at.clone(), old: source, value: target }]
}
