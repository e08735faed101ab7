use serde_json::{Map, Value};

use super::{diff_impl, DiffEntry, Location};
use crate::Pointer;

/// Diffs two objects: removals and nested changes in source key order, then
/// additions in target key order.
pub(super) fn diff_objects<'a>(
    source: &'a Map<String, Value>,
    target: &'a Map<String, Value>,
    path: &Pointer,
) -> Vec<DiffEntry<'a>> {
    let mut entries = Vec::new();

    for (key, value) in source {
        let at = Location::key(path, key);
        match target.get(key) {
            Some(other) => entries.extend(diff_impl(value, other, &at)),
            None => entries.push(DiffEntry::Remove { path: at, old: value }),
        }
    }

    for (key, value) in target {
        if source.contains_key(key) {
            continue;
        }
        entries.push(DiffEntry::Add { path: Location::key(path, key), value });
    }

    entries
}
