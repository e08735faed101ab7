//! Folds remove/add pairs into `move` and redundant adds into `copy`.
//!
//! Entries stay in one vector; fused entries are marked consumed instead of
//! being removed so indices stay stable while scanning. A rewrite is only
//! made when no live entry between the two halves can observe or disturb the
//! locations involved, which keeps the rewritten sequence equivalent to the
//! original one.

use serde_json::Value;
use tracing::debug;

use super::{DiffEntry, Location};
use crate::{value_hash, values_equal, DiffFlags, HashCode};

pub(super) fn normalize<'a>(
    entries: Vec<DiffEntry<'a>>,
    source: &'a Value,
    target: &'a Value,
    flags: &DiffFlags,
) -> Vec<DiffEntry<'a>> {
    let mut arena = Arena::new(entries);
    let moves = if flags.moves_enabled() { arena.introduce_moves() } else { 0 };
    let copies = if flags.copies_enabled() { arena.introduce_copies(source, target) } else { 0 };
    if moves + copies > 0 {
        debug!(moves, copies, "normalized diff entries");
    }
    arena.into_entries()
}

struct Arena<'a> {
    entries: Vec<DiffEntry<'a>>,
    consumed: Vec<bool>,
}

impl<'a> Arena<'a> {
    fn new(entries: Vec<DiffEntry<'a>>) -> Self {
        let consumed = vec![false; entries.len()];
        Self { entries, consumed }
    }

    fn into_entries(self) -> Vec<DiffEntry<'a>> {
        self.entries
            .into_iter()
            .zip(self.consumed)
            .filter_map(|(entry, consumed)| (!consumed).then_some(entry))
            .collect()
    }

    fn live(&self, range: std::ops::Range<usize>) -> impl Iterator<Item = &DiffEntry<'a>> + '_ {
        range.filter(|&k| !self.consumed[k]).map(|k| &self.entries[k])
    }

    fn introduce_moves(&mut self) -> usize {
        let hashes: Vec<Option<HashCode>> = self
            .entries
            .iter()
            .map(|entry| match entry {
                DiffEntry::Add { value, .. } => Some(value_hash(value)),
                DiffEntry::Remove { old, .. } => Some(value_hash(old)),
                _ => None,
            })
            .collect();

        let mut count = 0;
        for add in 0..self.entries.len() {
            if self.consumed[add] {
                continue;
            }
            let DiffEntry::Add { value, .. } = self.entries[add] else {
                continue;
            };
            let candidate = (0..self.entries.len()).find(|&remove| {
                !self.consumed[remove]
                    && hashes[remove] == hashes[add]
                    && matches!(self.entries[remove], DiffEntry::Remove { old, .. } if values_equal(old, value))
                    && self.can_move(remove, add)
            });
            if let Some(remove) = candidate {
                self.fuse_move(remove, add);
                count += 1;
            }
        }
        count
    }

    /// Checks that `remove` followed (or preceded) by `add` can become one
    /// move placed at the later of the two slots.
    fn can_move(&self, remove: usize, add: usize) -> bool {
        let from = self.entries[remove].path();
        let to = self.entries[add].path();
        if remove < add {
            // the moved value is read at `add` time, so nothing in between
            // may touch its old location
            !from.pointer.is_ancestor_of(&to.pointer)
                && self.live(remove + 1..add).all(|entry| !entry.touches(from))
        } else {
            // the value is inserted at `remove` time, so nothing in between
            // may depend on it being there already
            !from.conflicts_with(to) && self.live(add + 1..remove).all(|entry| !entry.touches(to))
        }
    }

    fn fuse_move(&mut self, remove: usize, add: usize) {
        let (DiffEntry::Remove { path: from, old }, DiffEntry::Add { path, .. }) =
            (&self.entries[remove], &self.entries[add])
        else {
            return;
        };
        let fused = DiffEntry::Move { from: from.clone(), path: path.clone(), value: *old };
        let (keep, drop) = if remove < add { (add, remove) } else { (remove, add) };
        self.entries[keep] = fused;
        self.consumed[drop] = true;
    }

    fn introduce_copies(&mut self, source: &'a Value, target: &'a Value) -> usize {
        let mut unchanged = Vec::new();
        collect_unchanged(source, target, Location::root(), &mut unchanged);
        let unchanged: Vec<(Location, &Value, HashCode)> = unchanged
            .into_iter()
            .map(|(location, value)| (location, value, value_hash(value)))
            .collect();

        let mut count = 0;
        for add in 0..self.entries.len() {
            if self.consumed[add] {
                continue;
            }
            let DiffEntry::Add { path, value } = &self.entries[add] else {
                continue;
            };
            let hash = value_hash(value);
            let from = self
                .copy_from_later_removal(add, path, value)
                .or_else(|| self.copy_from_unchanged(add, value, hash, &unchanged));
            if let Some(from) = from {
                let path = path.clone();
                self.entries[add] = DiffEntry::Copy { from, path };
                count += 1;
            }
        }
        count
    }

    /// A value removed (or moved away) later in the patch still sits at its
    /// old location when `add` runs.
    fn copy_from_later_removal(
        &self,
        add: usize,
        path: &Location,
        value: &Value,
    ) -> Option<Location> {
        (add + 1..self.entries.len())
            .filter(|&k| !self.consumed[k])
            .find_map(|k| {
                let (location, old) = match &self.entries[k] {
                    DiffEntry::Remove { path: at, old } => (at, *old),
                    DiffEntry::Move { from, value: moved, .. } => (from, *moved),
                    _ => return None,
                };
                let usable = values_equal(old, value)
                    && !path.conflicts_with(location)
                    && self.live(add + 1..k).all(|entry| !entry.touches(location));
                usable.then(|| location.clone())
            })
    }

    fn copy_from_unchanged(
        &self,
        add: usize,
        value: &Value,
        hash: HashCode,
        unchanged: &[(Location, &Value, HashCode)],
    ) -> Option<Location> {
        unchanged
            .iter()
            .find(|(location, candidate, candidate_hash)| {
                *candidate_hash == hash
                    && values_equal(candidate, value)
                    && self.live(0..add).all(|entry| !entry.touches(location))
            })
            .map(|(location, _, _)| location.clone())
    }
}

/// Records the largest subtrees that are identical in both documents at the
/// same location.
fn collect_unchanged<'a>(
    source: &'a Value,
    target: &Value,
    at: Location,
    out: &mut Vec<(Location, &'a Value)>,
) {
    if values_equal(source, target) {
        out.push((at, source));
        return;
    }
    match (source, target) {
        (Value::Object(left), Value::Object(right)) => {
            for (key, value) in left {
                if let Some(other) = right.get(key) {
                    collect_unchanged(value, other, Location::key(&at.pointer, key), out);
                }
            }
        }
        (Value::Array(left), Value::Array(right)) => {
            for (index, (value, other)) in left.iter().zip(right).enumerate() {
                collect_unchanged(value, other, Location::index(&at.pointer, index), out);
            }
        }
        _ => {}
    }
}
