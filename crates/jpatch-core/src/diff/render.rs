use super::DiffEntry;
use crate::{DiffFlag, DiffFlags, Operation, PatchDocument, Pointer};

/// Turns normalized entries into wire operations, honoring the output flags.
pub(super) fn render(entries: &[DiffEntry<'_>], flags: &DiffFlags) -> PatchDocument {
    let renderer = Renderer {
        omit_removed_value: flags.contains(DiffFlag::OmitValueOnRemove),
        original_on_replace: flags.contains(DiffFlag::AddOriginalValueOnReplace),
        split_replace: flags.contains(DiffFlag::AddExplicitRemoveAddOnReplace),
        emit_tests: flags.contains(DiffFlag::EmitTestOperations),
    };
    let mut operations = Vec::with_capacity(entries.len());
    for entry in entries {
        renderer.render_entry(entry, &mut operations);
    }
    PatchDocument::from(operations)
}

struct Renderer {
    omit_removed_value: bool,
    original_on_replace: bool,
    split_replace: bool,
    emit_tests: bool,
}

impl Renderer {
    fn render_entry(&self, entry: &DiffEntry<'_>, out: &mut Vec<Operation>) {
        match entry {
            DiffEntry::Add { path, value } => {
                out.push(Operation::add(path.pointer.clone(), (*value).clone()));
            }
            DiffEntry::Remove { path, old } => {
                let path = &path.pointer;
                if self.emit_tests {
                    out.push(Operation::test(path.clone(), (*old).clone()));
                }
                out.push(self.remove(path, old));
            }
            DiffEntry::Replace { path, old, value } => {
                let path = &path.pointer;
                if self.emit_tests {
                    out.push(Operation::test(path.clone(), (*old).clone()));
                }
                // the root cannot be removed, so it is always replaced in place
                if self.split_replace && !path.is_root() {
                    out.push(self.remove(path, old));
                    out.push(Operation::add(path.clone(), (*value).clone()));
                } else {
                    let mut replace = Operation::replace(path.clone(), (*value).clone());
                    if self.original_on_replace {
                        replace = replace.with_from_value((*old).clone());
                    }
                    out.push(replace);
                }
            }
            DiffEntry::Move { from, path, value } => {
                if self.emit_tests {
                    out.push(Operation::test(from.pointer.clone(), (*value).clone()));
                }
                out.push(Operation::move_from(from.pointer.clone(), path.pointer.clone()));
            }
            DiffEntry::Copy { from, path } => {
                out.push(Operation::copy_from(from.pointer.clone(), path.pointer.clone()));
            }
        }
    }

    fn remove(&self, path: &Pointer, old: &serde_json::Value) -> Operation {
        let remove = Operation::remove(path.clone());
        if self.omit_removed_value {
            remove
        } else {
            remove.with_value(old.clone())
        }
    }
}
