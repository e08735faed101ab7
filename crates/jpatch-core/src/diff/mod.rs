//! Structural diff producing RFC 6902 patches.
//!
//! The differ walks both documents and emits [`DiffEntry`] values (add,
//! remove, replace) that borrow from the inputs. The normalizer then folds
//! remove/add pairs into moves and redundant adds into copies, and the
//! renderer turns the result into a [`PatchDocument`] according to the
//! caller's [`DiffFlags`].
//!
//! Ordering matters: entries are emitted so that applying them one after the
//! other is valid, which is why array removals run from the highest index
//! down and additions from the lowest index up.

mod list;
mod normalize;
mod object;
mod primitives;
mod render;

use serde_json::Value;
use tracing::debug;

use crate::{values_equal, DiffFlags, PatchDocument, Pointer};

/// A location inside the document being diffed.
///
/// `in_array` records whether the last token indexes an array; inserting or
/// removing there shifts the siblings that follow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Location {
    pub(crate) pointer: Pointer,
    pub(crate) in_array: bool,
}

impl Location {
    pub(crate) fn root() -> Self {
        Self { pointer: Pointer::root(), in_array: false }
    }

    pub(crate) fn key(parent: &Pointer, key: &str) -> Self {
        Self { pointer: parent.child(key), in_array: false }
    }

    pub(crate) fn index(parent: &Pointer, index: usize) -> Self {
        Self { pointer: parent.child(index), in_array: true }
    }

    /// Indicates whether an operation at `self` can observe or disturb the
    /// value at `other`: one contains the other, or one is an array slot
    /// whose siblings include an ancestor of the other.
    pub(crate) fn conflicts_with(&self, other: &Self) -> bool {
        let a = self.pointer.tokens();
        let b = other.pointer.tokens();
        is_prefix(a, b) || is_prefix(b, a) || self.shifts(b) || other.shifts(a)
    }

    fn shifts(&self, tokens: &[String]) -> bool {
        match self.pointer.tokens().split_last() {
            Some((_, parent)) if self.in_array => is_prefix(parent, tokens),
            _ => false,
        }
    }
}

fn is_prefix(prefix: &[String], tokens: &[String]) -> bool {
    tokens.len() >= prefix.len() && tokens[..prefix.len()] == *prefix
}

/// Intermediate diff representation. Values borrow from the diffed
/// documents and are only cloned when rendering.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DiffEntry<'a> {
    Add { path: Location, value: &'a Value },
    Remove { path: Location, old: &'a Value },
    Replace { path: Location, old: &'a Value, value: &'a Value },
    Move { from: Location, path: Location, value: &'a Value },
    Copy { from: Location, path: Location },
}

impl<'a> DiffEntry<'a> {
    pub(crate) fn path(&self) -> &Location {
        match self {
            Self::Add { path, .. }
            | Self::Remove { path, .. }
            | Self::Replace { path, .. }
            | Self::Move { path, .. }
            | Self::Copy { path, .. } => path,
        }
    }

    pub(crate) fn from(&self) -> Option<&Location> {
        match self {
            Self::Move { from, .. } | Self::Copy { from, .. } => Some(from),
            _ => None,
        }
    }

    /// Indicates whether applying this entry could change what lives at
    /// `location`, or read it.
    pub(crate) fn touches(&self, location: &Location) -> bool {
        self.path().conflicts_with(location)
            || self.from().is_some_and(|from| from.conflicts_with(location))
    }
}

/// Computes the patch turning `source` into `target` using the default flags.
///
/// ```
/// use serde_json::json;
/// let patch = jpatch_core::diff(&json!({"field": "value"}), &json!({}));
/// assert_eq!(patch.to_json_string()?, r#"[{"op":"remove","path":"/field"}]"#);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[must_use]
pub fn diff(source: &Value, target: &Value) -> PatchDocument {
    diff_with_flags(source, target, &DiffFlags::defaults())
}

/// Computes the patch turning `source` into `target`.
///
/// The result always reproduces `target` when applied to `source`; `flags`
/// only change which operations are used and which members they carry.
///
/// ```
/// use jpatch_core::{diff_with_flags, DiffFlags};
/// use serde_json::json;
/// let source = json!({"age": 10});
/// let target = json!({"height": 10});
///
/// let patch = diff_with_flags(&source, &target, &DiffFlags::defaults());
/// assert_eq!(patch.to_json_string()?, r#"[{"op":"move","from":"/age","path":"/height"}]"#);
///
/// let flags = DiffFlags::dont_normalize_op_into_move_and_copy();
/// let patch = diff_with_flags(&source, &target, &flags);
/// assert_eq!(
///     patch.to_json_string()?,
///     r#"[{"op":"remove","path":"/age"},{"op":"add","path":"/height","value":10}]"#
/// );
/// # Ok::<(), serde_json::Error>(())
/// ```
#[must_use]
pub fn diff_with_flags(source: &Value, target: &Value, flags: &DiffFlags) -> PatchDocument {
    let entries = diff_impl(source, target, &Location::root());
    let raw = entries.len();
    let entries = normalize::normalize(entries, source, target, flags);
    let patch = render::render(&entries, flags);
    debug!(raw_entries = raw, entries = entries.len(), operations = patch.len(), "computed diff");
    patch
}

pub(crate) fn diff_impl<'a>(
    source: &'a Value,
    target: &'a Value,
    at: &Location,
) -> Vec<DiffEntry<'a>> {
    if values_equal(source, target) {
        return Vec::new();
    }

    match (source, target) {
        (Value::Object(left), Value::Object(right)) => {
            object::diff_objects(left, right, &at.pointer)
        }
        (Value::Array(left), Value::Array(right)) => list::diff_lists(left, right, &at.pointer),
        _ => primitives::diff_primitives(source, target, at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiffFlag;
    use proptest::prelude::*;
    use serde_json::json;

    fn loc(text: &str, in_array: bool) -> Location {
        Location { pointer: text.parse().unwrap(), in_array }
    }

    fn render_default(source: &Value, target: &Value) -> String {
        diff(source, target).to_json_string().unwrap()
    }

    #[test]
    fn diff_of_scalars_is_a_root_replace() {
        let source = json!(1);
        let target = json!("one");
        let entries = diff_impl(&source, &target, &Location::root());
        assert_eq!(
            entries,
            vec![DiffEntry::Replace { path: Location::root(), old: &json!(1), value: &json!("one") }]
        );
    }

    #[test]
    fn objects_emit_removals_and_replacements_before_additions() {
        let source = json!({"a": 1, "b": 2, "c": 3});
        let target = json!({"d": 4, "b": 20, "c": 3});
        let entries = diff_impl(&source, &target, &Location::root());
        assert_eq!(
            entries,
            vec![
                DiffEntry::Remove { path: loc("/a", false), old: &json!(1) },
                DiffEntry::Replace { path: loc("/b", false), old: &json!(2), value: &json!(20) },
                DiffEntry::Add { path: loc("/d", false), value: &json!(4) },
            ]
        );
    }

    #[test]
    fn mismatched_kinds_replace_whole_subtree() {
        let source = json!({"a": [1, 2]});
        let target = json!({"a": {"0": 1}});
        assert_eq!(
            render_default(&source, &target),
            r#"[{"op":"replace","path":"/a","value":{"0":1}}]"#
        );
    }

    #[test]
    fn conflicts_cover_ancestors_and_array_siblings() {
        let element = loc("/arr/3", true);
        assert!(element.conflicts_with(&loc("/arr/3/x", false)));
        assert!(element.conflicts_with(&loc("/arr", false)));
        assert!(element.conflicts_with(&loc("/arr/7", true)));
        assert!(element.conflicts_with(&loc("/arr/0/y", false)));
        assert!(!element.conflicts_with(&loc("/other/3", true)));

        let field = loc("/obj/a", false);
        assert!(!field.conflicts_with(&loc("/obj/b", false)));
        assert!(loc("/obj/list/0", true).conflicts_with(&loc("/obj/list/2/name", false)));
    }

    #[test]
    fn remove_value_is_retained_when_flag_cleared() {
        let flags = DiffFlags::defaults().without(DiffFlag::OmitValueOnRemove);
        let patch = diff_with_flags(&json!({"field": "value"}), &json!({}), &flags);
        assert_eq!(
            patch.to_json_string().unwrap(),
            r#"[{"op":"remove","path":"/field","value":"value"}]"#
        );
    }

    #[test]
    fn removed_array_tail_references_last_index_first() {
        let source = json!({"authorities": ["ADMIN", "AUTHOR", "UNMASKER", "OPERATOR"]});
        let target = json!({"authorities": ["ADMIN", "UNMASKER"]});
        assert_eq!(
            render_default(&source, &target),
            r#"[{"op":"remove","path":"/authorities/3"},{"op":"remove","path":"/authorities/1"}]"#
        );
    }

    #[test]
    fn grown_array_adds_in_ascending_order() {
        let source = json!({"authorities": ["ADMIN", "UNMASKER"]});
        let target = json!({"authorities": ["ADMIN", "OPERATOR", "AUTHOR"]});
        assert_eq!(
            render_default(&source, &target),
            concat!(
                r#"[{"op":"replace","path":"/authorities/1","value":"OPERATOR"},"#,
                r#"{"op":"add","path":"/authorities/2","value":"AUTHOR"}]"#
            )
        );
    }

    fn arb_json_value() -> impl Strategy<Value = Value> {
        use proptest::{collection::btree_map, collection::vec, string::string_regex};

        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (-5i64..5).prop_map(|n| json!(n)),
            string_regex("[ab]{0,2}").unwrap().prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 24, 4, move |inner| {
            prop_oneof![
                vec(inner.clone(), 0..5).prop_map(Value::Array),
                btree_map(string_regex("[a-c]").unwrap(), inner, 0..4)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn identical_values_produce_empty_patch(value in arb_json_value()) {
            prop_assert!(diff(&value, &value.clone()).is_empty());
        }
    }
}
