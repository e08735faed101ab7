use std::ops::Range;

use serde_json::Value;

use super::{diff_impl, DiffEntry, Location};
use crate::{value_hash, values_equal, HashCode, Pointer};

/// Diffs two arrays around their longest common subsequence.
///
/// Elements between consecutive matches form gaps. Within a gap the leading
/// elements are paired positionally and diffed recursively; whatever is left
/// over on the source side is removed and on the target side added.
///
/// Entries come out as: removals by descending source index, then paired
/// changes at the index the element holds once removals are done, then
/// additions by ascending target index.
pub(super) fn diff_lists<'a>(
    source: &'a [Value],
    target: &'a [Value],
    path: &Pointer,
) -> Vec<DiffEntry<'a>> {
    let matches = longest_common_subsequence(source, target);

    let mut removals = Vec::new();
    let mut pairs = Vec::new();
    let mut additions = Vec::new();
    for gap in gaps(&matches, source.len(), target.len()) {
        let paired = gap.source.len().min(gap.target.len());
        pairs.extend(gap.source.clone().zip(gap.target.clone()).take(paired));
        removals.extend(gap.source.start + paired..gap.source.end);
        additions.extend(gap.target.start + paired..gap.target.end);
    }

    let mut entries = Vec::with_capacity(removals.len() + pairs.len() + additions.len());
    for &index in removals.iter().rev() {
        entries.push(DiffEntry::Remove { path: Location::index(path, index), old: &source[index] });
    }
    for &(left, right) in &pairs {
        // removals are sorted, so this counts the ones preceding `left`
        let shift = removals.partition_point(|&removed| removed < left);
        let at = Location::index(path, left - shift);
        entries.extend(diff_impl(&source[left], &target[right], &at));
    }
    for &index in &additions {
        entries.push(DiffEntry::Add { path: Location::index(path, index), value: &target[index] });
    }
    entries
}

#[derive(Debug, PartialEq)]
struct Gap {
    source: Range<usize>,
    target: Range<usize>,
}

fn gaps(matches: &[(usize, usize)], source_len: usize, target_len: usize) -> Vec<Gap> {
    let mut gaps = Vec::new();
    let (mut i, mut j) = (0, 0);
    for &(left, right) in matches.iter().chain(std::iter::once(&(source_len, target_len))) {
        if i < left || j < right {
            gaps.push(Gap { source: i..left, target: j..right });
        }
        i = left + 1;
        j = right + 1;
    }
    gaps
}

/// Returns the matched `(source, target)` index pairs, ascending.
///
/// Common prefix and suffix are matched up front so the quadratic table only
/// covers the region that actually changed.
fn longest_common_subsequence(source: &[Value], target: &[Value]) -> Vec<(usize, usize)> {
    let source_hashes: Vec<HashCode> = source.iter().map(value_hash).collect();
    let target_hashes: Vec<HashCode> = target.iter().map(value_hash).collect();
    let same = |i: usize, j: usize| {
        source_hashes[i] == target_hashes[j] && values_equal(&source[i], &target[j])
    };

    let (n, m) = (source.len(), target.len());
    let mut prefix = 0;
    while prefix < n && prefix < m && same(prefix, prefix) {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < n - prefix && suffix < m - prefix && same(n - 1 - suffix, m - 1 - suffix) {
        suffix += 1;
    }

    let rows = n - prefix - suffix;
    let cols = m - prefix - suffix;
    let mut table = vec![vec![0usize; cols + 1]; rows + 1];
    for i in 0..rows {
        for j in 0..cols {
            table[i + 1][j + 1] = if same(prefix + i, prefix + j) {
                table[i][j] + 1
            } else {
                table[i][j + 1].max(table[i + 1][j])
            };
        }
    }

    let mut middle = Vec::with_capacity(table[rows][cols]);
    let (mut i, mut j) = (rows, cols);
    while i > 0 && j > 0 {
        if same(prefix + i - 1, prefix + j - 1) {
            middle.push((prefix + i - 1, prefix + j - 1));
            i -= 1;
            j -= 1;
        } else if table[i - 1][j] >= table[i][j - 1] {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    middle.reverse();

    let mut result = Vec::with_capacity(prefix + middle.len() + suffix);
    result.extend((0..prefix).map(|k| (k, k)));
    result.extend(middle);
    result.extend((0..suffix).rev().map(|k| (n - 1 - k, m - 1 - k)));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn array(value: &Value) -> &[Value] {
        value.as_array().map(Vec::as_slice).unwrap_or_default()
    }

    fn describe(entries: &[DiffEntry<'_>]) -> Vec<String> {
        entries
            .iter()
            .map(|entry| match entry {
                DiffEntry::Add { path, value } => format!("add {} {value}", path.pointer),
                DiffEntry::Remove { path, old } => format!("remove {} {old}", path.pointer),
                DiffEntry::Replace { path, value, .. } => {
                    format!("replace {} {value}", path.pointer)
                }
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn lcs_matches_structurally_equal_elements() {
        let source = json!([{"a": 1, "b": 2}, 1.0, "x"]);
        let target = json!(["y", {"b": 2, "a": 1}, 1]);
        let matches = longest_common_subsequence(array(&source), array(&target));
        assert_eq!(matches, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn lcs_keeps_prefix_and_suffix() {
        let source = json!([1, 2, 3, 4, 5]);
        let target = json!([1, 2, 9, 4, 5]);
        let matches = longest_common_subsequence(array(&source), array(&target));
        assert_eq!(matches, vec![(0, 0), (1, 1), (3, 3), (4, 4)]);
    }

    #[test]
    fn gaps_cover_unmatched_ranges() {
        let found = gaps(&[(1, 0)], 3, 2);
        assert_eq!(
            found,
            vec![Gap { source: 0..1, target: 0..0 }, Gap { source: 2..3, target: 1..2 }]
        );
        assert!(gaps(&[(0, 0)], 1, 1).is_empty());
    }

    #[test]
    fn removals_descend_and_additions_ascend() {
        let source = json!([0, 1, 2, 3, 4]);
        let target = json!([0, 2, 4, 5, 6]);
        let entries = diff_lists(array(&source), array(&target), &Pointer::root());
        assert_eq!(
            describe(&entries),
            vec!["remove /3 3", "remove /1 1", "add /3 5", "add /4 6"]
        );
    }

    #[test]
    fn paired_elements_use_post_removal_index() {
        let source = json!(["a", "b", "c", {"k": 1}]);
        let target = json!(["c", {"k": 2}]);
        let entries = diff_lists(array(&source), array(&target), &Pointer::root());
        assert_eq!(describe(&entries), vec!["remove /1 \"b\"", "remove /0 \"a\"", "replace /1/k 2"]);
    }

    #[test]
    fn mismatched_elements_become_replacements() {
        let source = json!([1, [2], {"a": 3}]);
        let target = json!(["one", {"a": 2}, {"a": 4}]);
        let entries = diff_lists(array(&source), array(&target), &Pointer::root());
        assert_eq!(
            describe(&entries),
            vec!["replace /0 \"one\"", "replace /1 {\"a\":2}", "replace /2/a 4"]
        );
        assert!(entries.iter().all(|entry| entry.path().in_array || entry.path().pointer.len() > 1));
    }
}
