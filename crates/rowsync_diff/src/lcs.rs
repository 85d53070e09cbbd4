//! Longest-common-subsequence alignment.

use crate::edit::Edit;
use crate::reduce::reduce_moves;

/// Computes the edit script turning `from` into `to`.
///
/// `equals` decides whether two values are the same entity. It is not a
/// structural comparison: rows that match here but differ in content are left
/// in place, and callers express content changes as substitutions themselves.
///
/// The raw LCS alignment only yields deletions and insertions; it is then
/// folded through [`reduce_moves`], so a value removed at one offset and
/// re-inserted at another comes out as a single move.
pub fn diff<T, F>(from: &[T], to: &[T], equals: F) -> Vec<Edit<T>>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let raw = align(from, to, &equals);
    reduce_moves(raw, &equals)
}

/// Produces the raw deletion/insertion list in forward order.
///
/// When both a deletion and an insertion are possible at the same step the
/// deletion is emitted first.
fn align<T, F>(from: &[T], to: &[T], equals: &F) -> Vec<Edit<T>>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let prefix = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| equals(a, b))
        .count();
    let suffix = from[prefix..]
        .iter()
        .rev()
        .zip(to[prefix..].iter().rev())
        .take_while(|(a, b)| equals(a, b))
        .count();

    let old = &from[prefix..from.len() - suffix];
    let new = &to[prefix..to.len() - suffix];
    let (n, m) = (old.len(), new.len());

    // lengths[i * width + j] is the LCS length of old[i..] and new[j..].
    let width = m + 1;
    let mut lengths = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i * width + j] = if equals(&old[i], &new[j]) {
                lengths[(i + 1) * width + j + 1] + 1
            } else {
                lengths[(i + 1) * width + j].max(lengths[i * width + j + 1])
            };
        }
    }

    let mut edits = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if equals(&old[i], &new[j]) {
            i += 1;
            j += 1;
        } else if lengths[(i + 1) * width + j] >= lengths[i * width + j + 1] {
            edits.push(Edit::deletion(old[i].clone(), prefix + i));
            i += 1;
        } else {
            edits.push(Edit::insertion(new[j].clone(), prefix + j));
            j += 1;
        }
    }
    for (k, value) in old.iter().enumerate().skip(i) {
        edits.push(Edit::deletion(value.clone(), prefix + k));
    }
    for (k, value) in new.iter().enumerate().skip(j) {
        edits.push(Edit::insertion(value.clone(), prefix + k));
    }

    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eq(a: &char, b: &char) -> bool {
        a == b
    }

    #[test]
    fn identical_sequences_have_no_edits() {
        let rows = ['a', 'b', 'c'];
        assert!(diff(&rows, &rows, eq).is_empty());
    }

    #[test]
    fn empty_to_rows_is_all_insertions() {
        let edits = diff(&[], &['a', 'b'], eq);
        assert_eq!(edits, vec![Edit::insertion('a', 0), Edit::insertion('b', 1)]);
    }

    #[test]
    fn rows_to_empty_is_all_deletions() {
        let edits = diff(&['a', 'b'], &[], eq);
        assert_eq!(edits, vec![Edit::deletion('a', 0), Edit::deletion('b', 1)]);
    }

    #[test]
    fn rotation_is_a_single_move() {
        let edits = diff(&['a', 'b', 'c'], &['b', 'c', 'a'], eq);
        assert_eq!(edits, vec![Edit::moved('a', 0, 2)]);
    }

    #[test]
    fn insertion_uses_destination_offset() {
        let edits = diff(&['a', 'c'], &['a', 'b', 'c'], eq);
        assert_eq!(edits, vec![Edit::insertion('b', 1)]);
    }

    #[test]
    fn deletion_uses_source_offset() {
        let edits = diff(&['a', 'b', 'c', 'd'], &['a', 'c', 'd'], eq);
        assert_eq!(edits, vec![Edit::deletion('b', 1)]);
    }

    #[test]
    fn replacement_is_delete_then_insert() {
        let edits = diff(&['a', 'x', 'c'], &['a', 'y', 'c'], eq);
        assert_eq!(edits, vec![Edit::deletion('x', 1), Edit::insertion('y', 1)]);
    }

    #[test]
    fn custom_equality_ignores_payload() {
        let from = [(1, "old"), (2, "two")];
        let to = [(1, "new"), (2, "two")];
        let edits = diff(&from, &to, |a, b| a.0 == b.0);
        assert!(edits.is_empty());
    }
}
