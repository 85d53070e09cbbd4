//! Replaying an edit script onto its source sequence.

use crate::edit::{Edit, EditKind, Offset};
use thiserror::Error;

/// Errors raised while replaying an edit script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// An edit referenced a position past the end of the sequence.
    #[error("{kind:?} at offset {offset} is out of range for length {len}")]
    OffsetOutOfRange {
        /// Kind of the offending edit.
        kind: EditKind,
        /// The offset that could not be honoured.
        offset: Offset,
        /// Sequence length at the time the edit was applied.
        len: usize,
    },
}

/// Returns the edits in replay order.
///
/// Removals (deletions and move origins) come first by descending source
/// offset, then placements (insertions and move destinations) by ascending
/// destination offset, then substitutions by ascending destination offset.
pub fn sort_by_offset<T>(edits: &[Edit<T>]) -> Vec<&Edit<T>> {
    let mut removals: Vec<&Edit<T>> = edits
        .iter()
        .filter(|e| e.source_offset().is_some())
        .collect();
    removals.sort_by(|a, b| b.source_offset().cmp(&a.source_offset()));

    let mut placements: Vec<&Edit<T>> = edits
        .iter()
        .filter(|e| matches!(e.kind, EditKind::Insertion | EditKind::Move { .. }))
        .collect();
    placements.sort_by_key(|e| e.offset);

    let mut substitutions: Vec<&Edit<T>> = edits
        .iter()
        .filter(|e| e.kind == EditKind::Substitution)
        .collect();
    substitutions.sort_by_key(|e| e.offset);

    removals.into_iter().chain(placements).chain(substitutions).collect()
}

/// Applies `edits` to `source`, producing the destination sequence.
///
/// Moves are applied as a removal at their origin followed by a placement of
/// their value at their destination.
pub fn apply_edits<T: Clone>(source: &[T], edits: &[Edit<T>]) -> Result<Vec<T>, ApplyError> {
    let ordered = sort_by_offset(edits);
    let mut rows = source.to_vec();

    let removal_count = edits.iter().filter(|e| e.source_offset().is_some()).count();
    let (removals, rest) = ordered.split_at(removal_count);

    for &edit in removals {
        let offset = edit.source_offset().unwrap_or(edit.offset);
        if offset >= rows.len() {
            return Err(out_of_range(edit, offset, rows.len()));
        }
        rows.remove(offset);
    }

    for &edit in rest {
        match edit.kind {
            EditKind::Substitution => {
                let len = rows.len();
                let slot = rows
                    .get_mut(edit.offset)
                    .ok_or_else(|| out_of_range(edit, edit.offset, len))?;
                *slot = edit.value.clone();
            }
            _ => {
                if edit.offset > rows.len() {
                    return Err(out_of_range(edit, edit.offset, rows.len()));
                }
                rows.insert(edit.offset, edit.value.clone());
            }
        }
    }

    Ok(rows)
}

fn out_of_range<T>(edit: &Edit<T>, offset: Offset, len: usize) -> ApplyError {
    ApplyError::OffsetOutOfRange {
        kind: edit.kind,
        offset,
        len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn replays_mixed_script() {
        let source = vec!['a', 'b', 'c', 'd'];
        let edits = vec![
            Edit::deletion('b', 1),
            Edit::moved('a', 0, 2),
            Edit::insertion('x', 0),
            Edit::substitution('D', 3),
        ];
        // a b c d -> c d -> x c a d -> x c a D
        assert_eq!(apply_edits(&source, &edits).unwrap(), vec!['x', 'c', 'a', 'D']);
    }

    #[test]
    fn removals_run_from_the_back() {
        let edits = vec![Edit::deletion('a', 0), Edit::deletion('c', 2)];
        let ordered: Vec<_> = sort_by_offset(&edits).into_iter().map(|e| e.offset).collect();
        assert_eq!(ordered, vec![2, 0]);
        assert_eq!(apply_edits(&['a', 'b', 'c'], &edits).unwrap(), vec!['b']);
    }

    #[test]
    fn out_of_range_deletion_is_an_error() {
        let err = apply_edits(&['a'], &[Edit::deletion('z', 5)]).unwrap_err();
        assert_eq!(
            err,
            ApplyError::OffsetOutOfRange {
                kind: EditKind::Deletion,
                offset: 5,
                len: 1
            }
        );
    }

    #[test]
    fn out_of_range_substitution_is_an_error() {
        let err = apply_edits(&['a'], &[Edit::substitution('z', 1)]).unwrap_err();
        assert!(matches!(err, ApplyError::OffsetOutOfRange { offset: 1, .. }));
    }
}
