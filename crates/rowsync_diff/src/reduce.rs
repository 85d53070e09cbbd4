//! Collapsing delete/insert pairs into moves.

use crate::edit::{Edit, EditKind};

/// Folds `edits` left to right, pairing each deletion or insertion with the
/// first earlier edit of the opposite kind whose value matches under `equals`.
///
/// A matched pair is replaced by one `Move`: the earlier edit is removed from
/// the accumulated list and the move is appended at the end. The move carries
/// the value of the edit being folded; its origin is the deletion's source
/// offset and its destination the insertion's destination offset.
///
/// The reduction is first-match, not globally optimal, and costs O(n·k) where
/// k is the number of unmatched edits accumulated so far. Substitutions and
/// existing moves pass through untouched.
pub fn reduce_moves<T, F>(edits: Vec<Edit<T>>, equals: &F) -> Vec<Edit<T>>
where
    F: Fn(&T, &T) -> bool,
{
    edits.into_iter().fold(Vec::new(), |mut reduced, edit| {
        let wanted = match edit.kind {
            EditKind::Deletion => EditKind::Insertion,
            EditKind::Insertion => EditKind::Deletion,
            EditKind::Substitution | EditKind::Move { .. } => {
                reduced.push(edit);
                return reduced;
            }
        };

        let matched = reduced
            .iter()
            .position(|earlier| earlier.kind == wanted && equals(&earlier.value, &edit.value));

        match matched {
            Some(index) => {
                let earlier = reduced.remove(index);
                let (origin, destination) = match edit.kind {
                    EditKind::Deletion => (edit.offset, earlier.offset),
                    _ => (earlier.offset, edit.offset),
                };
                reduced.push(Edit::moved(edit.value, origin, destination));
            }
            None => reduced.push(edit),
        }
        reduced
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eq(a: &char, b: &char) -> bool {
        a == b
    }

    #[test]
    fn insertion_then_deletion_becomes_move() {
        let edits = vec![Edit::insertion('a', 0), Edit::deletion('a', 2)];
        assert_eq!(reduce_moves(edits, &eq), vec![Edit::moved('a', 2, 0)]);
    }

    #[test]
    fn deletion_then_insertion_becomes_move() {
        let edits = vec![Edit::deletion('a', 0), Edit::insertion('a', 2)];
        assert_eq!(reduce_moves(edits, &eq), vec![Edit::moved('a', 0, 2)]);
    }

    #[test]
    fn move_is_appended_after_unmatched_edits() {
        let edits = vec![
            Edit::deletion('a', 0),
            Edit::insertion('x', 1),
            Edit::insertion('a', 3),
        ];
        assert_eq!(
            reduce_moves(edits, &eq),
            vec![Edit::insertion('x', 1), Edit::moved('a', 0, 3)]
        );
    }

    #[test]
    fn first_match_wins() {
        let edits = vec![
            Edit::deletion('a', 0),
            Edit::deletion('a', 4),
            Edit::insertion('a', 2),
        ];
        assert_eq!(
            reduce_moves(edits, &eq),
            vec![Edit::deletion('a', 4), Edit::moved('a', 0, 2)]
        );
    }

    #[test]
    fn same_kind_never_pairs() {
        let edits = vec![Edit::insertion('a', 0), Edit::insertion('a', 1)];
        assert_eq!(reduce_moves(edits.clone(), &eq), edits);
    }

    #[test]
    fn substitutions_pass_through() {
        let edits = vec![Edit::substitution('a', 0), Edit::deletion('a', 1)];
        assert_eq!(reduce_moves(edits.clone(), &eq), edits);
    }
}
