//! Atomic edits on a row sequence.

/// Zero-based position in either the source or the destination sequence.
pub type Offset = usize;

/// The kind of an [`Edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "op", rename_all = "snake_case"))]
pub enum EditKind {
    /// A value inserted at a destination offset.
    Insertion,
    /// A value removed from a source offset.
    Deletion,
    /// A value replaced in place at a destination offset.
    Substitution,
    /// A value moved from `origin` (source offset) to the edit's offset (destination).
    Move {
        /// Source offset the value was taken from.
        origin: Offset,
    },
}

/// One atomic transformation in an edit script.
///
/// Two edits are equal iff kind, offsets and value all match; for moves that
/// includes the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edit<T> {
    /// What the edit does.
    pub kind: EditKind,
    /// The affected value.
    pub value: T,
    /// Source offset for deletions, destination offset for everything else.
    pub offset: Offset,
}

impl<T> Edit<T> {
    /// Creates an insertion at a destination offset.
    pub fn insertion(value: T, offset: Offset) -> Self {
        Self {
            kind: EditKind::Insertion,
            value,
            offset,
        }
    }

    /// Creates a deletion at a source offset.
    pub fn deletion(value: T, offset: Offset) -> Self {
        Self {
            kind: EditKind::Deletion,
            value,
            offset,
        }
    }

    /// Creates a substitution at a destination offset.
    pub fn substitution(value: T, offset: Offset) -> Self {
        Self {
            kind: EditKind::Substitution,
            value,
            offset,
        }
    }

    /// Creates a move from a source offset to a destination offset.
    pub fn moved(value: T, from: Offset, to: Offset) -> Self {
        Self {
            kind: EditKind::Move { origin: from },
            value,
            offset: to,
        }
    }

    /// Offset in the source sequence, if the edit removes something from it.
    pub fn source_offset(&self) -> Option<Offset> {
        match self.kind {
            EditKind::Deletion => Some(self.offset),
            EditKind::Move { origin } => Some(origin),
            EditKind::Insertion | EditKind::Substitution => None,
        }
    }

    /// Offset in the destination sequence, if the edit places something there.
    pub fn destination_offset(&self) -> Option<Offset> {
        match self.kind {
            EditKind::Deletion => None,
            EditKind::Insertion | EditKind::Substitution | EditKind::Move { .. } => {
                Some(self.offset)
            }
        }
    }

    /// Returns true for `Move` edits.
    pub fn is_move(&self) -> bool {
        matches!(self.kind, EditKind::Move { .. })
    }

    /// Maps the carried value, keeping kind and offsets.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Edit<U> {
        Edit {
            kind: self.kind,
            value: f(self.value),
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_by_kind() {
        assert_eq!(Edit::deletion('a', 3).source_offset(), Some(3));
        assert_eq!(Edit::deletion('a', 3).destination_offset(), None);
        assert_eq!(Edit::insertion('a', 1).destination_offset(), Some(1));
        assert_eq!(Edit::insertion('a', 1).source_offset(), None);

        let mv = Edit::moved('a', 0, 2);
        assert_eq!(mv.source_offset(), Some(0));
        assert_eq!(mv.destination_offset(), Some(2));
        assert!(mv.is_move());
    }

    #[test]
    fn equality_includes_move_origin() {
        assert_eq!(Edit::moved('a', 0, 2), Edit::moved('a', 0, 2));
        assert_ne!(Edit::moved('a', 1, 2), Edit::moved('a', 0, 2));
        assert_ne!(Edit::insertion('a', 2), Edit::substitution('a', 2));
        assert_ne!(Edit::insertion('a', 2), Edit::insertion('b', 2));
    }

    #[test]
    fn map_keeps_offsets() {
        let edit = Edit::moved(7, 4, 1).map(|v| v.to_string());
        assert_eq!(edit, Edit::moved("7".to_string(), 4, 1));
    }
}
