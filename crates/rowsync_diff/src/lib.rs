//! # rowsync diff
//!
//! Edit scripts between two ordered sequences, with move detection.
//!
//! This crate provides:
//! - An LCS alignment producing `Deletion`/`Insertion` edits
//! - A left-to-right, first-match reduction of delete/insert pairs into `Move` edits
//! - Replay of an edit script onto its source sequence
//!
//! ## Offset semantics
//!
//! - `Deletion` offsets and `Move` origins index the **source** sequence
//! - `Insertion`, `Substitution` and `Move` destinations index the **destination** sequence
//!
//! Edits come out in fold order, not sorted by offset. Use [`apply_edits`] (which orders
//! them itself) or [`sort_by_offset`] when offset order matters.
//!
//! ## Usage
//!
//! ```
//! use rowsync_diff::{diff, Edit};
//!
//! let edits = diff(&["a", "b", "c"], &["b", "c", "a"], |x, y| x == y);
//! assert_eq!(edits, vec![Edit::moved("a", 0, 2)]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod apply;
mod edit;
mod lcs;
mod reduce;

pub use apply::{apply_edits, sort_by_offset, ApplyError};
pub use edit::{Edit, EditKind, Offset};
pub use lcs::diff;
pub use reduce::reduce_moves;
