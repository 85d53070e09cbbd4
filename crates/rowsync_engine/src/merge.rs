//! Intent-specific merging of a fetched page into the current rows.

use crate::config::{ListConfig, NewRowsPosition};
use crate::intent::LoadIntent;
use crate::row::Row;
use crate::rowset::RowSet;
use rowsync_diff::{diff, Edit, EditKind};
use std::collections::HashSet;

/// How the observer should be told about a merge.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice<R> {
    /// A precise edit script from the previous rows to the merged rows.
    Edits(Vec<Edit<R>>),
    /// No script was computed; the observer should redraw everything.
    FullRefresh,
}

/// The rows to adopt after a merge, plus the notification describing it.
#[derive(Debug, Clone)]
pub struct MergeOutcome<R> {
    /// Merged rows, identity-unique.
    pub rows: Vec<R>,
    /// Change notification.
    pub notice: Notice<R>,
}

/// Merges `page` into `current` according to `intent`.
///
/// - `More` appends unseen rows and reports pure insertions.
/// - `NewRows` on a non-empty set updates known rows in place and places
///   unseen rows at the configured end; at the beginning the unseen rows are
///   reversed before being prepended as a block.
/// - Everything else (including `NewRows` on an empty set) adopts the page and
///   diffs it against the current rows. Rows kept in place whose revision
///   changed are reported as substitutions at their new offset.
pub fn merge_page<R: Row>(
    current: &RowSet<R>,
    page: Vec<R>,
    intent: LoadIntent,
    config: &ListConfig,
) -> MergeOutcome<R> {
    let page = current.dedup(page);
    match intent {
        LoadIntent::More => append(current, page),
        LoadIntent::NewRows if !current.is_empty() => {
            merge_newer(current, page, config.new_rows_position)
        }
        _ => replace(current, page, config.max_diff_cells),
    }
}

/// Edit script that builds `rows` from nothing, for observers that attach late.
pub fn catch_up<R: Clone>(rows: &[R]) -> Vec<Edit<R>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| Edit::insertion(row.clone(), index))
        .collect()
}

fn append<R: Row>(current: &RowSet<R>, page: Vec<R>) -> MergeOutcome<R> {
    let mut rows = current.to_vec();
    let mut edits = Vec::new();
    for row in page {
        if !current.contains(&row) {
            edits.push(Edit::insertion(row.clone(), rows.len()));
            rows.push(row);
        }
    }
    MergeOutcome {
        rows,
        notice: Notice::Edits(edits),
    }
}

fn merge_newer<R: Row>(
    current: &RowSet<R>,
    page: Vec<R>,
    position: NewRowsPosition,
) -> MergeOutcome<R> {
    let mut rows = current.to_vec();
    let mut fresh = Vec::new();
    let mut updated = Vec::new();

    for row in page {
        match current.position_of(&row) {
            Some(index) => {
                if rows[index].revision() != row.revision() {
                    rows[index] = row;
                    updated.push(index);
                }
            }
            None => fresh.push(row),
        }
    }

    let (insert_at, shift) = match position {
        NewRowsPosition::Beginning => {
            fresh.reverse();
            (0, fresh.len())
        }
        NewRowsPosition::End => (rows.len(), 0),
    };

    let mut edits: Vec<Edit<R>> = fresh
        .iter()
        .enumerate()
        .map(|(k, row)| Edit::insertion(row.clone(), insert_at + k))
        .collect();
    rows.splice(insert_at..insert_at, fresh);

    edits.extend(
        updated
            .into_iter()
            .map(|index| Edit::substitution(rows[index + shift].clone(), index + shift)),
    );

    MergeOutcome {
        rows,
        notice: Notice::Edits(edits),
    }
}

fn replace<R: Row>(current: &RowSet<R>, next: Vec<R>, max_diff_cells: usize) -> MergeOutcome<R> {
    let old = current.as_slice();
    if old.len().saturating_mul(next.len()) > max_diff_cells {
        return MergeOutcome {
            rows: next,
            notice: Notice::FullRefresh,
        };
    }

    let matcher = current.matcher();
    let mut edits = diff(old, &next, |a, b| matcher.matches(a, b));

    // A move may carry the row it had before; it lands with the incoming one.
    for edit in edits.iter_mut().filter(|e| e.is_move()) {
        edit.value = next[edit.offset].clone();
    }

    let placed: HashSet<usize> = edits
        .iter()
        .filter(|e| matches!(e.kind, EditKind::Insertion | EditKind::Move { .. }))
        .map(|e| e.offset)
        .collect();

    for (offset, row) in next.iter().enumerate() {
        if placed.contains(&offset) {
            continue;
        }
        if let Some(index) = current.position_of(row) {
            if old[index].revision() != row.revision() {
                edits.push(Edit::substitution(row.clone(), offset));
            }
        }
    }

    MergeOutcome {
        rows: next,
        notice: Notice::Edits(edits),
    }
}
