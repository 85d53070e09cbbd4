//! Identity-unique ordered rows.

use crate::row::{Row, RowMatcher};
use std::cmp::Ordering;

/// An ordered sequence of rows in which no two rows are the same entity.
///
/// Sameness is decided by the set's [`RowMatcher`]. Inserting a row that
/// matches an existing one is rejected rather than duplicated.
#[derive(Debug, Clone)]
pub struct RowSet<R> {
    rows: Vec<R>,
    matcher: RowMatcher<R>,
}

impl<R: Row> RowSet<R> {
    /// Creates an empty set.
    pub fn new(matcher: RowMatcher<R>) -> Self {
        Self {
            rows: Vec::new(),
            matcher,
        }
    }

    /// The comparator deciding sameness.
    pub fn matcher(&self) -> &RowMatcher<R> {
        &self.matcher
    }

    /// Rows in order.
    pub fn as_slice(&self) -> &[R] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the row that is the same entity as `row`.
    pub fn position_of(&self, row: &R) -> Option<usize> {
        self.rows.iter().position(|existing| self.matcher.matches(existing, row))
    }

    /// Returns true if an equivalent row is present.
    pub fn contains(&self, row: &R) -> bool {
        self.position_of(row).is_some()
    }

    /// Inserts `row` at `index` unless an equivalent row exists.
    ///
    /// Returns the index used, or `None` if the row was rejected.
    pub fn insert(&mut self, index: usize, row: R) -> Option<usize> {
        if self.contains(&row) {
            return None;
        }
        let index = index.min(self.rows.len());
        self.rows.insert(index, row);
        Some(index)
    }

    /// Appends `row` unless an equivalent row exists.
    pub fn push(&mut self, row: R) -> Option<usize> {
        self.insert(self.rows.len(), row)
    }

    /// Replaces the equivalent row in place, returning its index.
    pub fn replace(&mut self, row: R) -> Option<usize> {
        let index = self.position_of(&row)?;
        self.rows[index] = row;
        Some(index)
    }

    /// Removes the equivalent row, returning its former index and value.
    pub fn remove(&mut self, row: &R) -> Option<(usize, R)> {
        let index = self.position_of(row)?;
        Some((index, self.rows.remove(index)))
    }

    /// Drops all rows.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Sorts rows in place (stable).
    pub fn sort_by(&mut self, compare: impl FnMut(&R, &R) -> Ordering) {
        self.rows.sort_by(compare);
    }

    /// Replaces the contents with `rows`, dropping later duplicates.
    pub fn adopt(&mut self, rows: Vec<R>) {
        self.rows = self.dedup(rows);
    }

    /// Replaces the contents with rows already known to be identity-unique.
    pub(crate) fn set_unique(&mut self, rows: Vec<R>) {
        self.rows = rows;
    }

    /// Returns `rows` with every row that matches an earlier one removed.
    pub fn dedup(&self, rows: Vec<R>) -> Vec<R> {
        let mut unique: Vec<R> = Vec::with_capacity(rows.len());
        for row in rows {
            if !unique.iter().any(|kept| self.matcher.matches(kept, &row)) {
                unique.push(row);
            }
        }
        unique
    }

    /// Copies the rows out.
    pub fn to_vec(&self) -> Vec<R> {
        self.rows.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Record;

    fn set(ids: &[&str]) -> RowSet<Record> {
        let mut rows = RowSet::new(RowMatcher::Identity);
        rows.adopt(ids.iter().map(|id| Record::new(*id, 1)).collect());
        rows
    }

    fn ids(rows: &RowSet<Record>) -> Vec<&str> {
        rows.as_slice().iter().filter_map(|r| r.id.as_deref()).collect()
    }

    #[test]
    fn adopt_drops_later_duplicates() {
        let mut rows = RowSet::new(RowMatcher::Identity);
        rows.adopt(vec![Record::new("1", 1), Record::new("2", 1), Record::new("1", 9)]);
        assert_eq!(ids(&rows), vec!["1", "2"]);
        assert_eq!(rows.as_slice()[0].rev, Some(1));
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut rows = set(&["1", "2"]);
        assert_eq!(rows.insert(0, Record::new("2", 5)), None);
        assert_eq!(rows.insert(0, Record::new("3", 1)), Some(0));
        assert_eq!(rows.push(Record::new("4", 1)), Some(3));
        assert_eq!(ids(&rows), vec!["3", "1", "2", "4"]);
    }

    #[test]
    fn insert_clamps_index() {
        let mut rows = set(&["1"]);
        assert_eq!(rows.insert(10, Record::new("2", 1)), Some(1));
    }

    #[test]
    fn replace_and_remove_by_identity() {
        let mut rows = set(&["1", "2", "3"]);
        assert_eq!(rows.replace(Record::new("2", 7)), Some(1));
        assert_eq!(rows.as_slice()[1].rev, Some(7));
        assert_eq!(rows.replace(Record::new("9", 1)), None);

        let (index, removed) = rows.remove(&Record::new("1", 0)).unwrap();
        assert_eq!(index, 0);
        assert_eq!(removed.rev, Some(1));
        assert!(rows.remove(&Record::new("1", 0)).is_none());
        assert_eq!(ids(&rows), vec!["2", "3"]);
    }
}
