//! Row fixtures and edit-script assertions.

use rowsync_diff::{apply_edits, Edit};
use rowsync_engine::{ListEvent, Record};

/// Creates a record with an identity and a revision.
pub fn row(id: &str, rev: i64) -> Record {
    Record::new(id, rev)
}

/// Creates records from `(id, rev)` pairs.
pub fn rows(pairs: &[(&str, i64)]) -> Vec<Record> {
    pairs.iter().map(|(id, rev)| Record::new(*id, *rev)).collect()
}

/// Creates records with the given identities at revision 1.
pub fn rows_with_ids(ids: &[&str]) -> Vec<Record> {
    ids.iter().map(|id| Record::new(*id, 1)).collect()
}

/// Identities of `rows`, in order.
pub fn ids(rows: &[Record]) -> Vec<String> {
    rows.iter().filter_map(|r| r.id.clone()).collect()
}

/// Sample dataset of `count` records, newest first: ids `count` down to `1`.
pub fn numbered(count: usize) -> Vec<Record> {
    (1..=count)
        .rev()
        .map(|n| Record::new(n.to_string(), 1).with_name(format!("Row {n}")))
        .collect()
}

/// Asserts that replaying `edits` onto `before` yields `after`.
pub fn assert_replays(before: &[Record], edits: &[Edit<Record>], after: &[Record]) {
    let replayed = apply_edits(before, edits).expect("edit offsets out of range");
    assert_eq!(replayed, after, "edit script does not reproduce the new rows");
}

/// The edit scripts of every `EditsApplied` event, in order.
pub fn edit_scripts(events: &[ListEvent<Record>]) -> Vec<Vec<Edit<Record>>> {
    events
        .iter()
        .filter_map(|event| match event {
            ListEvent::EditsApplied { edits, .. } => Some(edits.clone()),
            _ => None,
        })
        .collect()
}
