//! Benchmark utilities.

use rand::seq::SliceRandom;
use rand::Rng;
use rowsync_engine::Record;

/// Generate `count` rows with ids `0..count`, all at revision 1.
pub fn generate_rows(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| Record::new(i.to_string(), 1).with_name(format!("Row {i}")))
        .collect()
}

/// Shuffle a copy of `rows`.
pub fn shuffled(rows: &[Record]) -> Vec<Record> {
    let mut rows = rows.to_vec();
    rows.shuffle(&mut rand::thread_rng());
    rows
}

/// Apply `changes` random edits to a copy of `rows`: deletions, bumped
/// revisions, moves and fresh rows in roughly equal measure.
pub fn perturb(rows: &[Record], changes: usize) -> Vec<Record> {
    let mut rng = rand::thread_rng();
    let mut next = rows.to_vec();
    let mut fresh = rows.len();
    for _ in 0..changes {
        if next.is_empty() {
            break;
        }
        let at = rng.gen_range(0..next.len());
        match rng.gen_range(0..4) {
            0 => {
                next.remove(at);
            }
            1 => {
                let rev = next[at].rev.unwrap_or(0) + 1;
                next[at].rev = Some(rev);
            }
            2 => {
                let row = next.remove(at);
                let to = rng.gen_range(0..=next.len());
                next.insert(to, row);
            }
            _ => {
                next.insert(at, Record::new(fresh.to_string(), 1));
                fresh += 1;
            }
        }
    }
    next
}
