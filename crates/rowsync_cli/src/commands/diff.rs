//! Diff command implementation.

use crate::output::describe_edit;
use rowsync_engine::{
    merge_page, Edit, ListConfig, LoadIntent, Notice, Record, RowMatcher, RowSet,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Diff result.
#[derive(Debug, Serialize)]
pub struct DiffResult {
    /// Rows in the current file after dropping duplicates.
    pub from_len: usize,
    /// Rows in the incoming file after dropping duplicates.
    pub to_len: usize,
    /// Edit script from current to incoming.
    pub edits: Vec<Edit<Record>>,
}

/// Reads a JSON array of records.
pub fn read_rows(path: &Path) -> Result<Vec<Record>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

/// Computes the edit script a replace load from `from` to `to` would emit.
pub fn compute(from: Vec<Record>, to: Vec<Record>, by_name: bool) -> DiffResult {
    let matcher = if by_name {
        RowMatcher::IdentityOrName
    } else {
        RowMatcher::Identity
    };
    let mut current = RowSet::new(matcher);
    current.adopt(from);

    let config = ListConfig::default().with_max_diff_cells(usize::MAX);
    let merged = merge_page(&current, to, LoadIntent::Replace, &config);
    let edits = match merged.notice {
        Notice::Edits(edits) => edits,
        Notice::FullRefresh => Vec::new(),
    };

    DiffResult {
        from_len: current.len(),
        to_len: merged.rows.len(),
        edits,
    }
}

/// Renders a diff result.
pub fn render(result: &DiffResult, format: &str) -> Result<String, serde_json::Error> {
    match format {
        "json" => serde_json::to_string_pretty(result),
        _ => {
            let mut lines = vec![format!(
                "{} -> {} rows, {} edits",
                result.from_len,
                result.to_len,
                result.edits.len()
            )];
            lines.extend(result.edits.iter().map(describe_edit));
            Ok(lines.join("\n"))
        }
    }
}

/// Runs the diff command.
pub fn run(
    from: &Path,
    to: &Path,
    by_name: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = compute(read_rows(from)?, read_rows(to)?, by_name);
    info!(edits = result.edits.len(), "computed diff");
    println!("{}", render(&result, format)?);
    Ok(())
}
