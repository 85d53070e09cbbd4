//! Text rendering shared by the commands.

use rowsync_engine::{Edit, EditKind, ListEvent, Record};

/// Short label for a record: `id@rev`, falling back to the name.
pub fn label(row: &Record) -> String {
    let key = row
        .id
        .as_deref()
        .or(row.name.as_deref())
        .unwrap_or("?");
    match row.rev {
        Some(rev) => format!("{key}@{rev}"),
        None => key.to_string(),
    }
}

/// One line per edit.
pub fn describe_edit(edit: &Edit<Record>) -> String {
    let value = label(&edit.value);
    match edit.kind {
        EditKind::Insertion => format!("insert {value} at {}", edit.offset),
        EditKind::Deletion => format!("delete {value} at {}", edit.offset),
        EditKind::Substitution => format!("update {value} at {}", edit.offset),
        EditKind::Move { origin } => format!("move   {value} {origin} -> {}", edit.offset),
    }
}

/// Lines describing one observer event. Edit scripts get one line per edit.
pub fn describe_event(event: &ListEvent<Record>) -> Vec<String> {
    match event {
        ListEvent::EditsApplied { edits, intent } => {
            let mut lines = vec![format!("edits applied ({intent:?}, {})", edits.len())];
            lines.extend(edits.iter().map(|edit| format!("  {}", describe_edit(edit))));
            lines
        }
        ListEvent::FullRefresh { intent } => vec![format!("full refresh ({intent:?})")],
        ListEvent::RowInserted { index } => vec![format!("row inserted at {index}")],
        ListEvent::RowUpdated { index } => vec![format!("row updated at {index}")],
        ListEvent::RowRemoved { index } => vec![format!("row removed at {index}")],
        ListEvent::LoadStarted { intent } => vec![format!("load started ({intent:?})")],
        ListEvent::ResultsReceived { intent } => vec![format!("results received ({intent:?})")],
        ListEvent::LoadFailed { error } => vec![format!("load failed: {error}")],
        ListEvent::RowsCleared => vec!["rows cleared".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowsync_engine::LoadIntent;

    #[test]
    fn labels() {
        assert_eq!(label(&Record::new("7", 2)), "7@2");
        assert_eq!(label(&Record::named("Tea")), "Tea");
        assert_eq!(label(&Record::default()), "?");
    }

    #[test]
    fn edit_lines() {
        assert_eq!(
            describe_edit(&Edit::moved(Record::new("a", 1), 0, 2)),
            "move   a@1 0 -> 2"
        );
        assert_eq!(
            describe_event(&ListEvent::EditsApplied {
                edits: vec![Edit::insertion(Record::new("b", 1), 0)],
                intent: LoadIntent::More,
            }),
            vec!["edits applied (More, 1)", "  insert b@1 at 0"]
        );
    }
}
