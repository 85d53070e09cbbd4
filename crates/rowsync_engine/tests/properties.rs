//! Property tests for merging and CRUD reconciliation.

use proptest::prelude::*;
use rowsync_diff::apply_edits;
use rowsync_engine::{
    merge_page, CrudEvent, EventLog, ListConfig, ListSynchronizer, MemorySource, NewRowsPosition,
    Notice, Record, RowMatcher, RowSet,
};
use rowsync_testkit::{crud_event_strategy, intent_strategy, noisy_rows_strategy, unique_rows_strategy};
use std::collections::HashSet;

fn set_of(rows: Vec<Record>) -> RowSet<Record> {
    let mut set = RowSet::new(RowMatcher::Identity);
    set.adopt(rows);
    set
}

fn assert_unique(rows: &[Record]) -> Result<(), TestCaseError> {
    let ids: HashSet<_> = rows.iter().map(|r| r.id.clone()).collect();
    prop_assert_eq!(ids.len(), rows.len());
    Ok(())
}

fn position_strategy() -> impl Strategy<Value = NewRowsPosition> {
    prop_oneof![Just(NewRowsPosition::Beginning), Just(NewRowsPosition::End)]
}

proptest! {
    #[test]
    fn merged_rows_stay_unique_and_edits_replay(
        current in unique_rows_strategy(16),
        page in noisy_rows_strategy(16),
        intent in intent_strategy(),
        position in position_strategy(),
    ) {
        let config = ListConfig::default().with_new_rows_position(position);
        let current = set_of(current);
        let merged = merge_page(&current, page, intent, &config);

        assert_unique(&merged.rows)?;
        match merged.notice {
            Notice::Edits(edits) => {
                let replayed = apply_edits(current.as_slice(), &edits).unwrap();
                prop_assert_eq!(replayed, merged.rows);
            }
            Notice::FullRefresh => prop_assert!(false, "default limit never refreshes"),
        }
    }

    #[test]
    fn crud_events_are_idempotent(
        initial in unique_rows_strategy(12),
        events in prop::collection::vec(crud_event_strategy(), 0..24),
    ) {
        let mut once = ListSynchronizer::new(
            ListConfig::default(),
            MemorySource::new(Vec::new()),
            EventLog::new(),
        );
        let mut twice = ListSynchronizer::new(
            ListConfig::default(),
            MemorySource::new(Vec::new()),
            EventLog::new(),
        );
        once.preset_rows(initial.clone());
        twice.preset_rows(initial);

        for event in events {
            once.apply_event(event.clone());
            twice.apply_event(event.clone());
            let repeat = twice.apply_event(event.clone());
            if let CrudEvent::Create(_) | CrudEvent::Delete(_) = event {
                prop_assert!(repeat.is_none());
            }
        }

        assert_unique(once.rows())?;
        prop_assert_eq!(once.rows(), twice.rows());
    }
}
